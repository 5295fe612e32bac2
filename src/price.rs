use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use std::{
    fmt::{Debug, Display},
    ops::Mul,
    str::FromStr,
};

/// Represents an amount of money.
///
/// The amount is stored as an exact [`Decimal`]. Without a precision, the
/// [`Display`] implementation drops trailing zeros, so a catalog price of
/// `18.0000` prints as `18`. With a precision (`{:.2}`) it prints exactly that
/// many decimal places.
#[derive(
    Clone,
    Copy,
    Default,
    DeserializeFromStr,
    SerializeDisplay,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub fn amount(self) -> Decimal {
        self.0
    }

    /// Rounds to whole cents, with midpoints rounded away from zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::str::FromStr;
    /// # use report_app::Price;
    /// let price = Price::from_str("0.125").unwrap();
    /// assert_eq!(price.round_cents().to_string(), "0.13");
    /// ```
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns a view of the price that displays as a whole number, rounded
    /// with midpoints away from zero and padded to at least two digits.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::str::FromStr;
    /// # use report_app::Price;
    /// assert_eq!(Price::from_str("19.80").unwrap().whole().to_string(), "20");
    /// assert_eq!(Price::from_str("4.5").unwrap().whole().to_string(), "05");
    /// ```
    #[must_use]
    pub fn whole(self) -> Whole {
        Whole(self)
    }
}

/// Displays a [`Price`] as a whole number of at least two digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Whole(Price);

impl Display for Whole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Whole(Price(amount)) = *self;
        let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        match rounded.to_i64() {
            Some(units) => write!(f, "{units:02}"),
            None => Display::fmt(&rounded.normalize(), f),
        }
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Debug for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.precision().is_some() {
            Display::fmt(&self.0, f)
        } else {
            Display::fmt(&self.0.normalize(), f)
        }
    }
}

impl FromStr for Price {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Decimal::from_str(s.trim())?))
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}
