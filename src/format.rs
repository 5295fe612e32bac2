//! Turning reports into text.

use clap::ValueEnum;
use serde::Serialize;

use std::{fmt::Display, io::Write};

use crate::report::{ProductLocalPrice, ProductPrice, ProductReport};

/// How a report is written to the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// A header line, then one comma-separated line per product.
    #[default]
    Plain,
    /// CSV with a header record.
    Csv,
}

impl Display for ProductPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.price)
    }
}

impl Display for ProductLocalPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}$, {}, {}{}",
            self.name,
            self.price.whole(),
            self.country,
            self.local_price.whole(),
            self.currency_symbol
        )
    }
}

/// Formats `report` as text lines: `Report - {header}`, then one line per
/// product.
///
/// # Examples
///
/// ```
/// # use std::str::FromStr;
/// # use report_app::{format_report, Price, ProductPrice, ProductReport};
/// let report = ProductReport::new(vec![ProductPrice {
///     name: "Chai".to_string(),
///     price: Price::from_str("18.00").unwrap(),
/// }]);
/// assert_eq!(
///     format_report("1 most expensive products:", &report),
///     vec!["Report - 1 most expensive products:", "Chai, 18"],
/// );
/// ```
#[must_use]
pub fn format_report<T: Display>(header: &str, report: &ProductReport<T>) -> Vec<String> {
    std::iter::once(format!("Report - {header}"))
        .chain(report.into_iter().map(ToString::to_string))
        .collect()
}

/// Writes `report` to `out` in the given format.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_report<T: Display + Serialize>(
    out: &mut impl Write,
    format: OutputFormat,
    header: &str,
    report: &ProductReport<T>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => {
            for line in format_report(header, report) {
                writeln!(out, "{line}")?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for product in report {
                wtr.serialize(product)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::price::Price;

    fn chai() -> ProductPrice {
        ProductPrice {
            name: "Chai".to_string(),
            price: Price::new(dec!(18.00)),
        }
    }

    fn local_chai() -> ProductLocalPrice {
        ProductLocalPrice {
            name: "Chai".to_string(),
            price: Price::new(dec!(18.0000)),
            country: "UK".to_string(),
            local_price: Price::new(dec!(19.8)),
            currency_symbol: "£".to_string(),
        }
    }

    #[test]
    fn plain_line_is_name_and_price() {
        assert_eq!(chai().to_string(), "Chai, 18");
    }

    #[test]
    fn local_line_lists_all_five_fields_in_order() {
        assert_eq!(local_chai().to_string(), "Chai, 18$, UK, 20£");
    }

    #[test]
    fn local_line_pads_small_prices_to_two_digits() {
        let line = ProductLocalPrice {
            name: "Geitost".to_string(),
            price: Price::new(dec!(2.5000)),
            country: "Norway".to_string(),
            local_price: Price::new(dec!(4.5)),
            currency_symbol: "kr".to_string(),
        };
        assert_eq!(line.to_string(), "Geitost, 03$, Norway, 05kr");
    }

    #[test]
    fn format_report_starts_with_header() {
        let report = ProductReport::new(vec![local_chai()]);
        assert_eq!(
            format_report("current products:", &report),
            vec!["Report - current products:", "Chai, 18$, UK, 20£"]
        );
    }

    #[test]
    fn format_report_of_empty_report_is_just_the_header() {
        let report: ProductReport<ProductPrice> = ProductReport::new(Vec::new());
        assert_eq!(
            format_report("current products:", &report),
            vec!["Report - current products:"]
        );
    }

    #[test]
    fn write_report_plain_writes_one_line_each() {
        let report = ProductReport::new(vec![chai(), chai()]);
        let mut out = Vec::new();
        write_report(&mut out, OutputFormat::Plain, "2 most expensive products:", &report).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Report - 2 most expensive products:\nChai, 18\nChai, 18\n"
        );
    }

    #[test]
    fn write_report_csv_writes_header_record_and_rows() {
        let report = ProductReport::new(vec![local_chai()]);
        let mut out = Vec::new();
        write_report(&mut out, OutputFormat::Csv, "ignored", &report).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,price,country,local_price,currency_symbol\nChai,18,UK,19.8,£\n"
        );
    }
}
