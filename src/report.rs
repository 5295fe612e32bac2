use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    catalog::{CatalogError, ProductCatalog, ProductQuery, ProductRow},
    currency::{CountryCurrency, CurrencyError, ExchangeRates},
    price::Price,
};

/// The currency the catalog prices products in.
pub const BASE_CURRENCY: &str = "USD";

/// A product and its catalog price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPrice {
    pub name: String,
    pub price: Price,
}

/// A product with its catalog price converted to the currency of the
/// supplier's country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLocalPrice {
    pub name: String,
    pub price: Price,
    pub country: String,
    pub local_price: Price,
    pub currency_symbol: String,
}

/// An ordered list of report lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductReport<T> {
    products: Vec<T>,
}

impl<T> ProductReport<T> {
    #[must_use]
    pub fn new(products: Vec<T>) -> Self {
        Self { products }
    }

    #[must_use]
    pub fn products(&self) -> &[T] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a ProductReport<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("product count must be a positive integer")]
    InvalidCount,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("converting the price of {product:?}")]
    Currency {
        product: String,
        #[source]
        source: CurrencyError,
    },
}

/// Builds product reports from a [`ProductCatalog`].
///
/// To create a service, use [`ReportService::new`] with any catalog, such as
/// [`ODataCatalog`](crate::ODataCatalog) or a test double.
pub struct ReportService<C> {
    catalog: C,
}

impl<C: ProductCatalog> ReportService<C> {
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Returns the `count` most expensive products, most expensive first.
    ///
    /// Products with the same price keep their catalog order. If the catalog
    /// holds fewer than `count` products, all of them are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidCount`] if `count` is zero, without
    /// contacting the catalog, and any error from fetching the products.
    pub async fn most_expensive_products(
        &self,
        count: usize,
    ) -> Result<ProductReport<ProductPrice>, ReportError> {
        if count == 0 {
            return Err(ReportError::InvalidCount);
        }
        let mut rows = self
            .catalog
            .fetch_products(ProductQuery::MostExpensive(count))
            .await?;
        rows.sort_by(|a, b| b.price.cmp(&a.price));
        rows.truncate(count);
        Ok(ProductReport::new(rows.into_iter().map(product_price).collect()))
    }

    /// Returns the products that are still sold and in stock, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns any error from fetching the products.
    pub async fn current_products(&self) -> Result<ProductReport<ProductPrice>, ReportError> {
        let rows = self.fetch_current().await?;
        Ok(ProductReport::new(rows.into_iter().map(product_price).collect()))
    }

    /// Returns the current products with their prices converted to the
    /// currency of each supplier's country.
    ///
    /// Every row triggers its own currency lookup and exchange rate request.
    /// A row whose country or currency cannot be resolved is left out of the
    /// report, with a warning.
    ///
    /// # Errors
    ///
    /// Returns any error from fetching the products, and any currency service
    /// failure other than an unresolved country or currency.
    pub async fn current_products_with_local_currency(
        &self,
        countries: &impl CountryCurrency,
        rates: &impl ExchangeRates,
    ) -> Result<ProductReport<ProductLocalPrice>, ReportError> {
        let rows = self.fetch_current().await?;
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            match localize(&row, countries, rates).await {
                Ok(local) => products.push(local),
                Err(e) if e.is_unresolved() => {
                    warn!(product = %row.name, country = %row.country, "leaving out product: {e}");
                }
                Err(source) => {
                    return Err(ReportError::Currency {
                        product: row.name,
                        source,
                    })
                }
            }
        }
        Ok(ProductReport::new(products))
    }

    async fn fetch_current(&self) -> Result<Vec<ProductRow>, ReportError> {
        let query = ProductQuery::Current;
        let mut rows = self.catalog.fetch_products(query).await?;
        let fetched = rows.len();
        rows.retain(|row| query.matches(row));
        if rows.len() != fetched {
            let dropped = fetched - rows.len();
            debug!(dropped, "catalog returned products that are not current");
        }
        Ok(rows)
    }
}

fn product_price(row: ProductRow) -> ProductPrice {
    ProductPrice {
        name: row.name,
        price: row.price,
    }
}

/// Converts the price of `row` into the currency of its country, rounded to
/// cents.
///
/// # Errors
///
/// Returns any error from the currency lookup or the exchange rate request.
pub async fn localize(
    row: &ProductRow,
    countries: &impl CountryCurrency,
    rates: &impl ExchangeRates,
) -> Result<ProductLocalPrice, CurrencyError> {
    let info = countries.lookup(&row.country).await?;
    let rate = rates
        .exchange_rate(BASE_CURRENCY, &info.currency_code)
        .await?;
    Ok(ProductLocalPrice {
        name: row.name.clone(),
        price: row.price,
        country: row.country.clone(),
        local_price: (row.price * rate).round_cents(),
        currency_symbol: info.currency_symbol,
    })
}
