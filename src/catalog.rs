//! Reading product rows from the remote OData catalog.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use std::collections::HashSet;

use crate::{
    http::{self, HttpError},
    price::Price,
};

/// One product as the catalog reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub id: u32,
    pub name: String,
    pub price: Price,
    /// The supplier's country.
    pub country: String,
    pub discontinued: bool,
    pub units_in_stock: u32,
}

impl ProductRow {
    /// Reports whether the product is still sold and currently in stock.
    #[must_use]
    pub fn is_current(&self) -> bool {
        !self.discontinued && self.units_in_stock > 0
    }
}

/// Which products to ask the catalog for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductQuery {
    /// Products that are not discontinued and are in stock, in catalog order.
    Current,
    /// At most this many products, most expensive first.
    MostExpensive(usize),
}

impl ProductQuery {
    /// Reports whether `row` belongs in the result of this query.
    #[must_use]
    pub fn matches(&self, row: &ProductRow) -> bool {
        match self {
            Self::Current => row.is_current(),
            Self::MostExpensive(_) => true,
        }
    }

    /// The maximum number of rows this query returns, if bounded.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Current => None,
            Self::MostExpensive(count) => Some(*count),
        }
    }

    fn query_options(&self) -> Vec<(&'static str, String)> {
        let mut options = vec![
            ("$expand", "Supplier".to_string()),
            (
                "$select",
                "ProductID,ProductName,UnitPrice,Discontinued,UnitsInStock,Supplier/Country"
                    .to_string(),
            ),
        ];
        match self {
            Self::Current => {
                let filter = "Discontinued eq false and UnitsInStock gt 0";
                options.push(("$filter", filter.to_string()));
                options.push(("$orderby", "ProductID".to_string()));
            }
            Self::MostExpensive(count) => {
                options.push(("$orderby", "UnitPrice desc,ProductID".to_string()));
                options.push(("$top", count.to_string()));
            }
        }
        options
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("fetching products from the catalog")]
    Http(#[from] HttpError),
    #[error("catalog returned an unusable next page link {link:?}: {reason}")]
    NextLink { link: String, reason: String },
}

/// Read access to a product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns every row matching `query`, or an error. Never a partial result.
    async fn fetch_products(&self, query: ProductQuery) -> Result<Vec<ProductRow>, CatalogError>;
}

/// A product catalog served over OData V3, such as the public Northwind service.
pub struct ODataCatalog {
    client: Client,
    root: Url,
}

impl ODataCatalog {
    #[must_use]
    pub fn new(client: Client, root: Url) -> Self {
        Self {
            client,
            root: http::service_root(root),
        }
    }

    fn products_url(&self, query: ProductQuery) -> Url {
        let mut url = http::endpoint(&self.root, &["Products"]);
        url.query_pairs_mut().extend_pairs(query.query_options());
        url
    }

    fn next_page_url(&self, link: &str) -> Result<Url, CatalogError> {
        self.root.join(link).map_err(|e| CatalogError::NextLink {
            link: link.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ProductCatalog for ODataCatalog {
    async fn fetch_products(&self, query: ProductQuery) -> Result<Vec<ProductRow>, CatalogError> {
        let mut url = self.products_url(query);
        let mut fetched = HashSet::new();
        let mut rows = Vec::new();
        loop {
            fetched.insert(url.clone());
            let page: ODataPage = http::get_json(&self.client, url).await?;
            rows.extend(page.value.into_iter().filter_map(ODataProduct::into_row));
            if let Some(limit) = query.limit() {
                if rows.len() >= limit {
                    rows.truncate(limit);
                    break;
                }
            }
            let Some(link) = page.next_link else {
                break;
            };
            url = self.next_page_url(&link)?;
            if fetched.contains(&url) {
                return Err(CatalogError::NextLink {
                    link,
                    reason: "it points back to a page already fetched".to_string(),
                });
            }
        }
        debug!(count = rows.len(), ?query, "fetched products");
        Ok(rows)
    }
}

/// One page of an OData V3 JSON light collection.
#[derive(Debug, Deserialize)]
struct ODataPage {
    value: Vec<ODataProduct>,
    #[serde(rename = "odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ODataProduct {
    #[serde(rename = "ProductID")]
    product_id: u32,
    product_name: String,
    unit_price: Option<Price>,
    #[serde(default)]
    discontinued: bool,
    units_in_stock: Option<u32>,
    supplier: Option<ODataSupplier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ODataSupplier {
    country: Option<String>,
}

impl ODataProduct {
    fn into_row(self) -> Option<ProductRow> {
        let Some(price) = self.unit_price else {
            warn!(product = %self.product_name, "skipping product without a unit price");
            return None;
        };
        Some(ProductRow {
            id: self.product_id,
            name: self.product_name,
            price,
            country: self
                .supplier
                .and_then(|s| s.country)
                .unwrap_or_default(),
            discontinued: self.discontinued,
            units_in_stock: self.units_in_stock.unwrap_or_default(),
        })
    }
}
