#![doc = include_str!("../README.md")]
pub mod catalog;
pub mod cli;
pub mod config;
pub mod currency;
pub mod format;
pub mod http;
pub mod price;
pub mod report;

pub use catalog::{CatalogError, ODataCatalog, ProductCatalog, ProductQuery, ProductRow};
pub use currency::{
    CountryCurrency, CountryInfo, CurrencyError, CurrencyLayer, ExchangeRates, RestCountries,
};
pub use format::{format_report, write_report, OutputFormat};
pub use price::Price;
pub use report::{
    localize, ProductLocalPrice, ProductPrice, ProductReport, ReportError, ReportService,
    BASE_CURRENCY,
};
