//! Where the remote services live, and how to reach them.

use anyhow::{Context, Result};
use clap::Args;
use reqwest::{Client, Url};

use std::time::Duration;

use crate::{
    catalog::ODataCatalog,
    currency::{CurrencyLayer, RestCountries},
};

pub const DEFAULT_CATALOG_URL: &str = "https://services.odata.org/V3/Northwind/Northwind.svc/";
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/";
pub const DEFAULT_RATES_URL: &str = "http://api.currencylayer.com/";

/// Service endpoints and credentials, from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Root of the OData product catalog service
    #[arg(long, env = "CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: Url,

    /// Root of the country to currency lookup service
    #[arg(long, env = "COUNTRIES_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: Url,

    /// Root of the exchange rate service
    #[arg(long, env = "RATES_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: Url,

    /// Access key for the exchange rate service (needed for local prices)
    #[arg(long, env = "EXCHANGE_RATES_API_KEY", hide_env_values = true)]
    pub rates_api_key: Option<String>,

    /// Seconds to wait for any single request before giving up
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Settings {
    /// Builds the HTTP client shared by all the services.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")
    }

    #[must_use]
    pub fn catalog(&self, client: Client) -> ODataCatalog {
        ODataCatalog::new(client, self.catalog_url.clone())
    }

    #[must_use]
    pub fn country_currency(&self, client: Client) -> RestCountries {
        RestCountries::new(client, self.countries_url.clone())
    }

    /// # Errors
    ///
    /// Returns an error if no access key is configured.
    pub fn exchange_rates(&self, client: Client) -> Result<CurrencyLayer> {
        let key = self
            .rates_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .context(
                "local prices need an exchange rate access key \
                 (use --rates-api-key or set EXCHANGE_RATES_API_KEY)",
            )?;
        Ok(CurrencyLayer::new(
            client,
            self.rates_url.clone(),
            key.to_string(),
        ))
    }
}
