//! Country to currency lookups and exchange rates.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use std::collections::{BTreeMap, HashMap};

use crate::http::{self, HttpError};

/// The currency used in a country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryInfo {
    pub country: String,
    pub currency_code: String,
    pub currency_symbol: String,
}

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("no currency is known for country {0:?}")]
    UnknownCountry(String),
    #[error("no exchange rate from {from} to {to}")]
    UnknownCurrency { from: String, to: String },
    #[error("exchange rate service error {code}: {info}")]
    Api { code: i64, info: String },
    #[error("querying currency service")]
    Http(#[from] HttpError),
}

impl CurrencyError {
    /// Reports whether the error means "this country or currency cannot be
    /// resolved", as opposed to the service itself failing.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnknownCountry(_) | Self::UnknownCurrency { .. })
    }
}

/// Maps a country name to its currency.
#[async_trait]
pub trait CountryCurrency: Send + Sync {
    async fn lookup(&self, country: &str) -> Result<CountryInfo, CurrencyError>;
}

/// Supplies the rate for converting one unit of `from` into `to`.
#[async_trait]
pub trait ExchangeRates: Send + Sync {
    async fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, CurrencyError>;
}

/// Short names used by the catalog that the lookup service only knows by
/// their full name.
const COUNTRY_ALIASES: &[(&str, &str)] = &[("UK", "United Kingdom"), ("USA", "United States")];

fn full_country_name(country: &str) -> &str {
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(country))
        .map_or(country, |&(_, name)| name)
}

/// Country lookups against the REST Countries v3.1 API.
pub struct RestCountries {
    client: Client,
    root: Url,
}

impl RestCountries {
    #[must_use]
    pub fn new(client: Client, root: Url) -> Self {
        Self {
            client,
            root: http::service_root(root),
        }
    }

    fn lookup_url(&self, country: &str) -> Url {
        let mut url = http::endpoint(&self.root, &["name", full_country_name(country)]);
        url.query_pairs_mut()
            .append_pair("fullText", "true")
            .append_pair("fields", "name,currencies");
        url
    }
}

#[async_trait]
impl CountryCurrency for RestCountries {
    async fn lookup(&self, country: &str) -> Result<CountryInfo, CurrencyError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(CurrencyError::UnknownCountry(country.to_string()));
        }
        let url = self.lookup_url(country);
        let found: Vec<RestCountry> = match http::get_json(&self.client, url).await {
            Ok(found) => found,
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                return Err(CurrencyError::UnknownCountry(country.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        country_info(country, found)
    }
}

#[derive(Debug, Deserialize)]
struct RestCountry {
    #[serde(default)]
    currencies: BTreeMap<String, RestCurrency>,
}

#[derive(Debug, Deserialize)]
struct RestCurrency {
    symbol: Option<String>,
}

/// Picks the first currency, in code order, of the first matching country.
fn country_info(country: &str, found: Vec<RestCountry>) -> Result<CountryInfo, CurrencyError> {
    found
        .into_iter()
        .find_map(|c| c.currencies.into_iter().next())
        .map(|(code, currency)| CountryInfo {
            country: country.to_string(),
            currency_symbol: currency.symbol.unwrap_or_else(|| code.clone()),
            currency_code: code,
        })
        .ok_or_else(|| CurrencyError::UnknownCountry(country.to_string()))
}

/// Live exchange rates from the currencylayer API.
pub struct CurrencyLayer {
    client: Client,
    root: Url,
    access_key: String,
}

/// currencylayer's error code for an unsupported currency.
const INVALID_CURRENCY_CODES: i64 = 202;

impl CurrencyLayer {
    #[must_use]
    pub fn new(client: Client, root: Url, access_key: String) -> Self {
        Self {
            client,
            root: http::service_root(root),
            access_key,
        }
    }

    fn live_url(&self, from: &str, to: &str) -> Url {
        let mut url = http::endpoint(&self.root, &["live"]);
        url.query_pairs_mut()
            .append_pair("access_key", &self.access_key)
            .append_pair("source", from)
            .append_pair("currencies", to);
        url
    }
}

#[async_trait]
impl ExchangeRates for CurrencyLayer {
    async fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, CurrencyError> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();
        if from == to {
            return Ok(Decimal::ONE);
        }
        let live: LiveResponse = http::get_json(&self.client, self.live_url(&from, &to)).await?;
        live_rate(&from, &to, live)
    }
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    success: bool,
    #[serde(default)]
    quotes: HashMap<String, Decimal>,
    error: Option<LiveError>,
}

#[derive(Debug, Deserialize)]
struct LiveError {
    code: i64,
    #[serde(default)]
    info: String,
}

fn live_rate(from: &str, to: &str, live: LiveResponse) -> Result<Decimal, CurrencyError> {
    let unknown = || CurrencyError::UnknownCurrency {
        from: from.to_string(),
        to: to.to_string(),
    };
    if !live.success {
        return Err(match live.error {
            Some(e) if e.code == INVALID_CURRENCY_CODES => unknown(),
            Some(e) => CurrencyError::Api {
                code: e.code,
                info: e.info,
            },
            None => CurrencyError::Api {
                code: 0,
                info: "request was not successful".to_string(),
            },
        });
    }
    live.quotes
        .get(&format!("{from}{to}"))
        .copied()
        .ok_or_else(unknown)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::http::stub::{self, route, StubServer};

    fn fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        let body = std::fs::read_to_string(format!("testdata/{name}")).unwrap();
        serde_json::from_str(&body).unwrap()
    }

    fn unroutable() -> Url {
        Url::parse("http://127.0.0.1:9/").unwrap()
    }

    #[test]
    fn catalog_abbreviations_expand_to_full_names() {
        assert_eq!(full_country_name("UK"), "United Kingdom");
        assert_eq!(full_country_name("usa"), "United States");
        assert_eq!(full_country_name("Germany"), "Germany");
    }

    #[test]
    fn lookup_url_asks_for_full_name_match() {
        let countries = RestCountries::new(
            Client::new(),
            Url::parse("https://restcountries.com/v3.1").unwrap(),
        );
        let url = countries.lookup_url("UK");
        assert_eq!(url.path(), "/v3.1/name/United%20Kingdom");
        assert_eq!(url.query(), Some("fullText=true&fields=name%2Ccurrencies"));
    }

    #[test]
    fn country_info_takes_currency_from_lookup_response() {
        let info = country_info("UK", fixture("country_uk.json")).unwrap();
        assert_eq!(
            info,
            CountryInfo {
                country: "UK".to_string(),
                currency_code: "GBP".to_string(),
                currency_symbol: "£".to_string(),
            }
        );
    }

    #[test]
    fn country_without_currency_is_unknown() {
        let err = country_info("Antarctica", fixture("country_no_currency.json")).unwrap_err();
        assert!(matches!(err, CurrencyError::UnknownCountry(ref c) if c == "Antarctica"));
        assert!(err.is_unresolved());
    }

    #[test]
    fn currency_without_symbol_falls_back_to_code() {
        let found: Vec<RestCountry> =
            serde_json::from_str(r#"[{"currencies": {"XTS": {"name": "Test"}}}]"#).unwrap();
        let info = country_info("Testland", found).unwrap();
        assert_eq!(info.currency_symbol, "XTS");
    }

    #[tokio::test]
    async fn blank_country_is_unknown_without_a_request() {
        let countries = RestCountries::new(Client::new(), unroutable());
        let err = countries.lookup("  ").await.unwrap_err();
        assert!(err.is_unresolved());
    }

    #[test]
    fn live_rate_reads_source_currency_quote() {
        let rate = live_rate("USD", "GBP", fixture("rates_live.json")).unwrap();
        assert_eq!(rate, dec!(0.7665));
    }

    #[test]
    fn live_rate_without_requested_quote_is_unknown_currency() {
        let err = live_rate("USD", "EUR", fixture("rates_live.json")).unwrap_err();
        assert!(matches!(err, CurrencyError::UnknownCurrency { .. }));
    }

    #[test]
    fn invalid_currency_code_error_is_unknown_currency() {
        let err = live_rate("USD", "XXX", fixture("rates_invalid_currency.json")).unwrap_err();
        assert!(err.is_unresolved());
    }

    #[test]
    fn other_api_errors_are_not_unresolved() {
        let err = live_rate("USD", "GBP", fixture("rates_bad_key.json")).unwrap_err();
        assert!(matches!(err, CurrencyError::Api { code: 101, .. }));
        assert!(!err.is_unresolved());
    }

    #[test]
    fn live_url_carries_key_and_currency_pair() {
        let rates = CurrencyLayer::new(
            Client::new(),
            Url::parse("http://api.currencylayer.com").unwrap(),
            "k3y".to_string(),
        );
        let url = rates.live_url("USD", "GBP");
        assert_eq!(url.path(), "/live");
        assert_eq!(url.query(), Some("access_key=k3y&source=USD&currencies=GBP"));
    }

    #[tokio::test]
    async fn same_currency_rate_is_one_without_a_request() {
        let rates = CurrencyLayer::new(Client::new(), unroutable(), "unused".to_string());
        assert_eq!(rates.exchange_rate("usd", "USD").await.unwrap(), Decimal::ONE);
    }

    #[tokio::test]
    async fn lookup_over_http_finds_currency() {
        let server = StubServer::start(vec![route(
            "/name/United%20Kingdom",
            200,
            stub::fixture("country_uk.json"),
        )])
        .await;
        let countries = RestCountries::new(stub::client(), server.url());

        let info = countries.lookup("UK").await.unwrap();
        assert_eq!(info.currency_code, "GBP");
        assert_eq!(info.currency_symbol, "£");
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("fullText=true"), "{}", requests[0]);
    }

    #[tokio::test]
    async fn lookup_of_unknown_country_over_http_is_unresolved() {
        let not_found = r#"{"status":404,"message":"Not Found"}"#;
        let server = StubServer::start(vec![route("/name/", 404, not_found)]).await;
        let countries = RestCountries::new(stub::client(), server.url());

        let err = countries.lookup("Atlantis").await.unwrap_err();
        assert!(err.is_unresolved(), "{err:?}");
        assert!(matches!(err, CurrencyError::UnknownCountry(_)), "{err:?}");
    }

    #[tokio::test]
    async fn lookup_server_error_is_not_unresolved() {
        let server = StubServer::start(vec![route("/name/", 500, "{}")]).await;
        let countries = RestCountries::new(stub::client(), server.url());

        let err = countries.lookup("UK").await.unwrap_err();
        assert!(!err.is_unresolved(), "{err:?}");
    }

    #[tokio::test]
    async fn live_rate_over_http_uses_key_and_pair() {
        let server =
            StubServer::start(vec![route("/live", 200, stub::fixture("rates_live.json"))]).await;
        let rates = CurrencyLayer::new(stub::client(), server.url(), "k3y".to_string());

        assert_eq!(rates.exchange_rate("usd", "gbp").await.unwrap(), dec!(0.7665));
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(
            requests[0].ends_with("/live?access_key=k3y&source=USD&currencies=GBP"),
            "{}",
            requests[0]
        );
    }

    #[tokio::test]
    async fn invalid_currency_over_http_is_unresolved() {
        let server = StubServer::start(vec![route(
            "/live",
            200,
            stub::fixture("rates_invalid_currency.json"),
        )])
        .await;
        let rates = CurrencyLayer::new(stub::client(), server.url(), "k3y".to_string());

        let err = rates.exchange_rate("USD", "XYZ").await.unwrap_err();
        assert!(err.is_unresolved(), "{err:?}");
    }
}
