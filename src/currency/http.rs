//! HTTP(S) JSON exchange-rate sources.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CurrencyCode, RateError, RateSource};

/// Upper bound on any single rate request.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response shapes understood by [`HttpRateSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePayload {
    /// `{"rates": {"UZS": 12650.5, ...}}`, quoted against the requested base.
    RatesMap,
    /// `[{"Ccy": "USD", "Rate": "12650.15", "Nominal": "1"}, ...]`, quoted in the
    /// publisher's home currency, which must be the configured quote currency.
    CcyList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSourceConfig {
    pub name: String,
    /// May contain `{base}` and `{quote}` placeholders.
    pub url: String,
    pub payload: RatePayload,
}

impl RateSourceConfig {
    pub fn defaults() -> Vec<RateSourceConfig> {
        vec![
            RateSourceConfig {
                name: "open.er-api.com".into(),
                url: "https://open.er-api.com/v6/latest/{base}".into(),
                payload: RatePayload::RatesMap,
            },
            RateSourceConfig {
                name: "cbu.uz".into(),
                url: "https://cbu.uz/uz/arkhiv-kursov-valyut/json/".into(),
                payload: RatePayload::CcyList,
            },
        ]
    }
}

pub struct HttpRateSource {
    name: String,
    url: String,
    payload: RatePayload,
    client: Client,
}

impl HttpRateSource {
    /// `timeout` is clamped to [`MAX_REQUEST_TIMEOUT`].
    pub fn new(config: &RateSourceConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout.min(MAX_REQUEST_TIMEOUT))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            payload: config.payload,
            client,
        }
    }

    fn resolve_url(&self, base: &CurrencyCode, quote: &CurrencyCode) -> String {
        self.url
            .replace("{base}", base.as_str())
            .replace("{quote}", quote.as_str())
    }

    fn transport(&self, err: reqwest::Error) -> RateError {
        RateError::Transport {
            source_name: self.name.clone(),
            message: err.to_string(),
        }
    }
}

impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, base: &CurrencyCode, quote: &CurrencyCode) -> Result<f64, RateError> {
        let url = self.resolve_url(base, quote);
        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| self.transport(err))?;

        let body: Value = response.json().map_err(|err| RateError::Decode {
            source_name: self.name.clone(),
            message: err.to_string(),
        })?;

        extract_rate(&self.name, self.payload, &body, base, quote)
    }
}

/// Pulls a positive quote-per-base rate out of a decoded response body.
pub fn extract_rate(
    source_name: &str,
    payload: RatePayload,
    body: &Value,
    base: &CurrencyCode,
    quote: &CurrencyCode,
) -> Result<f64, RateError> {
    let missing = |currency: &CurrencyCode| RateError::MissingRate {
        source_name: source_name.to_string(),
        currency: currency.to_string(),
    };

    let rate = match payload {
        RatePayload::RatesMap => body
            .get("rates")
            .and_then(|rates| rates.get(quote.as_str()))
            .and_then(numeric)
            .ok_or_else(|| missing(quote))?,
        RatePayload::CcyList => {
            let row = body
                .as_array()
                .and_then(|rows| {
                    rows.iter().find(|row| {
                        row.get("Ccy")
                            .and_then(Value::as_str)
                            .is_some_and(|code| code.eq_ignore_ascii_case(base.as_str()))
                    })
                })
                .ok_or_else(|| missing(base))?;
            let rate = row.get("Rate").and_then(numeric).ok_or_else(|| missing(base))?;
            let nominal = row.get("Nominal").and_then(numeric).unwrap_or(1.0);
            if nominal > 0.0 {
                rate / nominal
            } else {
                rate
            }
        }
    };

    if !rate.is_finite() || rate <= 0.0 {
        return Err(RateError::InvalidRate {
            source_name: source_name.to_string(),
            value: rate,
        });
    }
    Ok(rate)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
