use std::fmt;

use thiserror::Error;

use super::{CurrencyCode, HttpRateSource};
use crate::{config::Config, ledger::Amount};

#[derive(Debug, Error)]
pub enum RateError {
    #[error("{source_name}: request failed: {message}")]
    Transport {
        source_name: String,
        message: String,
    },
    #[error("{source_name}: unreadable response: {message}")]
    Decode {
        source_name: String,
        message: String,
    },
    #[error("{source_name}: no rate for {currency}")]
    MissingRate {
        source_name: String,
        currency: String,
    },
    #[error("{source_name}: rejected rate {value}")]
    InvalidRate { source_name: String, value: f64 },
    #[error("exchange rate unavailable")]
    Unavailable,
}

/// One remote place an exchange rate can come from.
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    /// Returns quote-currency units per one unit of `base`.
    fn fetch(&self, base: &CurrencyCode, quote: &CurrencyCode) -> Result<f64, RateError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateOrigin {
    Remote(String),
    LocalOverride,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateOrigin::Remote(name) => f.write_str(name),
            RateOrigin::LocalOverride => f.write_str("local rate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub rate: f64,
    pub origin: RateOrigin,
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl RateQuote {
    /// Advisory conversion of a base-currency amount. Never written back to the ledger.
    pub fn convert(&self, amount: Amount) -> f64 {
        amount as f64 * self.rate
    }

    pub fn disclosure(&self) -> String {
        format!(
            "1 {} = {} {} ({})",
            self.base,
            super::format_number(self.rate, 2),
            self.quote,
            self.origin
        )
    }
}

/// Ordered fallback chain: first remote source that answers wins, then the local rate.
pub struct RateProvider {
    base: CurrencyCode,
    quote: CurrencyCode,
    sources: Vec<Box<dyn RateSource>>,
}

impl RateProvider {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        Self {
            base,
            quote,
            sources: Vec::new(),
        }
    }

    /// Builds HTTP sources for every configured endpoint, in order.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.request_timeout();
        config.rate_sources.iter().fold(
            Self::new(config.base_currency(), config.quote_currency()),
            |provider, source| provider.with_source(HttpRateSource::new(source, timeout)),
        )
    }

    pub fn with_source(mut self, source: impl RateSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn quote(&self) -> &CurrencyCode {
        &self.quote
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Never fails on network errors; the only error is [`RateError::Unavailable`].
    pub fn get_rate(&self, local_rate: Option<f64>) -> Result<RateQuote, RateError> {
        for source in &self.sources {
            match source.fetch(&self.base, &self.quote) {
                Ok(rate) if rate.is_finite() && rate > 0.0 => {
                    tracing::debug!(source = source.name(), rate, "exchange rate fetched");
                    return Ok(self.quote_with(rate, RateOrigin::Remote(source.name().into())));
                }
                Ok(rate) => {
                    tracing::warn!(source = source.name(), rate, "ignoring non-positive rate");
                }
                Err(err) => {
                    tracing::warn!(source = source.name(), error = %err, "rate source failed");
                }
            }
        }

        match local_rate.filter(|rate| rate.is_finite() && *rate > 0.0) {
            Some(rate) => {
                tracing::info!(rate, "falling back to local exchange rate");
                Ok(self.quote_with(rate, RateOrigin::LocalOverride))
            }
            None => {
                tracing::warn!(
                    base = %self.base,
                    quote = %self.quote,
                    "no exchange rate available"
                );
                Err(RateError::Unavailable)
            }
        }
    }

    fn quote_with(&self, rate: f64, origin: RateOrigin) -> RateQuote {
        RateQuote {
            rate,
            origin,
            base: self.base.clone(),
            quote: self.quote.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed(&'static str, Option<f64>, Arc<AtomicUsize>);

    impl RateSource for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn fetch(&self, _base: &CurrencyCode, quote: &CurrencyCode) -> Result<f64, RateError> {
            self.2.fetch_add(1, Ordering::SeqCst);
            self.1.ok_or_else(|| RateError::MissingRate {
                source_name: self.0.into(),
                currency: quote.to_string(),
            })
        }
    }

    fn provider() -> RateProvider {
        RateProvider::new(CurrencyCode::new("USD"), CurrencyCode::new("UZS"))
    }

    #[test]
    fn first_successful_source_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = provider()
            .with_source(Fixed("down", None, calls.clone()))
            .with_source(Fixed("primary", Some(12_650.0), calls.clone()))
            .with_source(Fixed("never", Some(1.0), calls.clone()));
        let quote = provider.get_rate(Some(12_500.0)).unwrap();
        assert_eq!(quote.rate, 12_650.0);
        assert_eq!(quote.origin, RateOrigin::Remote("primary".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn local_rate_used_when_all_sources_fail() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = provider()
            .with_source(Fixed("a", None, calls.clone()))
            .with_source(Fixed("b", Some(-3.0), calls.clone()));
        let quote = provider.get_rate(Some(12_500.0)).unwrap();
        assert_eq!(quote.rate, 12_500.0);
        assert_eq!(quote.origin, RateOrigin::LocalOverride);
    }

    #[test]
    fn unavailable_without_sources_or_local_rate() {
        assert!(matches!(provider().get_rate(None), Err(RateError::Unavailable)));
    }

    #[test]
    fn conversion_is_advisory_multiplication() {
        let quote = provider().get_rate(Some(12_500.0)).unwrap();
        assert_eq!(quote.convert(10), 125_000.0);
        assert_eq!(quote.disclosure(), "1 USD = 12,500.00 UZS (local rate)");
    }
}
