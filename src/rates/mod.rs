use thiserror::Error;

/// Fallback applied by callers when no reference quote can be resolved.
/// Policy lives at the collaborator level; the engine never substitutes it.
pub const DEFAULT_MONTHLY_RATE_PERCENT: f64 = 1.0;

/// Banco Central do Brasil SGS reference-rate series.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RateSource {
    Selic,
    Ipca,
    Igpm,
    Cdi,
}

impl RateSource {
    pub const ALL: [RateSource; 4] = [
        RateSource::Selic,
        RateSource::Ipca,
        RateSource::Igpm,
        RateSource::Cdi,
    ];

    pub fn sgs_series_code(self) -> u32 {
        match self {
            RateSource::Selic => 1178,
            RateSource::Ipca => 433,
            RateSource::Igpm => 189,
            RateSource::Cdi => 4390,
        }
    }

    /// SELIC and CDI are quoted as annual percentages and need conversion;
    /// IPCA and IGP-M are already monthly.
    pub fn quotes_annual_rate(self) -> bool {
        matches!(self, RateSource::Selic | RateSource::Cdi)
    }

    pub fn label(self) -> &'static str {
        match self {
            RateSource::Selic => "SELIC",
            RateSource::Ipca => "IPCA",
            RateSource::Igpm => "IGP-M",
            RateSource::Cdi => "CDI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLookupError {
    #[error("rate service returned an empty quote")]
    EmptyQuote,
    #[error("rate service returned an unparseable quote: {0:?}")]
    MalformedQuote(String),
    #[error("rate service returned a non-finite quote")]
    NonFiniteQuote,
}

/// SGS quotes values as decimal-comma strings, e.g. "13,65".
pub fn parse_sgs_value(raw: &str) -> Result<f64, RateLookupError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RateLookupError::EmptyQuote);
    }
    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| RateLookupError::MalformedQuote(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(RateLookupError::NonFiniteQuote);
    }
    Ok(value)
}

pub fn monthly_rate_from_annual(annual_percent: f64) -> f64 {
    ((1.0 + annual_percent / 100.0).powf(1.0 / 12.0) - 1.0) * 100.0
}

/// Turns a raw SGS quote into the monthly percent rate the engine consumes,
/// converting from annual only for the sources that quote annually.
pub fn resolve_monthly_rate(source: RateSource, raw_quote: &str) -> Result<f64, RateLookupError> {
    let quoted = parse_sgs_value(raw_quote)?;
    if source.quotes_annual_rate() {
        Ok(monthly_rate_from_annual(quoted))
    } else {
        Ok(quoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn series_codes_match_sgs() {
        assert_eq!(RateSource::Selic.sgs_series_code(), 1178);
        assert_eq!(RateSource::Ipca.sgs_series_code(), 433);
        assert_eq!(RateSource::Igpm.sgs_series_code(), 189);
        assert_eq!(RateSource::Cdi.sgs_series_code(), 4390);
    }

    #[test]
    fn only_annual_sources_need_conversion() {
        assert!(RateSource::Selic.quotes_annual_rate());
        assert!(RateSource::Cdi.quotes_annual_rate());
        assert!(!RateSource::Ipca.quotes_annual_rate());
        assert!(!RateSource::Igpm.quotes_annual_rate());
    }

    #[test]
    fn parses_decimal_comma_quotes() {
        assert_approx(parse_sgs_value("13,65").expect("valid quote"), 13.65);
        assert_approx(parse_sgs_value(" 0,5 ").expect("valid quote"), 0.5);
        assert_approx(parse_sgs_value("-1,2").expect("valid quote"), -1.2);
        assert_approx(parse_sgs_value("11.25").expect("valid quote"), 11.25);
    }

    #[test]
    fn rejects_empty_and_malformed_quotes() {
        assert_eq!(parse_sgs_value("  "), Err(RateLookupError::EmptyQuote));
        assert_eq!(
            parse_sgs_value("n/a"),
            Err(RateLookupError::MalformedQuote("n/a".to_string()))
        );
        assert_eq!(parse_sgs_value("inf"), Err(RateLookupError::NonFiniteQuote));
    }

    #[test]
    fn annual_to_monthly_conversion() {
        assert_approx(monthly_rate_from_annual(0.0), 0.0);
        // 1.01^12 - 1 = 12.68250301319698%, so the inverse lands on 1%/month.
        assert_approx(monthly_rate_from_annual(12.68250301319698), 1.0);
    }

    #[test]
    fn annual_to_monthly_round_trips() {
        for annual in [0.5, 4.33, 10.0, 13.65] {
            let monthly = monthly_rate_from_annual(annual);
            let recompounded = ((1.0 + monthly / 100.0).powi(12) - 1.0) * 100.0;
            assert!((recompounded - annual).abs() <= 1e-9);
        }
    }

    #[test]
    fn resolve_converts_annual_sources_only() {
        let monthly = resolve_monthly_rate(RateSource::Ipca, "0,43").expect("valid quote");
        assert_approx(monthly, 0.43);

        let converted = resolve_monthly_rate(RateSource::Selic, "12,68250301319698")
            .expect("valid quote");
        assert_approx(converted, 1.0);
    }

    #[test]
    fn resolve_propagates_lookup_errors() {
        assert_eq!(
            resolve_monthly_rate(RateSource::Cdi, ""),
            Err(RateLookupError::EmptyQuote)
        );
    }
}
