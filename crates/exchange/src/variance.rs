use serde::{Deserialize, Serialize};

use gasflow_core::{DomainError, DomainResult};

/// Sign of the empty-return variance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarianceType {
    /// Fewer empties collected than expected (varianceQty < 0).
    Shortage,
    /// More empties collected than expected (varianceQty > 0).
    Excess,
    /// Collected exactly what was expected.
    Match,
}

impl VarianceType {
    pub fn as_str(self) -> &'static str {
        match self {
            VarianceType::Shortage => "SHORTAGE",
            VarianceType::Excess => "EXCESS",
            VarianceType::Match => "MATCH",
        }
    }
}

impl core::fmt::Display for VarianceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// varianceQty = emptyCollected − expectedEmpty, classified by sign.
pub fn classify_variance(variance_qty: i64) -> VarianceType {
    match variance_qty {
        q if q < 0 => VarianceType::Shortage,
        q if q > 0 => VarianceType::Excess,
        _ => VarianceType::Match,
    }
}

/// A reason is mandatory exactly when the counts don't match.
pub fn validate_variance_reason(variance_qty: i64, reason: Option<&str>) -> DomainResult<()> {
    let has_reason = reason.map(|r| !r.trim().is_empty()).unwrap_or(false);
    if variance_qty != 0 && !has_reason {
        return Err(DomainError::validation(format!(
            "variance of {variance_qty} requires a variance reason"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_sign() {
        assert_eq!(classify_variance(-10), VarianceType::Shortage);
        assert_eq!(classify_variance(3), VarianceType::Excess);
        assert_eq!(classify_variance(0), VarianceType::Match);
    }

    #[test]
    fn reason_required_only_on_mismatch() {
        assert!(validate_variance_reason(0, None).is_ok());
        assert!(validate_variance_reason(-5, Some("two cylinders kept by customer")).is_ok());
        assert!(validate_variance_reason(-5, None).is_err());
        assert!(validate_variance_reason(2, Some("  ")).is_err());
    }
}
