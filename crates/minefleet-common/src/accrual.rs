//! Earnings accrual model
//!
//! ```text
//! increment = rate × elapsed_seconds × BASE_FACTOR × (1 + referral_bonus)
//! ```
//!
//! The model is a pure function of its inputs. Callers must pass the result
//! through [`validate_amount`] before it goes into a sync payload.

use tracing::warn;

use crate::error::ValidationError;
use crate::BASE_FACTOR;

/// Parameters that stay fixed for the life of an agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccrualParams {
    /// Accrual rate (synthetic hashrate)
    pub rate: f64,
    /// Referral multiplier fraction
    pub referral_bonus: f64,
}

impl AccrualParams {
    pub fn new(rate: f64, referral_bonus: f64) -> Self {
        Self {
            rate,
            referral_bonus,
        }
    }

    /// Increment accrued between `start_time` and `now` (both Unix millis)
    pub fn increment_since(&self, start_time: Option<i64>, now: i64) -> f64 {
        match start_time {
            Some(start) => {
                let elapsed_secs = (now - start).max(0) as f64 / 1000.0;
                accrue(elapsed_secs, self.rate, self.referral_bonus)
            }
            None => {
                warn!("Accrual requested without a start time, using zero increment");
                0.0
            }
        }
    }
}

/// Earnings for `elapsed_secs` at `rate` with the given referral bonus
#[inline]
pub fn accrue(elapsed_secs: f64, rate: f64, referral_bonus: f64) -> f64 {
    rate * elapsed_secs * BASE_FACTOR * (1.0 + referral_bonus)
}

/// Accept only non-negative finite numbers
pub fn validate_amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_nan() {
        return Err(ValidationError::NotANumber { field });
    }
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HASHRATE_MHS;

    #[test]
    fn test_accrue_formula() {
        let got = accrue(60.0, 100.0, 0.5);
        let expected = 100.0 * 60.0 * BASE_FACTOR * 1.5;
        assert!((got - expected).abs() < 1e-15);
    }

    #[test]
    fn test_accrue_zero_elapsed() {
        assert_eq!(accrue(0.0, HASHRATE_MHS, 0.0), 0.0);
        assert_eq!(accrue(0.0, HASHRATE_MHS, 2.0), 0.0);
    }

    #[test]
    fn test_bonus_scales_linearly() {
        let base = accrue(30.0, HASHRATE_MHS, 0.0);
        let boosted = accrue(30.0, HASHRATE_MHS, 1.0);
        assert!((boosted - 2.0 * base).abs() < 1e-15);
    }

    #[test]
    fn test_increment_since_without_start() {
        let params = AccrualParams::new(HASHRATE_MHS, 0.1);
        assert_eq!(params.increment_since(None, 1_000_000), 0.0);
    }

    #[test]
    fn test_increment_since_future_start_is_zero() {
        let params = AccrualParams::new(HASHRATE_MHS, 0.0);
        assert_eq!(params.increment_since(Some(10_000), 5_000), 0.0);
    }

    #[test]
    fn test_increment_since_uses_seconds() {
        let params = AccrualParams::new(HASHRATE_MHS, 0.0);
        let got = params.increment_since(Some(0), 30_000);
        assert!((got - accrue(30.0, HASHRATE_MHS, 0.0)).abs() < 1e-15);
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount("x", 0.0), Ok(0.0));
        assert_eq!(validate_amount("x", 12.5), Ok(12.5));
        assert_eq!(
            validate_amount("x", f64::NAN),
            Err(ValidationError::NotANumber { field: "x" })
        );
        assert!(matches!(
            validate_amount("x", f64::INFINITY),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            validate_amount("x", f64::NEG_INFINITY),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            validate_amount("x", -0.001),
            Err(ValidationError::Negative { .. })
        ));
    }
}
