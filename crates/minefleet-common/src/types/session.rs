//! Session record - the persisted checkpoint of one agent

use serde::{Deserialize, Serialize};

use super::earnings::EarningsSnapshot;
use crate::accrual::validate_amount;
use crate::error::ValidationError;

/// Persisted per-agent checkpoint
///
/// Serialized as
/// `{ "startTime": number, "earnings": {...}, "referralBonus": number }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Start of accrual (Unix milliseconds). Older checkpoints may lack it.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Last known earnings
    pub earnings: EarningsSnapshot,
    /// Referral multiplier fraction
    #[serde(default)]
    pub referral_bonus: f64,
}

impl SessionRecord {
    pub fn new(start_time: Option<i64>, earnings: EarningsSnapshot, referral_bonus: f64) -> Self {
        Self {
            start_time,
            earnings,
            referral_bonus,
        }
    }

    /// Check the record is safe to resume from
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.earnings.validate()?;
        validate_amount("referralBonus", self.referral_bonus)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let record = SessionRecord::new(
            Some(1_700_000_000_000),
            EarningsSnapshot {
                total: 1.5,
                pending: 0.5,
                paid: 0.25,
            },
            0.1,
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["startTime"], 1_700_000_000_000i64);
        assert_eq!(json["earnings"]["total"], 1.5);
        assert_eq!(json["earnings"]["paid"], 0.25);
        assert_eq!(json["referralBonus"], 0.1);
    }

    #[test]
    fn test_validate() {
        let good = SessionRecord::new(Some(0), EarningsSnapshot::fresh(0.1), 0.1);
        assert!(good.validate().is_ok());

        let negative_bonus = SessionRecord::new(Some(0), EarningsSnapshot::default(), -2.0);
        assert!(matches!(
            negative_bonus.validate(),
            Err(ValidationError::Negative { field: "referralBonus", .. })
        ));

        let overpaid = SessionRecord::new(
            Some(0),
            EarningsSnapshot {
                total: 5.0,
                pending: 0.0,
                paid: 9.0,
            },
            0.0,
        );
        assert!(matches!(
            overpaid.validate(),
            Err(ValidationError::TotalBelowPaid { .. })
        ));
    }

    #[test]
    fn test_missing_start_time_parses() {
        let json = r#"{"earnings":{"total":2.0,"pending":0.0,"paid":0.0},"referralBonus":0.05}"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.start_time, None);
        assert_eq!(record.referral_bonus, 0.05);
    }
}
