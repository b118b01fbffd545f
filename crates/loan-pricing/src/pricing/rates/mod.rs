//! Range-based interest-rate table and the resolver that prices against it.
//!
//! Rows are keyed by lender, CIBIL band and loan-amount band. The table is
//! administered out-of-band (CSV import or [`InMemoryRateTable::save`]); the
//! engine only ever reads active rows through [`RateTable`].

mod loader;
mod resolver;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Lender;

pub use loader::{load_rate_table_csv, load_rate_table_path, RateTableLoadError};
pub use resolver::{RateQuote, RateResolver};

pub const CIBIL_FLOOR: u16 = 300;
pub const CIBIL_CEILING: u16 = 900;

const SEED_ROWS: &str = "\
lender,cibil_min,cibil_max,amount_min,amount_max,rate_salaried,rate_non_salaried,processing_fee,active
lender_a,750,900,0,3000000,8.50,8.65,3000,true
lender_a,750,900,3000000,7500000,8.60,8.75,3000,true
lender_a,750,900,7500000,100000000,8.70,8.85,5000,true
lender_a,650,749,0,100000000,9.10,9.35,5000,true
lender_a,300,649,0,100000000,10.25,10.50,,true
lender_b,760,900,0,5000000,8.45,8.70,10000,true
lender_b,760,900,5000000,100000000,8.55,8.80,10000,true
lender_b,700,759,0,100000000,8.95,9.20,10000,true
lender_b,300,699,0,100000000,9.90,10.20,,true
";

/// One persisted rate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRangeConfig {
    pub id: u64,
    pub lender: Lender,
    pub cibil_min: u16,
    pub cibil_max: u16,
    pub amount_min: f64,
    pub amount_max: f64,
    pub rate_salaried: f64,
    pub rate_non_salaried: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_fee: Option<f64>,
    pub active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RateRangeConfig {
    /// Inclusive on both ends of both axes.
    pub fn covers(&self, cibil_score: u16, loan_amount: f64) -> bool {
        (self.cibil_min..=self.cibil_max).contains(&cibil_score)
            && loan_amount >= self.amount_min
            && loan_amount <= self.amount_max
    }
}

/// Administrative input for a new rate row, validated before it reaches the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRangeDraft {
    pub lender: Lender,
    pub cibil_min: u16,
    pub cibil_max: u16,
    pub amount_min: f64,
    pub amount_max: f64,
    pub rate_salaried: f64,
    pub rate_non_salaried: f64,
    #[serde(default)]
    pub processing_fee: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RateRangeDraft {
    pub fn validate(&self) -> Result<(), RateRangeValidationError> {
        if self.cibil_min < CIBIL_FLOOR || self.cibil_max > CIBIL_CEILING {
            return Err(RateRangeValidationError::CibilOutOfBounds {
                min: self.cibil_min,
                max: self.cibil_max,
            });
        }
        if self.cibil_min >= self.cibil_max {
            return Err(RateRangeValidationError::InvertedCibilRange {
                min: self.cibil_min,
                max: self.cibil_max,
            });
        }
        if !self.amount_min.is_finite() || !self.amount_max.is_finite() || self.amount_min < 0.0 {
            return Err(RateRangeValidationError::InvalidAmount {
                min: self.amount_min,
                max: self.amount_max,
            });
        }
        if self.amount_min >= self.amount_max {
            return Err(RateRangeValidationError::InvertedAmountRange {
                min: self.amount_min,
                max: self.amount_max,
            });
        }
        for (field, value) in [
            ("rate_salaried", self.rate_salaried),
            ("rate_non_salaried", self.rate_non_salaried),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RateRangeValidationError::InvalidRate { field, value });
            }
        }
        if let Some(fee) = self.processing_fee {
            if !fee.is_finite() || fee < 0.0 {
                return Err(RateRangeValidationError::NegativeProcessingFee(fee));
            }
        }
        Ok(())
    }
}

/// Rejections raised at the administrative boundary, never inside pricing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateRangeValidationError {
    #[error("CIBIL range {min}-{max} must stay within 300-900")]
    CibilOutOfBounds { min: u16, max: u16 },
    #[error("CIBIL minimum {min} must be below maximum {max}")]
    InvertedCibilRange { min: u16, max: u16 },
    #[error("loan amount bounds {min}-{max} must be finite and non-negative")]
    InvalidAmount { min: f64, max: f64 },
    #[error("loan amount minimum {min} must be below maximum {max}")]
    InvertedAmountRange { min: f64, max: f64 },
    #[error("{field} must be a non-negative percentage (got {value})")]
    InvalidRate { field: &'static str, value: f64 },
    #[error("processing fee must be non-negative (got {0})")]
    NegativeProcessingFee(f64),
}

/// Read access to the rate table. Implementations may be remote and therefore fallible.
pub trait RateTable: Send + Sync {
    fn active_ranges(&self, lender: Lender) -> Result<Vec<RateRangeConfig>, RateTableError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RateTableError {
    #[error("rate table unavailable: {0}")]
    Unavailable(String),
}

/// Process-local rate table guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct InMemoryRateTable {
    rows: RwLock<Vec<RateRangeConfig>>,
    next_id: AtomicU64,
}

impl InMemoryRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a new row, stamping id and audit fields.
    pub fn save(
        &self,
        draft: RateRangeDraft,
        actor: &str,
    ) -> Result<RateRangeConfig, RateRangeValidationError> {
        draft.validate()?;

        let now = Utc::now();
        let row = RateRangeConfig {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            lender: draft.lender,
            cibil_min: draft.cibil_min,
            cibil_max: draft.cibil_max,
            amount_min: draft.amount_min,
            amount_max: draft.amount_max,
            rate_salaried: draft.rate_salaried,
            rate_non_salaried: draft.rate_non_salaried,
            processing_fee: draft.processing_fee,
            active: draft.active,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.write_rows().push(row.clone());
        Ok(row)
    }

    /// Marks a row inactive so a replacement can supersede it. Returns false for unknown ids.
    pub fn deactivate(&self, id: u64) -> bool {
        let mut rows = self.write_rows();
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.active = false;
                row.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.read_rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Small two-lender table used by demos and when no CSV export is configured.
    pub fn seeded() -> Self {
        let table = Self::new();
        if let Err(err) = loader::load_rows_into(&table, SEED_ROWS.as_bytes(), "seed") {
            tracing::error!(error = %err, "seed rate table rejected");
        }
        table
    }

    fn read_rows(&self) -> std::sync::RwLockReadGuard<'_, Vec<RateRangeConfig>> {
        self.rows.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_rows(&self) -> std::sync::RwLockWriteGuard<'_, Vec<RateRangeConfig>> {
        self.rows.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RateTable for InMemoryRateTable {
    fn active_ranges(&self, lender: Lender) -> Result<Vec<RateRangeConfig>, RateTableError> {
        Ok(self
            .read_rows()
            .iter()
            .filter(|row| row.active && row.lender == lender)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RateRangeDraft {
        RateRangeDraft {
            lender: Lender::LenderA,
            cibil_min: 700,
            cibil_max: 800,
            amount_min: 0.0,
            amount_max: 5_000_000.0,
            rate_salaried: 8.5,
            rate_non_salaried: 8.9,
            processing_fee: None,
            active: true,
        }
    }

    #[test]
    fn validation_rejects_inverted_and_out_of_bounds_ranges() {
        let mut inverted = draft();
        inverted.cibil_min = 800;
        assert!(matches!(
            inverted.validate(),
            Err(RateRangeValidationError::InvertedCibilRange { .. })
        ));

        let mut out_of_bounds = draft();
        out_of_bounds.cibil_max = 950;
        assert!(matches!(
            out_of_bounds.validate(),
            Err(RateRangeValidationError::CibilOutOfBounds { .. })
        ));

        let mut amounts = draft();
        amounts.amount_min = 5_000_000.0;
        assert!(matches!(
            amounts.validate(),
            Err(RateRangeValidationError::InvertedAmountRange { .. })
        ));

        let mut negative_rate = draft();
        negative_rate.rate_non_salaried = -1.0;
        assert_eq!(
            negative_rate.validate(),
            Err(RateRangeValidationError::InvalidRate {
                field: "rate_non_salaried",
                value: -1.0
            })
        );
    }

    #[test]
    fn deactivated_rows_are_hidden_from_readers() {
        let table = InMemoryRateTable::new();
        let row = table.save(draft(), "ops").expect("valid draft");
        assert_eq!(row.created_by, "ops");
        let active = table.active_ranges(Lender::LenderA).expect("readable");
        assert_eq!(active.len(), 1);

        assert!(table.deactivate(row.id));
        let active = table.active_ranges(Lender::LenderA).expect("readable");
        assert!(active.is_empty());
        assert!(!table.deactivate(9_999));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn seeded_table_covers_both_lenders() {
        let table = InMemoryRateTable::seeded();
        for lender in Lender::ALL {
            assert!(!table.active_ranges(lender).expect("readable").is_empty());
        }
        assert_eq!(table.len(), 9);

        let lender_a = table.active_ranges(Lender::LenderA).expect("readable");
        assert!(lender_a.iter().all(|row| row.created_by == "seed"));
        assert_eq!(lender_a[4].processing_fee, None);
    }
}
