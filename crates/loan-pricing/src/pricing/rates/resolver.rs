use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::{RateRangeConfig, RateTable, RateTableError};
use crate::pricing::domain::{EmploymentClass, Lender};

/// Rate applicable to a (lender, score, amount, class) lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub lender: Lender,
    pub rate_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_fee: Option<f64>,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_id: Option<u64>,
}

/// Picks the single applicable rate row, falling back to a fixed default.
///
/// A missing row is the normal outcome for a sparse table, and an unreachable
/// table is treated the same way after logging; neither surfaces as an error.
pub struct RateResolver<T> {
    table: Arc<T>,
    default_rate_percent: f64,
}

impl<T> RateResolver<T>
where
    T: RateTable,
{
    pub fn new(table: Arc<T>, default_rate_percent: f64) -> Self {
        Self {
            table,
            default_rate_percent,
        }
    }

    pub fn default_rate_percent(&self) -> f64 {
        self.default_rate_percent
    }

    /// Highest CIBIL minimum wins, then highest amount minimum.
    pub fn matching_row(
        &self,
        lender: Lender,
        cibil_score: u16,
        loan_amount: f64,
    ) -> Result<Option<RateRangeConfig>, RateTableError> {
        let mut candidates: Vec<RateRangeConfig> = self
            .table
            .active_ranges(lender)?
            .into_iter()
            .filter(|row| {
                row.active && row.lender == lender && row.covers(cibil_score, loan_amount)
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.cibil_min
                .cmp(&a.cibil_min)
                .then(b.amount_min.total_cmp(&a.amount_min))
        });

        Ok(candidates.into_iter().next())
    }

    pub fn resolve(
        &self,
        lender: Lender,
        cibil_score: u16,
        loan_amount: f64,
        class: EmploymentClass,
    ) -> RateQuote {
        match self.matching_row(lender, cibil_score, loan_amount) {
            Ok(Some(row)) => {
                let rate_percent = match class {
                    EmploymentClass::Salaried => row.rate_salaried,
                    EmploymentClass::NonSalaried => row.rate_non_salaried,
                };
                debug!(
                    lender = lender.code(),
                    cibil_score,
                    loan_amount,
                    class = class.label(),
                    range_id = row.id,
                    rate_percent,
                    "rate row matched"
                );
                RateQuote {
                    lender,
                    rate_percent,
                    processing_fee: row.processing_fee,
                    is_default: false,
                    range_id: Some(row.id),
                }
            }
            Ok(None) => {
                debug!(
                    lender = lender.code(),
                    cibil_score,
                    loan_amount,
                    class = class.label(),
                    "no rate row matched, using default rate"
                );
                self.default_quote(lender)
            }
            Err(err) => {
                warn!(
                    lender = lender.code(),
                    error = %err,
                    "rate table lookup failed, using default rate"
                );
                self.default_quote(lender)
            }
        }
    }

    fn default_quote(&self, lender: Lender) -> RateQuote {
        RateQuote {
            lender,
            rate_percent: self.default_rate_percent,
            processing_fee: None,
            is_default: true,
            range_id: None,
        }
    }
}
