//! Per-lender underwriting rules.
//!
//! Each lender is one [`BankEligibilityCalculator`] implementation. Calculators are
//! pure: the rate is resolved by the caller and passed in, and nothing here does I/O.

mod lender_a;
mod lender_b;

use serde::{Deserialize, Serialize};

use super::amortization::{emi_from_loan, loan_from_emi};
use super::domain::{Applicant, Lender, Property};

pub use lender_a::LenderACalculator;
pub use lender_b::LenderBCalculator;

pub trait BankEligibilityCalculator: Send + Sync {
    fn lender(&self) -> Lender;

    fn compute_eligibility(
        &self,
        applicant: &Applicant,
        co_applicant: Option<&Applicant>,
        property: &Property,
        rate_percent: f64,
    ) -> EligibilityBreakdown;
}

/// Calculator registered for `lender`.
pub fn calculator_for(lender: Lender) -> &'static dyn BankEligibilityCalculator {
    match lender {
        Lender::LenderA => &LenderACalculator,
        Lender::LenderB => &LenderBCalculator,
    }
}

/// Income-side capacity of one borrower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BorrowerCapacity {
    /// Monthly income the lender's FOIR table was applied to.
    pub assessed_income: f64,
    pub foir: f64,
    pub eligible_emi: f64,
    pub tenure_years: u32,
    pub loan: f64,
}

impl BorrowerCapacity {
    pub(crate) fn assess(
        assessed_income: f64,
        foir: f64,
        existing_obligation: f64,
        tenure_years: u32,
        rate_percent: f64,
    ) -> Self {
        let eligible_emi = (assessed_income * foir - existing_obligation).max(0.0);
        Self {
            assessed_income,
            foir,
            eligible_emi,
            tenure_years,
            loan: loan_from_emi(eligible_emi, tenure_years, rate_percent),
        }
    }
}

/// Full working of one lender's eligibility computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityBreakdown {
    pub lender: Lender,
    pub applicant: BorrowerCapacity,
    pub co_applicant: BorrowerCapacity,
    /// Considered value (Lender A) or cost-sheet value (Lender B).
    pub considered_property_value: f64,
    pub ltv_percent: f64,
    /// Tightest property-based cap.
    pub property_cap: f64,
}

impl EligibilityBreakdown {
    pub fn income_loan(&self) -> f64 {
        self.applicant.loan + self.co_applicant.loan
    }

    pub fn eligible_loan(&self) -> f64 {
        self.income_loan().min(self.property_cap).max(0.0)
    }

    /// Monthly installments for the final loan as `(applicant, co_applicant)`.
    ///
    /// When the property cap binds, the loan is shared in proportion to each
    /// borrower's income-based loan and each share is re-amortized over that
    /// borrower's tenure.
    pub fn emi_split(&self, rate_percent: f64) -> (f64, f64) {
        let income_loan = self.income_loan();
        let eligible = self.eligible_loan();
        if income_loan <= 0.0 {
            return (0.0, 0.0);
        }
        if eligible >= income_loan {
            return (self.applicant.eligible_emi, self.co_applicant.eligible_emi);
        }

        let share = |capacity: &BorrowerCapacity| {
            let principal = eligible * capacity.loan / income_loan;
            emi_from_loan(principal, capacity.tenure_years, rate_percent)
        };
        (share(&self.applicant), share(&self.co_applicant))
    }
}
