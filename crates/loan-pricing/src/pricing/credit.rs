use serde::{Deserialize, Serialize};

use super::domain::{Applicant, EmploymentClass, EmploymentProfile};

/// Synthetic score and pricing class for one applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditProfile {
    pub cibil_score: u16,
    pub employment_class: EmploymentClass,
}

/// Income-banded stand-in for a bureau score.
///
/// This is a deterministic heuristic used only to pick a rate tier. It is not a
/// credit-risk model and must not be treated as one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditProfileEstimator;

impl CreditProfileEstimator {
    pub fn estimate(&self, applicant: &Applicant) -> CreditProfile {
        let base: u16 = match applicant.profile {
            EmploymentProfile::Salaried => 750,
            _ => 720,
        };

        let income = applicant.monthly_income();
        let cibil_score = if income >= 100_000.0 {
            (base + 30).min(850)
        } else if income >= 75_000.0 {
            (base + 20).min(830)
        } else if income >= 50_000.0 {
            (base + 10).min(810)
        } else if income < 30_000.0 {
            base.saturating_sub(50).max(650)
        } else {
            base
        };

        CreditProfile {
            cibil_score,
            employment_class: applicant.profile.employment_class(),
        }
    }
}
