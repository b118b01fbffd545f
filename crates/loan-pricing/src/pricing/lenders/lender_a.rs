use super::{BankEligibilityCalculator, BorrowerCapacity, EligibilityBreakdown};
use crate::pricing::domain::{
    Applicant, EmployerType, EmploymentProfile, Lender, Property, PropertyStatus,
};

const HARD_TENURE_CEILING: u32 = 30;
const UNDER_CONSTRUCTION_LOADING: f64 = 0.10;
const LTV_HIGH_VALUE_FLOOR: f64 = 9_400_000.0;
const LTV_HIGH_VALUE_CEILING: f64 = 9_900_000.0;

/// Gross-income FOIR, considered-value LTV.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenderACalculator;

impl LenderACalculator {
    pub fn foir(gross_monthly_income: f64) -> f64 {
        if gross_monthly_income <= 25_000.0 {
            0.45
        } else if gross_monthly_income <= 50_000.0 {
            0.50
        } else if gross_monthly_income <= 100_000.0 {
            0.55
        } else {
            0.60
        }
    }

    /// Years left before the borrower's retirement age, capped per employment type.
    pub fn tenure_years(applicant: &Applicant) -> u32 {
        let (cap, retirement_age): (u32, u32) =
            match (applicant.employer_type, applicant.profile) {
                (EmployerType::Nri | EmployerType::MerchantNavy, _) => (15, 60),
                (_, EmploymentProfile::SelfEmployedProfessional) => (20, 65),
                (_, EmploymentProfile::SelfEmployedNonProfessional) => (15, 65),
                (_, EmploymentProfile::Salaried) => (30, 60),
            };

        retirement_age
            .saturating_sub(applicant.age)
            .min(cap)
            .min(HARD_TENURE_CEILING)
    }

    /// Agreement value plus GST, other charges and a 10% loading while under construction.
    pub fn considered_value(property: &Property) -> f64 {
        let loading = if property.status == PropertyStatus::UnderConstruction {
            property.agreement_value * UNDER_CONSTRUCTION_LOADING
        } else {
            0.0
        };
        property.agreement_value + property.gst_amount() + loading + property.other_charges
    }

    /// 80% up to 9.4M, 75% above 9.9M, sliding 5 points per 500k in between.
    pub fn ltv_percent(considered_value: f64) -> f64 {
        if considered_value > LTV_HIGH_VALUE_CEILING {
            75.0
        } else if considered_value <= LTV_HIGH_VALUE_FLOOR {
            80.0
        } else {
            80.0 - (considered_value - LTV_HIGH_VALUE_FLOOR) / 500_000.0 * 5.0
        }
    }

    fn assess(applicant: &Applicant, rate_percent: f64) -> BorrowerCapacity {
        let income = applicant.monthly_income();
        BorrowerCapacity::assess(
            income,
            Self::foir(income),
            applicant.existing_monthly_obligation,
            Self::tenure_years(applicant),
            rate_percent,
        )
    }
}

impl BankEligibilityCalculator for LenderACalculator {
    fn lender(&self) -> Lender {
        Lender::LenderA
    }

    fn compute_eligibility(
        &self,
        applicant: &Applicant,
        co_applicant: Option<&Applicant>,
        property: &Property,
        rate_percent: f64,
    ) -> EligibilityBreakdown {
        let considered_property_value = Self::considered_value(property);
        let ltv_percent = Self::ltv_percent(considered_property_value);

        EligibilityBreakdown {
            lender: Lender::LenderA,
            applicant: Self::assess(applicant, rate_percent),
            co_applicant: co_applicant
                .map(|co| Self::assess(co, rate_percent))
                .unwrap_or_default(),
            considered_property_value,
            ltv_percent,
            property_cap: considered_property_value * ltv_percent / 100.0,
        }
    }
}
