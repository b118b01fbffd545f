use super::{BankEligibilityCalculator, BorrowerCapacity, EligibilityBreakdown};
use crate::pricing::domain::{Applicant, EmploymentProfile, Lender, Property};

const NET_INCOME_PROXY: f64 = 0.96;
const RETIREMENT_AGE: u32 = 70;
const MAX_TENURE_YEARS: u32 = 30;
const COST_SHEET_FUNDING: f64 = 0.90;

/// Net-income FOIR, cost-sheet and market-value caps.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenderBCalculator;

impl LenderBCalculator {
    /// Salaried income is netted at 96% of gross; business income is taken as is.
    pub fn net_monthly_income(applicant: &Applicant) -> f64 {
        match applicant.profile {
            EmploymentProfile::Salaried => applicant.gross_monthly_salary * NET_INCOME_PROXY,
            _ => applicant.monthly_income(),
        }
    }

    pub fn foir(net_monthly_income: f64) -> f64 {
        if net_monthly_income <= 30_000.0 {
            0.55
        } else if net_monthly_income <= 50_000.0 {
            0.60
        } else if net_monthly_income <= 100_000.0 {
            0.65
        } else {
            0.70
        }
    }

    pub fn tenure_years(applicant: &Applicant) -> u32 {
        RETIREMENT_AGE
            .saturating_sub(applicant.age)
            .min(MAX_TENURE_YEARS)
    }

    pub fn cost_sheet_value(property: &Property) -> f64 {
        property.agreement_value + property.gst_amount() + property.other_charges
    }

    pub fn market_ltv_percent(market_value: f64) -> f64 {
        if market_value <= 3_000_000.0 {
            90.0
        } else if market_value <= 10_000_000.0 {
            80.0
        } else {
            75.0
        }
    }

    fn assess(applicant: &Applicant, rate_percent: f64) -> BorrowerCapacity {
        let income = Self::net_monthly_income(applicant);
        BorrowerCapacity::assess(
            income,
            Self::foir(income),
            applicant.existing_monthly_obligation,
            Self::tenure_years(applicant),
            rate_percent,
        )
    }
}

impl BankEligibilityCalculator for LenderBCalculator {
    fn lender(&self) -> Lender {
        Lender::LenderB
    }

    fn compute_eligibility(
        &self,
        applicant: &Applicant,
        co_applicant: Option<&Applicant>,
        property: &Property,
        rate_percent: f64,
    ) -> EligibilityBreakdown {
        let cost_sheet = Self::cost_sheet_value(property);
        // No independent valuation is available, so market value tracks the cost sheet.
        let market_value = cost_sheet;
        let ltv_percent = Self::market_ltv_percent(market_value);

        let cost_sheet_cap = cost_sheet * COST_SHEET_FUNDING;
        let market_cap = market_value * ltv_percent / 100.0;

        EligibilityBreakdown {
            lender: Lender::LenderB,
            applicant: Self::assess(applicant, rate_percent),
            co_applicant: co_applicant
                .map(|co| Self::assess(co, rate_percent))
                .unwrap_or_default(),
            considered_property_value: cost_sheet,
            ltv_percent,
            property_cap: cost_sheet_cap.min(market_cap),
        }
    }
}
