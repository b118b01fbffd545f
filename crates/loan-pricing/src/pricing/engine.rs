use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::credit::CreditProfileEstimator;
use super::domain::{Applicant, ApplicantId, EmploymentClass, Lender, LoanOffer, Property};
use super::lenders::{calculator_for, BankEligibilityCalculator};
use super::rates::{RateQuote, RateResolver, RateTable};
use crate::config::PricingConfig;

/// Prices one lender's offer for an applicant.
///
/// Rate depends on loan amount and loan amount depends on rate. The engine
/// seeds the rate lookup from income, runs the lender's calculator, and if the
/// result lands far from the seed it re-resolves the rate once and recomputes.
/// The correction runs once; it is not iterated to a fixed point.
pub struct EligibilityEngine<T> {
    resolver: RateResolver<T>,
    estimator: CreditProfileEstimator,
    config: PricingConfig,
}

impl<T> EligibilityEngine<T>
where
    T: RateTable,
{
    pub fn new(table: Arc<T>, config: PricingConfig) -> Self {
        Self {
            resolver: RateResolver::new(table, config.default_rate_percent),
            estimator: CreditProfileEstimator,
            config,
        }
    }

    pub fn resolver(&self) -> &RateResolver<T> {
        &self.resolver
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn price_offer(
        &self,
        applicant_id: &ApplicantId,
        lender: Lender,
        applicant: &Applicant,
        co_applicant: Option<&Applicant>,
        property: &Property,
    ) -> LoanOffer {
        self.price_with(
            calculator_for(lender),
            applicant_id,
            applicant,
            co_applicant,
            property,
        )
    }

    pub fn price_with(
        &self,
        calculator: &dyn BankEligibilityCalculator,
        applicant_id: &ApplicantId,
        applicant: &Applicant,
        co_applicant: Option<&Applicant>,
        property: &Property,
    ) -> LoanOffer {
        let lender = calculator.lender();
        let profile = self.estimator.estimate(applicant);

        let combined_income =
            applicant.monthly_income() + co_applicant.map_or(0.0, Applicant::monthly_income);
        let seed_amount = combined_income * self.config.seed_income_multiplier;

        let mut quote = self.resolver.resolve(
            lender,
            profile.cibil_score,
            seed_amount,
            profile.employment_class,
        );
        let mut breakdown =
            calculator.compute_eligibility(applicant, co_applicant, property, quote.rate_percent);

        let preliminary = breakdown.eligible_loan();
        let divergence = if seed_amount > 0.0 {
            (preliminary - seed_amount).abs() / seed_amount
        } else {
            0.0
        };

        if divergence > self.config.refinement_threshold {
            let refined = self.resolver.resolve(
                lender,
                profile.cibil_score,
                preliminary,
                profile.employment_class,
            );
            debug!(
                lender = lender.code(),
                %applicant_id,
                seed_amount,
                preliminary,
                divergence,
                initial_rate = quote.rate_percent,
                refined_rate = refined.rate_percent,
                "refining rate against preliminary loan"
            );
            breakdown = calculator.compute_eligibility(
                applicant,
                co_applicant,
                property,
                refined.rate_percent,
            );
            quote = refined;
        }

        let eligible_loan = breakdown.eligible_loan();
        let (applicant_emi, co_applicant_emi) = breakdown.emi_split(quote.rate_percent);

        build_offer(
            applicant_id,
            &quote,
            eligible_loan,
            applicant_emi,
            co_applicant_emi,
            breakdown.applicant.tenure_years,
            breakdown.co_applicant.tenure_years,
            profile.cibil_score,
            profile.employment_class,
            breakdown.considered_property_value,
            breakdown.ltv_percent,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn build_offer(
    applicant_id: &ApplicantId,
    quote: &RateQuote,
    eligible_loan: f64,
    applicant_emi: f64,
    co_applicant_emi: f64,
    applicant_tenure_years: u32,
    co_applicant_tenure_years: u32,
    cibil_score: u16,
    employment_class: EmploymentClass,
    considered_property_value: f64,
    ltv_percent: f64,
) -> LoanOffer {
    let loan_eligibility = eligible_loan.round();
    let applicant_emi = applicant_emi.round();
    let co_applicant_emi = co_applicant_emi.round();
    let considered_property_value = considered_property_value.round();

    LoanOffer {
        applicant_id: applicant_id.clone(),
        lender: quote.lender,
        loan_eligibility,
        applicant_emi,
        co_applicant_emi,
        total_emi: applicant_emi + co_applicant_emi,
        applicant_tenure_years,
        co_applicant_tenure_years,
        interest_rate: format!("{:.2}", quote.rate_percent),
        rate_is_default: quote.is_default,
        processing_fee: quote.processing_fee,
        cibil_score,
        employment_class,
        considered_property_value,
        ltv_percent: (ltv_percent * 100.0).round() / 100.0,
        own_contribution: considered_property_value - loan_eligibility,
        computed_at: Utc::now(),
    }
}
