//! Loan eligibility and dynamic pricing.
//!
//! Given an applicant, an optional co-applicant and a property, the engine
//! computes each lender's maximum loan, EMI, tenure and applicable interest
//! rate from lender-specific underwriting rules and a tiered rate table, and
//! keeps exactly one active offer per (applicant, lender).

pub mod amortization;
pub mod credit;
pub mod domain;
pub mod engine;
pub mod lenders;
pub mod offers;
pub mod rates;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use credit::{CreditProfile, CreditProfileEstimator};
pub use domain::{
    Applicant, ApplicantId, EmployerType, EmploymentClass, EmploymentProfile, GstCharge,
    IncomeRecord, Lender, LoanApplication, LoanOffer, Property, PropertyRecord, PropertyStatus,
};
pub use engine::EligibilityEngine;
pub use lenders::{
    calculator_for, BankEligibilityCalculator, BorrowerCapacity, EligibilityBreakdown,
    LenderACalculator, LenderBCalculator,
};
pub use offers::{InMemoryOfferStore, OfferStore, OfferStoreError, WriteDeadline};
pub use rates::{
    load_rate_table_csv, load_rate_table_path, InMemoryRateTable, RateQuote, RateRangeConfig,
    RateRangeDraft, RateRangeValidationError, RateResolver, RateTable, RateTableError,
    RateTableLoadError,
};
pub use router::{pricing_router, OffersResponse};
pub use service::{PricingService, PricingServiceError};
