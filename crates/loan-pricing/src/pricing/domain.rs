use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;

/// Identifier wrapper for the applicant an offer belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lenders the engine can price against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lender {
    LenderA,
    LenderB,
}

impl Lender {
    pub const ALL: [Lender; 2] = [Lender::LenderA, Lender::LenderB];

    pub fn code(&self) -> &'static str {
        match self {
            Lender::LenderA => "lender_a",
            Lender::LenderB => "lender_b",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Lender::LenderA => "Lender A",
            Lender::LenderB => "Lender B",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_tag(raw).as_str() {
            "lender_a" | "a" => Some(Lender::LenderA),
            "lender_b" | "b" => Some(Lender::LenderB),
            _ => None,
        }
    }
}

impl fmt::Display for Lender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How the applicant earns, which drives income basis, tenure and pricing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentProfile {
    #[default]
    Salaried,
    SelfEmployedProfessional,
    SelfEmployedNonProfessional,
}

impl EmploymentProfile {
    /// Lenient parse of upstream tags; unknown values fall back to salaried.
    pub fn parse(raw: &str) -> Self {
        match normalize_tag(raw).as_str() {
            "self_employed_professional" | "sep" | "professional" => {
                Self::SelfEmployedProfessional
            }
            "self_employed_non_professional" | "self_employed_nonprofessional" | "senp"
            | "self_employed" | "business" => Self::SelfEmployedNonProfessional,
            _ => Self::Salaried,
        }
    }

    pub fn employment_class(&self) -> EmploymentClass {
        match self {
            Self::Salaried => EmploymentClass::Salaried,
            _ => EmploymentClass::NonSalaried,
        }
    }
}

/// Pricing class a rate row distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentClass {
    Salaried,
    NonSalaried,
}

impl EmploymentClass {
    pub fn label(&self) -> &'static str {
        match self {
            EmploymentClass::Salaried => "salaried",
            EmploymentClass::NonSalaried => "non-salaried",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_tag(raw).as_str() {
            "salaried" => Some(EmploymentClass::Salaried),
            "non_salaried" | "nonsalaried" | "self_employed" => Some(EmploymentClass::NonSalaried),
            _ => None,
        }
    }
}

/// Employer categories some lenders special-case when computing tenure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmployerType {
    #[default]
    Ordinary,
    Nri,
    MerchantNavy,
}

impl EmployerType {
    pub fn parse(raw: &str) -> Self {
        match normalize_tag(raw).as_str() {
            "nri" => Self::Nri,
            "merchant_navy" | "merchantnavy" => Self::MerchantNavy,
            _ => Self::Ordinary,
        }
    }
}

/// Income record as captured by the application form; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub employer_type: Option<String>,
    #[serde(default)]
    pub gross_salary: Option<f64>,
    #[serde(default)]
    pub net_salary: Option<f64>,
    #[serde(default)]
    pub gross_annual_profit: Option<f64>,
    #[serde(default)]
    pub existing_obligations_total: Option<f64>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Borrower view the calculators consume. Used for both applicant and co-applicant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub age: u32,
    pub profile: EmploymentProfile,
    pub employer_type: EmployerType,
    pub gross_monthly_salary: f64,
    pub gross_annual_profit: f64,
    pub existing_monthly_obligation: f64,
}

impl Applicant {
    /// Builds the borrower view, substituting zeros for anything upstream left out.
    pub fn from_record(record: &IncomeRecord, today: NaiveDate) -> Self {
        let profile = record
            .employment_type
            .as_deref()
            .map(EmploymentProfile::parse)
            .unwrap_or_default();
        let employer_type = record
            .employer_type
            .as_deref()
            .map(EmployerType::parse)
            .unwrap_or_default();

        let (gross_monthly_salary, gross_annual_profit) = match profile {
            EmploymentProfile::Salaried => (non_negative(record.gross_salary), 0.0),
            _ => (0.0, non_negative(record.gross_annual_profit)),
        };

        Self {
            age: record
                .date_of_birth
                .map(|dob| age_on(dob, today))
                .unwrap_or(0),
            profile,
            employer_type,
            gross_monthly_salary,
            gross_annual_profit,
            existing_monthly_obligation: non_negative(record.existing_obligations_total),
        }
    }

    /// Gross salary for salaried borrowers, otherwise annual profit spread over twelve months.
    pub fn monthly_income(&self) -> f64 {
        match self.profile {
            EmploymentProfile::Salaried => self.gross_monthly_salary,
            _ => self.gross_annual_profit / 12.0,
        }
    }
}

fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Construction stage of the property being financed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    ReadyToMove,
    Resale,
    UnderConstruction,
}

impl PropertyStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize_tag(raw).as_str() {
            "under_construction" | "uc" => Self::UnderConstruction,
            "resale" => Self::Resale,
            _ => Self::ReadyToMove,
        }
    }
}

/// GST on the agreement, either as a percentage or an absolute amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum GstCharge {
    Percent(f64),
    Amount(f64),
}

impl GstCharge {
    pub fn amount_on(&self, agreement_value: f64) -> f64 {
        match *self {
            GstCharge::Percent(percent) => agreement_value * percent / 100.0,
            GstCharge::Amount(amount) => amount,
        }
        .max(0.0)
    }
}

impl Default for GstCharge {
    fn default() -> Self {
        GstCharge::Amount(0.0)
    }
}

/// Property record as captured upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(default)]
    pub agreement_value: Option<f64>,
    #[serde(default)]
    pub gst: Option<GstCharge>,
    #[serde(default)]
    pub other_charges: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub agreement_value: f64,
    pub gst: GstCharge,
    pub other_charges: f64,
    pub status: PropertyStatus,
}

impl Property {
    /// Missing or non-positive agreement values become the configured sentinel.
    pub fn from_record(record: &PropertyRecord, config: &PricingConfig) -> Self {
        let agreement_value = record
            .agreement_value
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(config.unset_property_value);

        Self {
            agreement_value,
            gst: record.gst.unwrap_or_default(),
            other_charges: non_negative(record.other_charges),
            status: record
                .status
                .as_deref()
                .map(PropertyStatus::parse)
                .unwrap_or_default(),
        }
    }

    pub fn gst_amount(&self) -> f64 {
        self.gst.amount_on(self.agreement_value)
    }
}

/// Everything one pricing request needs, as handed over by the application workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub applicant: IncomeRecord,
    #[serde(default)]
    pub co_applicant: Option<IncomeRecord>,
    pub property: PropertyRecord,
}

/// Computed offer for one (applicant, lender) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOffer {
    pub applicant_id: ApplicantId,
    pub lender: Lender,
    pub loan_eligibility: f64,
    pub applicant_emi: f64,
    pub co_applicant_emi: f64,
    pub total_emi: f64,
    pub applicant_tenure_years: u32,
    pub co_applicant_tenure_years: u32,
    /// Applied rate formatted with two decimals, e.g. `"8.80"`.
    pub interest_rate: String,
    pub rate_is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_fee: Option<f64>,
    pub cibil_score: u16,
    pub employment_class: EmploymentClass,
    pub considered_property_value: f64,
    pub ltv_percent: f64,
    pub own_contribution: f64,
    pub computed_at: DateTime<Utc>,
}

fn normalize_tag(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
    }

    #[test]
    fn parses_upstream_tags_leniently() {
        assert_eq!(
            EmploymentProfile::parse("Self-Employed Professional"),
            EmploymentProfile::SelfEmployedProfessional
        );
        assert_eq!(
            EmploymentProfile::parse("SENP"),
            EmploymentProfile::SelfEmployedNonProfessional
        );
        assert_eq!(EmploymentProfile::parse("???"), EmploymentProfile::Salaried);
        assert_eq!(
            EmployerType::parse("Merchant Navy"),
            EmployerType::MerchantNavy
        );
        assert_eq!(
            PropertyStatus::parse("under-construction"),
            PropertyStatus::UnderConstruction
        );
        assert_eq!(Lender::parse("Lender-B"), Some(Lender::LenderB));
    }

    #[test]
    fn employment_class_rejects_unknown_labels() {
        assert_eq!(
            EmploymentClass::parse("Salaried"),
            Some(EmploymentClass::Salaried)
        );
        assert_eq!(
            EmploymentClass::parse("non-salaried"),
            Some(EmploymentClass::NonSalaried)
        );
        assert_eq!(
            EmploymentClass::parse(EmploymentClass::NonSalaried.label()),
            Some(EmploymentClass::NonSalaried)
        );
        assert_eq!(EmploymentClass::parse("salary"), None);
        assert_eq!(EmploymentClass::parse(""), None);
    }

    #[test]
    fn applicant_keeps_only_the_income_matching_the_profile() {
        let record = IncomeRecord {
            employment_type: Some("salaried".to_string()),
            gross_salary: Some(85_000.0),
            gross_annual_profit: Some(1_200_000.0),
            existing_obligations_total: Some(21_000.0),
            date_of_birth: NaiveDate::from_ymd_opt(1994, 6, 16),
            ..IncomeRecord::default()
        };

        let applicant = Applicant::from_record(&record, today());
        assert_eq!(applicant.age, 30);
        assert_eq!(applicant.gross_monthly_salary, 85_000.0);
        assert_eq!(applicant.gross_annual_profit, 0.0);
        assert_eq!(applicant.monthly_income(), 85_000.0);
    }

    #[test]
    fn missing_income_fields_become_zero() {
        let applicant = Applicant::from_record(&IncomeRecord::default(), today());
        assert_eq!(applicant, Applicant::default());
        assert_eq!(applicant.monthly_income(), 0.0);
    }

    #[test]
    fn unset_agreement_value_uses_configured_sentinel() {
        let config = PricingConfig::default();
        let property = Property::from_record(
            &PropertyRecord {
                agreement_value: Some(0.0),
                ..PropertyRecord::default()
            },
            &config,
        );
        assert_eq!(property.agreement_value, config.unset_property_value);
        assert_eq!(property.status, PropertyStatus::ReadyToMove);
        assert_eq!(property.gst_amount(), 0.0);
    }

    #[test]
    fn gst_percent_is_applied_to_agreement_value() {
        assert_eq!(GstCharge::Percent(5.0).amount_on(10_000_000.0), 500_000.0);
        let flat = GstCharge::Amount(42_000.0);
        assert_eq!(flat.amount_on(10_000_000.0), 42_000.0);
    }
}
