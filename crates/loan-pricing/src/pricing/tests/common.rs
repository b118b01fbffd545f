use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::PricingConfig;
use crate::pricing::domain::{
    ApplicantId, GstCharge, IncomeRecord, LoanApplication, LoanOffer, PropertyRecord,
};
use crate::pricing::offers::{validate_replacement, OfferStore, OfferStoreError, WriteDeadline};
use crate::pricing::rates::InMemoryRateTable;
use crate::pricing::service::PricingService;

pub(super) fn pricing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date")
}

/// Date of birth giving `age` whole years on [`pricing_date`].
pub(super) fn born_years_ago(age: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025 - age, 3, 15).expect("valid date")
}

pub(super) fn salaried(age: i32, gross_salary: f64, obligations: f64) -> IncomeRecord {
    IncomeRecord {
        employment_type: Some("salaried".to_string()),
        employer_type: None,
        gross_salary: Some(gross_salary),
        net_salary: None,
        gross_annual_profit: None,
        existing_obligations_total: Some(obligations),
        date_of_birth: Some(born_years_ago(age)),
    }
}

/// Dual-income household buying an under-construction flat.
pub(super) fn household_application() -> LoanApplication {
    LoanApplication {
        applicant: salaried(31, 85_000.0, 21_000.0),
        co_applicant: Some(salaried(31, 66_000.0, 3_000.0)),
        property: PropertyRecord {
            agreement_value: Some(10_000_000.0),
            gst: Some(GstCharge::Percent(5.0)),
            other_charges: Some(200_000.0),
            status: Some("under_construction".to_string()),
        },
    }
}

pub(super) fn applicant_id(raw: &str) -> ApplicantId {
    ApplicantId(raw.to_string())
}

/// Store double that counts writes and can be switched into an outage.
#[derive(Default)]
pub(super) struct ScriptedOfferStore {
    offers: Mutex<HashMap<ApplicantId, Vec<LoanOffer>>>,
    writes: AtomicUsize,
    offline: AtomicBool,
}

impl ScriptedOfferStore {
    pub(super) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(super) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl OfferStore for ScriptedOfferStore {
    fn replace_offers(
        &self,
        applicant_id: &ApplicantId,
        offers: Vec<LoanOffer>,
        deadline: WriteDeadline,
    ) -> Result<(), OfferStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(OfferStoreError::Unavailable("primary down".to_string()));
        }
        validate_replacement(applicant_id, &offers)?;
        deadline.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.offers
            .lock()
            .expect("store mutex poisoned")
            .insert(applicant_id.clone(), offers);
        Ok(())
    }

    fn active_offers(&self, applicant_id: &ApplicantId) -> Result<Vec<LoanOffer>, OfferStoreError> {
        Ok(self
            .offers
            .lock()
            .expect("store mutex poisoned")
            .get(applicant_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub(super) fn service_with(
    store: Arc<ScriptedOfferStore>,
) -> PricingService<InMemoryRateTable, ScriptedOfferStore> {
    service_with_config(store, PricingConfig::default())
}

pub(super) fn service_with_config(
    store: Arc<ScriptedOfferStore>,
    config: PricingConfig,
) -> PricingService<InMemoryRateTable, ScriptedOfferStore> {
    PricingService::new(Arc::new(InMemoryRateTable::seeded()), store, config)
}
