use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use super::domain::{
    Applicant, ApplicantId, EmploymentClass, Lender, LoanApplication, LoanOffer, Property,
};
use super::engine::EligibilityEngine;
use super::offers::{OfferStore, OfferStoreError, WriteDeadline};
use super::rates::{RateQuote, RateTable};
use crate::config::PricingConfig;

/// Facade composing the pricing engine with offer persistence.
pub struct PricingService<T, S> {
    engine: EligibilityEngine<T>,
    store: Arc<S>,
    locks: ApplicantLocks,
}

impl<T, S> PricingService<T, S>
where
    T: RateTable + 'static,
    S: OfferStore + 'static,
{
    pub fn new(table: Arc<T>, store: Arc<S>, config: PricingConfig) -> Self {
        Self {
            engine: EligibilityEngine::new(table, config),
            store,
            locks: ApplicantLocks::default(),
        }
    }

    pub fn engine(&self) -> &EligibilityEngine<T> {
        &self.engine
    }

    /// Applicants with a request currently holding or waiting on their lock.
    pub fn applicants_in_flight(&self) -> usize {
        self.locks.len()
    }

    fn write_deadline(&self) -> WriteDeadline {
        WriteDeadline::after(self.engine.config().store_timeout)
    }

    /// Stored offers when present, otherwise a fresh pricing run that is persisted first.
    ///
    /// The store timeout starts counting on entry, so time spent waiting behind
    /// another request for the same applicant counts against the write.
    pub fn offers(
        &self,
        applicant_id: &ApplicantId,
        application: &LoanApplication,
    ) -> Result<Vec<LoanOffer>, PricingServiceError> {
        let deadline = self.write_deadline();
        self.locks.run(applicant_id, || {
            let stored = self
                .store
                .active_offers(applicant_id)
                .map_err(PricingServiceError::StoreRead)?;
            if !stored.is_empty() {
                return Ok(stored);
            }

            self.price_and_store(applicant_id, application, deadline)
        })
    }

    /// Explicit recompute trigger: always reprices and replaces the stored set.
    pub fn reprice(
        &self,
        applicant_id: &ApplicantId,
        application: &LoanApplication,
    ) -> Result<Vec<LoanOffer>, PricingServiceError> {
        let deadline = self.write_deadline();
        self.locks
            .run(applicant_id, || self.price_and_store(applicant_id, application, deadline))
    }

    pub fn stored_offers(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<LoanOffer>, PricingServiceError> {
        self.store
            .active_offers(applicant_id)
            .map_err(PricingServiceError::StoreRead)
    }

    /// Side-effect free rate lookup for what-if consumers.
    pub fn quote_rate(
        &self,
        lender: Lender,
        cibil_score: u16,
        loan_amount: f64,
        employment_class: EmploymentClass,
    ) -> RateQuote {
        self.engine
            .resolver()
            .resolve(lender, cibil_score, loan_amount, employment_class)
    }

    /// Prices every lender without touching the store.
    pub fn price_application(
        &self,
        applicant_id: &ApplicantId,
        application: &LoanApplication,
        today: NaiveDate,
    ) -> Vec<LoanOffer> {
        let applicant = Applicant::from_record(&application.applicant, today);
        let co_applicant = application
            .co_applicant
            .as_ref()
            .map(|record| Applicant::from_record(record, today));
        let property = Property::from_record(&application.property, self.engine.config());

        Lender::ALL
            .iter()
            .map(|lender| {
                self.engine.price_offer(
                    applicant_id,
                    *lender,
                    &applicant,
                    co_applicant.as_ref(),
                    &property,
                )
            })
            .collect()
    }

    fn price_and_store(
        &self,
        applicant_id: &ApplicantId,
        application: &LoanApplication,
        deadline: WriteDeadline,
    ) -> Result<Vec<LoanOffer>, PricingServiceError> {
        let offers = self.price_application(applicant_id, application, Utc::now().date_naive());

        let written = deadline
            .check()
            .and_then(|()| self.store.replace_offers(applicant_id, offers.clone(), deadline));
        match written {
            Ok(()) => {
                info!(%applicant_id, offers = offers.len(), "loan offers replaced");
                Ok(offers)
            }
            Err(err) => {
                error!(%applicant_id, error = %err, "loan offers not saved");
                Err(PricingServiceError::OfferNotSaved(err))
            }
        }
    }
}

/// One mutex per applicant so read → price → replace runs serially for that applicant.
///
/// Entries only live while some request holds or waits on them.
#[derive(Default)]
struct ApplicantLocks {
    inner: Mutex<HashMap<ApplicantId, Arc<Mutex<()>>>>,
}

impl ApplicantLocks {
    fn run<R>(&self, applicant_id: &ApplicantId, work: impl FnOnce() -> R) -> R {
        let lock = self.acquire(applicant_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            work()
        };
        self.release(applicant_id, lock);
        result
    }

    fn acquire(&self, applicant_id: &ApplicantId) -> Arc<Mutex<()>> {
        self.entries()
            .entry(applicant_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release(&self, applicant_id: &ApplicantId, lock: Arc<Mutex<()>>) {
        let mut entries = self.entries();
        // The map's reference plus ours: nobody else is waiting.
        if Arc::strong_count(&lock) == 2 {
            entries.remove(applicant_id);
        }
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<ApplicantId, Arc<Mutex<()>>>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Error raised by the pricing service.
#[derive(Debug, thiserror::Error)]
pub enum PricingServiceError {
    #[error("offer not saved: {0}")]
    OfferNotSaved(#[source] OfferStoreError),
    #[error("stored offers unavailable: {0}")]
    StoreRead(#[source] OfferStoreError),
    #[error("pricing request exceeded {0} ms")]
    Timeout(u128),
    #[error("pricing task failed: {0}")]
    Task(String),
}

impl PricingServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OfferNotSaved(err) | Self::StoreRead(err) => err.is_retryable(),
            Self::Timeout(_) => true,
            Self::Task(_) => false,
        }
    }
}
