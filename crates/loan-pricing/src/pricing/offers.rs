use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::domain::{ApplicantId, Lender, LoanOffer};

/// Persistence for computed offers, keyed by applicant.
///
/// `replace_offers` is the only mutation: the previous set for the applicant is
/// dropped and the new set installed as one unit. Callers never observe a mix.
/// A replacement must not commit once its deadline has passed; the store returns
/// [`OfferStoreError::Timeout`] and keeps the previous set instead.
pub trait OfferStore: Send + Sync {
    fn replace_offers(
        &self,
        applicant_id: &ApplicantId,
        offers: Vec<LoanOffer>,
        deadline: WriteDeadline,
    ) -> Result<(), OfferStoreError>;

    fn active_offers(&self, applicant_id: &ApplicantId) -> Result<Vec<LoanOffer>, OfferStoreError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OfferStoreError {
    #[error("offer store unavailable: {0}")]
    Unavailable(String),
    #[error("offer store call exceeded {0} ms")]
    Timeout(u128),
    #[error("replacement set for {applicant_id} holds more than one {lender} offer")]
    DuplicateLender {
        applicant_id: ApplicantId,
        lender: Lender,
    },
    #[error("offer for {found} cannot be stored under {expected}")]
    ForeignOffer {
        expected: ApplicantId,
        found: ApplicantId,
    },
}

impl OfferStoreError {
    /// Transport failures may succeed on retry; rejected input will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Latest instant at which a replacement may still commit.
#[derive(Debug, Clone, Copy)]
pub struct WriteDeadline {
    at: Option<Instant>,
    budget: Duration,
}

impl WriteDeadline {
    /// Deadline `budget` from now. Budgets too large to represent never expire.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// `Timeout` once the deadline has passed.
    pub fn check(&self) -> Result<(), OfferStoreError> {
        if self.is_expired() {
            Err(OfferStoreError::Timeout(self.budget.as_millis()))
        } else {
            Ok(())
        }
    }
}

/// Checks a replacement set before anything is written.
pub fn validate_replacement(
    applicant_id: &ApplicantId,
    offers: &[LoanOffer],
) -> Result<(), OfferStoreError> {
    let mut seen = BTreeSet::new();
    for offer in offers {
        if &offer.applicant_id != applicant_id {
            return Err(OfferStoreError::ForeignOffer {
                expected: applicant_id.clone(),
                found: offer.applicant_id.clone(),
            });
        }
        if !seen.insert(offer.lender) {
            return Err(OfferStoreError::DuplicateLender {
                applicant_id: applicant_id.clone(),
                lender: offer.lender,
            });
        }
    }
    Ok(())
}

/// Process-local store. The whole map sits behind one mutex, so a replacement is
/// staged outside it and swapped in with a single insert.
#[derive(Debug, Default)]
pub struct InMemoryOfferStore {
    offers: Mutex<HashMap<ApplicantId, Vec<LoanOffer>>>,
}

impl InMemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ApplicantId, Vec<LoanOffer>>>, OfferStoreError>
    {
        self.offers
            .lock()
            .map_err(|_| OfferStoreError::Unavailable("offer store mutex poisoned".to_string()))
    }
}

impl OfferStore for InMemoryOfferStore {
    fn replace_offers(
        &self,
        applicant_id: &ApplicantId,
        mut offers: Vec<LoanOffer>,
        deadline: WriteDeadline,
    ) -> Result<(), OfferStoreError> {
        validate_replacement(applicant_id, &offers)?;
        offers.sort_by_key(|offer| offer.lender);

        let mut guard = self.lock()?;
        deadline.check()?;
        if offers.is_empty() {
            guard.remove(applicant_id);
        } else {
            guard.insert(applicant_id.clone(), offers);
        }
        Ok(())
    }

    fn active_offers(&self, applicant_id: &ApplicantId) -> Result<Vec<LoanOffer>, OfferStoreError> {
        let guard = self.lock()?;
        Ok(guard.get(applicant_id).cloned().unwrap_or_default())
    }
}
