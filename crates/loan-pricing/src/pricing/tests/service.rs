use super::common::*;
use crate::config::PricingConfig;
use crate::pricing::domain::{EmploymentClass, Lender, LoanApplication, PropertyRecord};
use crate::pricing::lenders::LenderACalculator;
use crate::pricing::offers::{OfferStore, OfferStoreError};
use crate::pricing::service::PricingServiceError;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn household_is_priced_for_every_lender() {
    let service = service_with(Arc::new(ScriptedOfferStore::default()));
    let offers = service.price_application(
        &applicant_id("app-100"),
        &household_application(),
        pricing_date(),
    );

    assert_eq!(offers.len(), 2);
    let lender_a = offers
        .iter()
        .find(|offer| offer.lender == Lender::LenderA)
        .expect("lender A priced");
    assert_eq!(lender_a.considered_property_value, 11_700_000.0);
    assert_eq!(lender_a.ltv_percent, 75.0);
    assert_eq!(lender_a.applicant_tenure_years, 29);
    assert_eq!(lender_a.co_applicant_tenure_years, 29);
    assert!(lender_a.loan_eligibility > 0.0);
    assert!(
        lender_a.loan_eligibility
            <= 11_700_000.0 * LenderACalculator::ltv_percent(11_700_000.0) / 100.0
    );
    assert_eq!(
        lender_a.own_contribution,
        lender_a.considered_property_value - lender_a.loan_eligibility
    );

    let lender_b = offers
        .iter()
        .find(|offer| offer.lender == Lender::LenderB)
        .expect("lender B priced");
    assert_eq!(lender_b.considered_property_value, 10_700_000.0);
    assert_eq!(lender_b.applicant_tenure_years, 30);
    assert_eq!(lender_b.employment_class, EmploymentClass::Salaried);
}

#[test]
fn stored_offers_are_preferred_over_recomputation() {
    let store = Arc::new(ScriptedOfferStore::default());
    let service = service_with(store.clone());
    let id = applicant_id("app-200");

    let first = service
        .offers(&id, &household_application())
        .expect("priced and stored");
    assert_eq!(store.writes(), 1);

    // Upstream inputs changed, but without a recompute trigger the stored set wins.
    let mut changed = household_application();
    changed.applicant.gross_salary = Some(250_000.0);
    let second = service.offers(&id, &changed).expect("served from store");

    assert_eq!(store.writes(), 1);
    assert_eq!(first, second);
}

#[test]
fn reprice_replaces_the_stored_set() {
    let store = Arc::new(ScriptedOfferStore::default());
    let service = service_with(store.clone());
    let id = applicant_id("app-300");

    let before = service
        .offers(&id, &household_application())
        .expect("priced");

    let mut changed = household_application();
    changed.co_applicant = None;
    let after = service.reprice(&id, &changed).expect("repriced");

    assert_eq!(store.writes(), 2);
    assert_eq!(after.len(), 2);
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(old.lender, new.lender);
        assert!(new.loan_eligibility <= old.loan_eligibility);
        assert_eq!(new.co_applicant_emi, 0.0);
    }
    assert_eq!(store.active_offers(&id).expect("readable"), after);
}

#[test]
fn persistence_outage_surfaces_as_offer_not_saved() {
    let store = Arc::new(ScriptedOfferStore::default());
    let service = service_with(store.clone());
    let id = applicant_id("app-400");

    let original = service
        .offers(&id, &household_application())
        .expect("priced");

    store.set_offline(true);
    match service.reprice(&id, &household_application()) {
        Err(err @ PricingServiceError::OfferNotSaved(OfferStoreError::Unavailable(_))) => {
            assert!(err.is_retryable());
        }
        other => panic!("expected offer-not-saved, got {other:?}"),
    }

    store.set_offline(false);
    assert_eq!(service.stored_offers(&id).expect("readable"), original);
}

#[test]
fn missing_upstream_data_still_yields_offers() {
    let service = service_with(Arc::new(ScriptedOfferStore::default()));
    let empty = LoanApplication::default();

    let offers = service
        .offers(&applicant_id("app-500"), &empty)
        .expect("degenerate offers stored");

    assert_eq!(offers.len(), 2);
    for offer in offers {
        assert_eq!(offer.loan_eligibility, 0.0);
        assert_eq!(offer.total_emi, 0.0);
        assert_eq!(offer.interest_rate.split('.').nth(1).map(str::len), Some(2));
    }
}

#[test]
fn concurrent_requests_for_one_applicant_price_once() {
    let store = Arc::new(ScriptedOfferStore::default());
    let service = Arc::new(service_with(store.clone()));
    let id = applicant_id("app-600");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let id = id.clone();
            thread::spawn(move || service.offers(&id, &household_application()))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes").expect("offers"))
        .collect();

    assert_eq!(store.writes(), 1);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn rate_quote_is_a_pure_read() {
    let store = Arc::new(ScriptedOfferStore::default());
    let service = service_with(store.clone());

    let quote = service.quote_rate(Lender::LenderA, 780, 2_000_000.0, EmploymentClass::Salaried);
    assert_eq!(quote.rate_percent, 8.50);
    assert!(!quote.is_default);

    let fallback = service.quote_rate(
        Lender::LenderA,
        780,
        500_000_000.0,
        EmploymentClass::Salaried,
    );
    assert!(fallback.is_default);
    assert_eq!(fallback.rate_percent, 8.8);

    assert_eq!(store.writes(), 0);
}

#[test]
fn unset_property_value_uses_sentinel() {
    let service = service_with(Arc::new(ScriptedOfferStore::default()));
    let mut application = household_application();
    application.property = PropertyRecord::default();

    let offers = service.price_application(&applicant_id("app-700"), &application, pricing_date());
    let lender_a = &offers[0];
    assert_eq!(lender_a.lender, Lender::LenderA);
    assert_eq!(lender_a.considered_property_value, 999_999_999.0);
    let ltv_cap = lender_a.considered_property_value * 0.75;
    assert!(lender_a.loan_eligibility < ltv_cap);
}

#[test]
fn write_past_the_store_timeout_is_not_committed() {
    let store = Arc::new(ScriptedOfferStore::default());
    let service = service_with_config(
        store.clone(),
        PricingConfig {
            store_timeout: Duration::ZERO,
            ..PricingConfig::default()
        },
    );
    let id = applicant_id("app-800");

    match service.reprice(&id, &household_application()) {
        Err(err @ PricingServiceError::OfferNotSaved(OfferStoreError::Timeout(0))) => {
            assert!(err.is_retryable());
        }
        other => panic!("expected a timed-out write, got {other:?}"),
    }
    assert_eq!(store.writes(), 0);
    assert!(store.active_offers(&id).expect("readable").is_empty());
}

#[test]
fn applicant_locks_do_not_accumulate() {
    let service = service_with(Arc::new(ScriptedOfferStore::default()));

    let application = LoanApplication::default();
    for n in 0..1_000 {
        let id = applicant_id(&format!("app-9{n:03}"));
        service.offers(&id, &application).expect("priced");
    }

    assert_eq!(service.applicants_in_flight(), 0);
}
