use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicantId, EmploymentClass, Lender, LoanApplication, LoanOffer};
use super::offers::OfferStore;
use super::rates::RateTable;
use super::service::{PricingService, PricingServiceError};

/// Shared handler state: the service plus the bound on read-only lookups.
///
/// Writes are bounded inside the service, where the store refuses to commit
/// past the deadline, so offer handlers always report the real outcome.
pub struct PricingState<T, S> {
    service: Arc<PricingService<T, S>>,
    read_timeout: Duration,
}

impl<T, S> Clone for PricingState<T, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            read_timeout: self.read_timeout,
        }
    }
}

/// Router builder exposing offer pricing and rate lookup endpoints.
pub fn pricing_router<T, S>(service: Arc<PricingService<T, S>>) -> Router
where
    T: RateTable + 'static,
    S: OfferStore + 'static,
{
    let read_timeout = service.engine().config().store_timeout;
    Router::new()
        .route(
            "/api/v1/applicants/:applicant_id/offers",
            post(offers_handler::<T, S>).get(stored_offers_handler::<T, S>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/offers/recompute",
            post(recompute_handler::<T, S>),
        )
        .route("/api/v1/rates/roi", get(roi_handler::<T, S>))
        .with_state(PricingState {
            service,
            read_timeout,
        })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OffersResponse {
    pub applicant_id: ApplicantId,
    pub offers: Vec<LoanOffer>,
}

#[derive(Debug, Deserialize)]
pub struct RoiQuery {
    pub lender: String,
    pub cibil_score: u16,
    pub loan_amount: f64,
    pub employment_class: String,
}

pub(crate) async fn offers_handler<T, S>(
    State(state): State<PricingState<T, S>>,
    Path(applicant_id): Path<String>,
    Json(application): Json<LoanApplication>,
) -> Response
where
    T: RateTable + 'static,
    S: OfferStore + 'static,
{
    let id = ApplicantId(applicant_id);
    let service = Arc::clone(&state.service);
    let key = id.clone();
    let result = run_blocking(move || service.offers(&key, &application)).await;
    offers_response(id, result)
}

pub(crate) async fn recompute_handler<T, S>(
    State(state): State<PricingState<T, S>>,
    Path(applicant_id): Path<String>,
    Json(application): Json<LoanApplication>,
) -> Response
where
    T: RateTable + 'static,
    S: OfferStore + 'static,
{
    let id = ApplicantId(applicant_id);
    let service = Arc::clone(&state.service);
    let key = id.clone();
    let result = run_blocking(move || service.reprice(&key, &application)).await;
    offers_response(id, result)
}

pub(crate) async fn stored_offers_handler<T, S>(
    State(state): State<PricingState<T, S>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    T: RateTable + 'static,
    S: OfferStore + 'static,
{
    let id = ApplicantId(applicant_id);
    let service = Arc::clone(&state.service);
    let key = id.clone();
    match run_bounded(state.read_timeout, move || service.stored_offers(&key)).await {
        Ok(offers) if offers.is_empty() => {
            let payload = json!({
                "applicant_id": id.0,
                "error": "no offers computed for applicant",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        result => offers_response(id, result),
    }
}

pub(crate) async fn roi_handler<T, S>(
    State(state): State<PricingState<T, S>>,
    Query(query): Query<RoiQuery>,
) -> Response
where
    T: RateTable + 'static,
    S: OfferStore + 'static,
{
    let Some(lender) = Lender::parse(&query.lender) else {
        return bad_request(format!("unknown lender '{}'", query.lender));
    };
    let Some(class) = EmploymentClass::parse(&query.employment_class) else {
        return bad_request(format!("unknown employment class '{}'", query.employment_class));
    };

    let service = Arc::clone(&state.service);
    let (cibil_score, loan_amount) = (query.cibil_score, query.loan_amount);
    let lookup = run_bounded(state.read_timeout, move || {
        Ok(service.quote_rate(lender, cibil_score, loan_amount, class))
    });

    match lookup.await {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn run_blocking<F, R>(work: F) -> Result<R, PricingServiceError>
where
    F: FnOnce() -> Result<R, PricingServiceError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|join| PricingServiceError::Task(join.to_string()))?
}

/// Only for side-effect free work: an abandoned task must not be able to write.
async fn run_bounded<F, R>(timeout: Duration, work: F) -> Result<R, PricingServiceError>
where
    F: FnOnce() -> Result<R, PricingServiceError> + Send + 'static,
    R: Send + 'static,
{
    tokio::time::timeout(timeout, run_blocking(work))
        .await
        .map_err(|_| PricingServiceError::Timeout(timeout.as_millis()))?
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn offers_response(
    applicant_id: ApplicantId,
    result: Result<Vec<LoanOffer>, PricingServiceError>,
) -> Response {
    match result {
        Ok(offers) => (
            StatusCode::OK,
            Json(OffersResponse {
                applicant_id,
                offers,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PricingServiceError) -> Response {
    let retryable = err.is_retryable();
    let status = if retryable {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let payload = json!({
        "error": err.to_string(),
        "retryable": retryable,
    });
    (status, Json(payload)).into_response()
}
