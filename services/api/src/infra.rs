use chrono::{Months, NaiveDate};
use loan_pricing::config::PricingConfig;
use loan_pricing::error::AppError;
use loan_pricing::pricing::{load_rate_table_path, InMemoryRateTable};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the configured rate table CSV, falling back to the seeded table.
pub(crate) fn load_rate_table(config: &PricingConfig) -> Result<InMemoryRateTable, AppError> {
    match &config.rate_table_path {
        Some(path) => {
            let table = load_rate_table_path(path)?;
            info!(path = %path.display(), rows = table.len(), "rate table loaded");
            Ok(table)
        }
        None => {
            let table = InMemoryRateTable::seeded();
            info!(rows = table.len(), "using seeded rate table");
            Ok(table)
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Birth date that makes someone exactly `age` years old on `today`.
pub(crate) fn birth_date_for_age(age: u32, today: NaiveDate) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(age.checked_mul(12)?))
}
