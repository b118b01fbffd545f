use crate::infra::{birth_date_for_age, load_rate_table, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use loan_pricing::config::AppConfig;
use loan_pricing::error::AppError;
use loan_pricing::pricing::{
    ApplicantId, EmploymentClass, GstCharge, InMemoryOfferStore, IncomeRecord, Lender,
    LoanApplication, LoanOffer, PricingService, PropertyRecord, RateQuote,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Only show the offer from this lender (lender_a, lender_b)
    #[arg(long, value_parser = parse_lender)]
    pub(crate) lender: Option<Lender>,
    /// Applicant employment type (salaried, self-employed-professional, ...)
    #[arg(long, default_value = "salaried")]
    pub(crate) employment_type: String,
    /// Applicant gross monthly salary
    #[arg(long)]
    pub(crate) salary: Option<f64>,
    /// Applicant gross annual profit (self-employed)
    #[arg(long)]
    pub(crate) annual_profit: Option<f64>,
    /// Applicant age in years
    #[arg(long)]
    pub(crate) age: u32,
    /// Applicant existing monthly obligations
    #[arg(long, default_value_t = 0.0)]
    pub(crate) obligation: f64,
    /// Co-applicant employment type
    #[arg(long, default_value = "salaried")]
    pub(crate) co_employment_type: String,
    /// Co-applicant gross monthly salary; adds a co-applicant when given
    #[arg(long)]
    pub(crate) co_salary: Option<f64>,
    /// Co-applicant gross annual profit; adds a co-applicant when given
    #[arg(long)]
    pub(crate) co_annual_profit: Option<f64>,
    /// Co-applicant age in years (defaults to the applicant's)
    #[arg(long)]
    pub(crate) co_age: Option<u32>,
    /// Co-applicant existing monthly obligations
    #[arg(long, default_value_t = 0.0)]
    pub(crate) co_obligation: f64,
    /// Property agreement value; omitted means unset
    #[arg(long)]
    pub(crate) agreement_value: Option<f64>,
    /// GST as a percentage of the agreement value
    #[arg(long, conflicts_with = "gst_amount")]
    pub(crate) gst_percent: Option<f64>,
    /// GST as an absolute amount
    #[arg(long)]
    pub(crate) gst_amount: Option<f64>,
    /// Registration, stamp duty and other charges
    #[arg(long, default_value_t = 0.0)]
    pub(crate) other_charges: f64,
    /// Property status (ready_to_move, under_construction, resale)
    #[arg(long, default_value = "ready_to_move")]
    pub(crate) status: String,
    /// Pricing date used to derive ages (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print offers as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RoiArgs {
    /// Lender to quote (lender_a, lender_b)
    #[arg(long, value_parser = parse_lender)]
    pub(crate) lender: Lender,
    /// CIBIL score, 300-900
    #[arg(long)]
    pub(crate) cibil_score: u16,
    /// Requested loan amount
    #[arg(long)]
    pub(crate) loan_amount: f64,
    /// Employment class (salaried, non-salaried)
    #[arg(long, default_value = "salaried", value_parser = parse_employment_class)]
    pub(crate) employment_class: EmploymentClass,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = PricingService::new(
        Arc::new(load_rate_table(&config.pricing)?),
        Arc::new(InMemoryOfferStore::new()),
        config.pricing,
    );

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let application = quote_application(&args, today);
    let offers: Vec<LoanOffer> = service
        .price_application(&ApplicantId("cli-quote".to_string()), &application, today)
        .into_iter()
        .filter(|offer| args.lender.map_or(true, |lender| offer.lender == lender))
        .collect();

    if args.json {
        match serde_json::to_string_pretty(&offers) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Offer payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Loan offers as of {today}");
    for offer in &offers {
        render_offer(offer);
    }

    Ok(())
}

pub(crate) fn run_roi(args: RoiArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = PricingService::new(
        Arc::new(load_rate_table(&config.pricing)?),
        Arc::new(InMemoryOfferStore::new()),
        config.pricing,
    );

    let class = args.employment_class;
    let quote = service.quote_rate(args.lender, args.cibil_score, args.loan_amount, class);
    render_quote(&quote, args.cibil_score, args.loan_amount, class);
    Ok(())
}

fn parse_lender(raw: &str) -> Result<Lender, String> {
    Lender::parse(raw)
        .ok_or_else(|| format!("unknown lender '{raw}' (expected lender_a or lender_b)"))
}

fn parse_employment_class(raw: &str) -> Result<EmploymentClass, String> {
    EmploymentClass::parse(raw)
        .ok_or_else(|| format!("unknown employment class '{raw}'"))
}

fn quote_application(args: &QuoteArgs, today: NaiveDate) -> LoanApplication {
    let applicant = IncomeRecord {
        employment_type: Some(args.employment_type.clone()),
        gross_salary: args.salary,
        gross_annual_profit: args.annual_profit,
        existing_obligations_total: Some(args.obligation),
        date_of_birth: birth_date_for_age(args.age, today),
        ..IncomeRecord::default()
    };

    let co_applicant = if args.co_salary.is_some() || args.co_annual_profit.is_some() {
        Some(IncomeRecord {
            employment_type: Some(args.co_employment_type.clone()),
            gross_salary: args.co_salary,
            gross_annual_profit: args.co_annual_profit,
            existing_obligations_total: Some(args.co_obligation),
            date_of_birth: birth_date_for_age(args.co_age.unwrap_or(args.age), today),
            ..IncomeRecord::default()
        })
    } else {
        None
    };

    let gst = match (args.gst_percent, args.gst_amount) {
        (Some(percent), _) => Some(GstCharge::Percent(percent)),
        (None, Some(amount)) => Some(GstCharge::Amount(amount)),
        (None, None) => None,
    };

    LoanApplication {
        applicant,
        co_applicant,
        property: PropertyRecord {
            agreement_value: args.agreement_value,
            gst,
            other_charges: Some(args.other_charges),
            status: Some(args.status.clone()),
        },
    }
}

fn render_offer(offer: &LoanOffer) {
    println!("\n{}", offer.lender.display_name());
    println!(
        "- Eligible loan {:.0} at {}%{}",
        offer.loan_eligibility,
        offer.interest_rate,
        if offer.rate_is_default {
            " (default rate)"
        } else {
            ""
        }
    );
    println!(
        "- EMI {:.0} total | applicant {:.0} over {} yrs | co-applicant {:.0} over {} yrs",
        offer.total_emi,
        offer.applicant_emi,
        offer.applicant_tenure_years,
        offer.co_applicant_emi,
        offer.co_applicant_tenure_years
    );
    println!(
        "- Property value considered {:.0} | LTV {:.2}% | own contribution {:.0}",
        offer.considered_property_value, offer.ltv_percent, offer.own_contribution
    );
    println!(
        "- Estimated CIBIL {} ({})",
        offer.cibil_score,
        offer.employment_class.label()
    );
    if let Some(fee) = offer.processing_fee {
        println!("- Processing fee {fee:.0}");
    }
}

fn render_quote(quote: &RateQuote, cibil_score: u16, loan_amount: f64, class: EmploymentClass) {
    println!(
        "{} rate for CIBIL {} / amount {:.0} / {}: {:.2}%",
        quote.lender.display_name(),
        cibil_score,
        loan_amount,
        class.label(),
        quote.rate_percent
    );
    match quote.range_id {
        Some(id) => println!("- Matched rate range #{id}"),
        None => println!("- No active range matched; default rate applied"),
    }
    if let Some(fee) = quote.processing_fee {
        println!("- Processing fee {fee:.0}");
    }
}
