use crate::demo::{run_quote, run_roi, QuoteArgs, RoiArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_pricing::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Pricing Engine",
    about = "Price home-loan offers and look up lender rates from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a one-off application against every lender
    Quote(QuoteArgs),
    /// Look up the rate a lender applies to a score and amount
    Roi(RoiArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::Roi(args) => run_roi(args),
    }
}
