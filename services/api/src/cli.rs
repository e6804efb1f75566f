use crate::commands::{
    run_export, run_reconcile, run_search, run_stats, CatalogArgs, ExportArgs, ReconcileArgs,
    SearchArgs, StatsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use homebuyer_assist::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Homebuyer Assist",
    about = "Match homebuyers to down payment and closing cost assistance programs",
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
    /// List the programs a household qualifies for
    Search(SearchArgs),
    /// Reconcile scraped program feeds into the catalog
    Reconcile(ReconcileArgs),
    /// Print catalog counts by status and source
    Stats(StatsArgs),
    /// Write the catalog review sheet as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => run_search(args),
        Command::Reconcile(args) => run_reconcile(args),
        Command::Stats(args) => run_stats(args),
        Command::Export(args) => run_export(args),
    }
}
