use crate::infra::{open_catalog, override_catalog_path, reconciler_for};
use chrono::Local;
use clap::Args;
use homebuyer_assist::config::{parse_feed, AppConfig};
use homebuyer_assist::error::AppError;
use homebuyer_assist::programs::{
    export_catalog_csv, write_catalog_csv, ApplicantProfile, ProfileSubmission, ProgramRecord,
    RawCreditScore, RunSummary, SearchIndex, SourceOutcome, Visibility,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Override the configured catalog file
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

impl CatalogArgs {
    fn load_config(self) -> Result<AppConfig, AppError> {
        let mut config = AppConfig::load()?;
        override_catalog_path(&mut config, self.catalog);
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// County code, e.g. montgomery (defaults to any)
    #[arg(long)]
    pub(crate) county: Option<String>,
    /// City code (defaults to any)
    #[arg(long)]
    pub(crate) city: Option<String>,
    /// Annual household income in dollars
    #[arg(long)]
    pub(crate) income: f64,
    /// Number of people in the household
    #[arg(long, default_value_t = 1)]
    pub(crate) household_size: i64,
    /// Credit band (e.g. 640-659, 740-plus, unknown) or a numeric score
    #[arg(long)]
    pub(crate) credit_score: Option<String>,
    #[arg(long)]
    pub(crate) first_time_buyer: bool,
    #[arg(long)]
    pub(crate) currently_own_property: bool,
    #[arg(long)]
    pub(crate) live_in_county: bool,
    #[arg(long)]
    pub(crate) work_in_county: bool,
    #[arg(long)]
    pub(crate) county_employee: bool,
    #[arg(long)]
    pub(crate) student_debt: bool,
    /// Planned stay bucket: less-than-5, 5-10, 10-15, 15-plus, unsure
    #[arg(long)]
    pub(crate) planned_stay: Option<String>,
    #[arg(long)]
    pub(crate) municipality: Option<String>,
    /// Show every visible program with the reason it did or did not match
    #[arg(long)]
    pub(crate) explain: bool,
    /// Include pending and outdated programs
    #[arg(long)]
    pub(crate) include_all: bool,
}

impl SearchArgs {
    fn submission(&self) -> ProfileSubmission {
        ProfileSubmission {
            county: self.county.clone(),
            city: self.city.clone(),
            first_time_buyer: self.first_time_buyer,
            currently_own_property: self.currently_own_property,
            credit_score: self.credit_score.clone().map(RawCreditScore::Label),
            household_income: Some(self.income),
            household_size: Some(self.household_size),
            living_in_county: self.live_in_county,
            working_in_county: self.work_in_county,
            county_employee: self.county_employee,
            student_debt: self.student_debt,
            planned_stay: self.planned_stay.clone(),
            municipality: self.municipality.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReconcileArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Reconcile a single JSON feed given as source-id=path instead of the configured feeds
    #[arg(long)]
    pub(crate) feed: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct StatsArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Destination CSV file; prints to stdout when omitted
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Limit the sheet to publicly visible programs
    #[arg(long)]
    pub(crate) active_only: bool,
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let submission = args.submission();
    let visibility = if args.include_all {
        Visibility::All
    } else {
        Visibility::Active
    };
    let explain = args.explain;
    let config = args.catalog.load_config()?;

    let profile = ApplicantProfile::try_from(submission)?;
    let catalog = open_catalog(&config)?;
    let index = SearchIndex::new(&catalog);

    if explain {
        for verdict in index.explain(&profile, visibility)? {
            let marker = if verdict.result.qualifies { "+" } else { "-" };
            println!(
                "{marker} {:<40} {}",
                verdict.name,
                verdict.result.summary()
            );
        }
        return Ok(());
    }

    let matches = index.search(&profile, visibility)?;
    if matches.is_empty() {
        println!("No programs match this profile.");
        return Ok(());
    }

    println!("{} matching program(s)", matches.len());
    for record in &matches {
        render_program(record);
    }
    Ok(())
}

pub(crate) fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    let mut config = args.catalog.load_config()?;
    if let Some(entry) = args.feed {
        let feed = parse_feed(&entry)?;
        config.reconciliation.feeds = vec![feed];
    }
    if config.reconciliation.feeds.is_empty() {
        println!("No feeds configured; set APP_RECONCILE_FEEDS or pass --feed source-id=path.");
        return Ok(());
    }

    let catalog = open_catalog(&config)?;
    let report = reconciler_for(catalog, &config.reconciliation).run()?;
    render_run(&report);
    Ok(())
}

pub(crate) fn run_stats(args: StatsArgs) -> Result<(), AppError> {
    let config = args.catalog.load_config()?;
    let catalog = open_catalog(&config)?;
    let stats = catalog.stats()?;

    println!(
        "Catalog {} ({})",
        config.catalog.data_path.display(),
        Local::now().format("%Y-%m-%d %H:%M")
    );
    println!("  total:            {}", stats.total);
    println!("  active:           {}", stats.active);
    println!("  pending review:   {}", stats.pending_review);
    println!("  outdated:         {}", stats.outdated);
    println!("  manual entries:   {}", stats.manual_entry);
    println!("  scraped:          {}", stats.scraped);
    println!("  updated (30 days): {}", stats.updated_last_30_days);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = args.catalog.load_config()?;
    let catalog = open_catalog(&config)?;
    let visibility = if args.active_only {
        Visibility::Active
    } else {
        Visibility::All
    };
    let records = catalog.list(visibility)?;

    match args.output {
        Some(path) => {
            export_catalog_csv(&records, &path)?;
            println!("Wrote {} program(s) to {}", records.len(), path.display());
        }
        None => write_catalog_csv(&records, std::io::stdout().lock())?,
    }
    Ok(())
}

fn render_program(record: &ProgramRecord) {
    println!("\n{} [{}]", record.name, record.id);
    if !record.savings.is_empty() {
        println!("  Savings: {}", record.savings);
    }
    for benefit in &record.benefits {
        println!("  + {benefit}");
    }
    for link in &record.links {
        println!("  {}: {}", link.title, link.url);
    }
}

fn render_run(report: &RunSummary) {
    for source in &report.sources {
        match source {
            SourceOutcome::Reconciled { source_id, summary } => println!(
                "{source_id}: {} new, {} updated, {} unchanged, {} outdated, {} rejected",
                summary.new, summary.updated, summary.unchanged, summary.outdated, summary.rejected
            ),
            SourceOutcome::Unavailable { source_id } => {
                println!("{source_id}: no data available, left untouched")
            }
            SourceOutcome::Failed { source_id, error } => println!("{source_id}: failed ({error})"),
        }
    }
    println!(
        "Total: {} new, {} updated, {} unchanged, {} outdated ({} errors, {} unavailable)",
        report.new,
        report.updated,
        report.unchanged,
        report.outdated,
        report.errors,
        report.unavailable
    );
}
