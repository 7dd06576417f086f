use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use glyco_core::report::chart::{ChartRenderer, NoCharts, RasterChartRenderer};
use glyco_core::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "glyco")]
#[command(about = "Blood-glucose log and report tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log one reading
    Add {
        /// Glucose level
        #[arg(long, allow_hyphen_values = true, required_unless_present = "json")]
        level: Option<f64>,

        /// Display unit (defaults to the configured unit)
        #[arg(long)]
        unit: Option<String>,

        /// Measurement context, e.g. "Fasting" or "After Dinner"
        #[arg(long)]
        context: Option<String>,

        /// Raw ingestion body: {"level": 95, "unit": "mg/dL", "context": "Fasting"}
        #[arg(long, conflicts_with_all = ["level", "unit", "context"])]
        json: Option<String>,
    },

    /// Show the filtered, sorted reading history
    List {
        #[command(flatten)]
        view: ViewArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Export the view as CSV to this file instead of printing it
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show summary figures and per-context averages
    Stats {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Write the printable PDF report
    Report {
        #[command(flatten)]
        view: ViewArgs,

        /// Output file (defaults to the configured report filename)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Leave the chart snapshots out
        #[arg(long)]
        no_charts: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Target file (defaults to the standard config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[derive(Args)]
struct ViewArgs {
    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only these contexts (repeatable)
    #[arg(long = "context")]
    contexts: Vec<String>,

    /// Only these labels (repeatable)
    #[arg(long = "label")]
    labels: Vec<Label>,

    /// Free-text search over context, level and label
    #[arg(long)]
    search: Option<String>,

    /// Click a column header; repeat to cycle ascending, descending, default
    #[arg(long = "sort")]
    sort: Vec<SortKey>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn main() -> ExitCode {
    glyco_core::logging::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_retryable() {
                eprintln!("  The reading store could not be accessed; try again.");
            }
            if e.is_validation() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let mut store = JsonlStore::in_dir(&data_dir);

    match cli.command {
        Commands::Add {
            level,
            unit,
            context,
            json,
        } => cmd_add(&mut store, &config, level, unit, context, json),
        Commands::List {
            view,
            format,
            output,
        } => cmd_list(&store, &view, format, output),
        Commands::Stats { view } => cmd_stats(&store, &view),
        Commands::Report {
            view,
            output,
            no_charts,
        } => cmd_report(&store, &config, &view, output, no_charts),
        Commands::Config { action } => cmd_config(&config, action),
    }
}

fn cmd_add(
    store: &mut JsonlStore,
    config: &Config,
    level: Option<f64>,
    unit: Option<String>,
    context: Option<String>,
    json: Option<String>,
) -> Result<()> {
    let new = match json {
        Some(body) => NewReading::from_json_with_defaults(
            &body,
            &config.readings.default_unit,
            &config.readings.default_context,
        )?,
        None => {
            let level =
                level.ok_or_else(|| Error::Validation("level must be a finite number".into()))?;
            NewReading::new(
                level,
                unit.unwrap_or_else(|| config.readings.default_unit.clone()),
                Context::parse(
                    context
                        .as_deref()
                        .unwrap_or(&config.readings.default_context),
                ),
            )?
        }
    };

    let label = classify(new.level, &new.context);
    let summary = format!("{} {} ({}, {})", new.level, new.unit, new.context, label);
    let id = store.insert(new)?;

    println!("✓ Reading logged: {}", summary);
    println!("  id: {}", id);
    Ok(())
}

/// Load the store into a session and apply the command-line view settings
fn open_view(store: &JsonlStore, args: &ViewArgs) -> Result<ViewSession> {
    let mut session = ViewSession::new(store.fetch_all()?);

    if args.from.is_some() || args.to.is_some() {
        let defaults = session.filter_state().date_range;
        let today = chrono::Local::now().date_naive();
        let start = args
            .from
            .or(defaults.map(|r| r.start))
            .unwrap_or(today);
        let end = args.to.or(defaults.map(|r| r.end)).unwrap_or(today);
        session.set_date_range(start, end);
    }

    if !args.contexts.is_empty() {
        let wanted: HashSet<Context> = args.contexts.iter().map(|c| Context::parse(c)).collect();
        for context in session.available_contexts() {
            if !wanted.contains(&context) {
                session.toggle_context(&context);
            }
        }
    }

    if !args.labels.is_empty() {
        for label in session.available_labels() {
            if !args.labels.contains(&label) {
                session.toggle_label(label);
            }
        }
    }

    if let Some(term) = &args.search {
        session.set_search_term(term.clone());
    }

    for key in &args.sort {
        session.request_sort(*key);
    }

    Ok(session)
}

fn cmd_list(
    store: &JsonlStore,
    args: &ViewArgs,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut session = open_view(store, args)?;

    if let Some(path) = output {
        let count = glyco_core::export::export_csv(&path, session.visible())?;
        println!("✓ Exported {} readings to {}", count, path.display());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let records: Vec<ReadingRecord> =
                session.visible().iter().map(ReadingRecord::from).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputFormat::Csv => {
            glyco_core::export::write_csv(std::io::stdout().lock(), session.visible())?;
        }
        OutputFormat::Table => print_table(&mut session),
    }
    Ok(())
}

fn print_table(session: &mut ViewSession) {
    let sort = *session.sort_state();
    match session.status() {
        ViewStatus::NoReadings => {
            println!("No readings logged yet.");
            return;
        }
        ViewStatus::NoMatches => {
            println!("No readings match the current filters.");
            return;
        }
        ViewStatus::Showing(n) => {
            println!("Showing {} readings (sorted by {} {:?})", n, sort.key, sort.direction);
        }
    }

    println!();
    println!(
        "  {:>4}  {:<10}  {:<5}  {:<20}  {:>14}  {}",
        "S.No", "Date", "Time", "Time of Day", "Sugar Level", "Label"
    );
    for (i, reading) in session.visible().iter().enumerate() {
        println!(
            "  {:>4}  {:<10}  {:<5}  {:<20}  {:>14}  {}",
            i + 1,
            reading.date_string(),
            reading.time_string(),
            reading.context().as_str(),
            format!("{} {}", reading.level_string(), reading.unit()),
            reading.label()
        );
    }
}

fn cmd_stats(store: &JsonlStore, args: &ViewArgs) -> Result<()> {
    let mut session = open_view(store, args)?;

    let Some(summary) = session.summary() else {
        println!("No data for the selected readings.");
        return Ok(());
    };

    println!("Readings: {}", summary.count);
    println!("Average Level: {}", summary.average);
    println!("Highest Level: {}", summary.max);
    println!("Lowest Level: {}", summary.min);
    println!();
    println!("Average by time of day:");
    for group in &session.context_averages() {
        println!(
            "  {:<20}  {:>5}  ({} readings)",
            group.context.as_str(),
            group.average,
            group.count
        );
    }
    Ok(())
}

fn cmd_report(
    store: &JsonlStore,
    config: &Config,
    args: &ViewArgs,
    output: Option<PathBuf>,
    no_charts: bool,
) -> Result<()> {
    let mut session = open_view(store, args)?;

    let today = chrono::Local::now().date_naive();
    let period = session
        .filter_state()
        .date_range
        .unwrap_or_else(|| DateRange::new(today, today));

    let renderer: Box<dyn ChartRenderer> = if no_charts || !config.report.charts {
        Box::new(NoCharts)
    } else {
        Box::new(RasterChartRenderer::default())
    };

    let settings = ReportSettings::from(config.report.clone());
    let document = generate_report(&period, session.visible(), renderer.as_ref(), &settings)?;

    let path = output.unwrap_or_else(|| PathBuf::from(document.filename()));
    document.write_to(&path)?;

    println!(
        "✓ Report written: {} ({} pages, {})",
        path.display(),
        document.page_count(),
        document.mime_type()
    );
    Ok(())
}

fn cmd_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { path, force } => {
            let target = path.clone().unwrap_or_else(Config::default_config_path);
            if target.exists() && !force {
                return Err(Error::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                )));
            }
            let defaults = Config::default();
            match path {
                Some(path) => defaults.save_to(&path)?,
                None => defaults.save()?,
            }
            println!("✓ Config written: {}", target.display());
        }
        ConfigAction::Show => print!("{}", config.to_toml()?),
    }
    Ok(())
}
