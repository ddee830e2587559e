//! Soft-label core - EM soft labeling for three-annotator MBTI data
//!
//! The main entry point for sl-core, handling:
//! - Fitting per-dimension soft-label tables
//! - Writing soft and hard labels back onto a dataset
//! - Evaluating predicted soft labels against a reference
//! - Settings inspection and validation

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sl_common::{format_error_human, Dimension, Error, OutputFormat, Result, StructuredError};
use sl_config::{validate::validate_settings, Settings, CONFIG_SCHEMA_VERSION};
use sl_core::config::{self, config_error, EffectiveSettings, EmOverrides};
use sl_core::dataset::{label_records, write_jsonl, Dataset};
use sl_core::evaluate::evaluate;
use sl_core::exit_codes::ExitCode;
use sl_core::inference::{fit_dimension, DimensionFit};
use sl_core::log_event;
use sl_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use sl_core::output::{self, EvaluateReport, FitReport, LabelReport, OUTPUT_SCHEMA_VERSION};

/// Soft-label core - EM soft labels from three annotators
#[derive(Parser)]
#[command(name = "sl-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Settings file (overrides the search path)
    #[arg(long, global = true, env = "SOFTLABEL_SETTINGS")]
    settings: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit soft-label tables and print them
    Fit(FitArgs),

    /// Fit, then write soft and hard labels onto every record
    Label(LabelArgs),

    /// Score predicted soft labels against reference soft labels
    Evaluate(EvaluateArgs),

    /// Settings management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// EM options shared by `fit` and `label`.
#[derive(Args, Debug)]
struct EmArgs {
    /// Dimension to fit (repeatable; default all four)
    #[arg(long = "dimension", short = 'd')]
    dimensions: Vec<Dimension>,

    /// Convergence tolerance on the max posterior change
    #[arg(long)]
    tolerance: Option<f64>,

    /// Iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,
}

impl EmArgs {
    fn overrides(&self) -> EmOverrides {
        EmOverrides {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }

    fn selected(&self) -> Vec<Dimension> {
        if self.dimensions.is_empty() {
            Dimension::ALL.to_vec()
        } else {
            self.dimensions.clone()
        }
    }
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Annotated dataset (JSONL)
    input: PathBuf,

    #[command(flatten)]
    em: EmArgs,
}

#[derive(Args, Debug)]
struct LabelArgs {
    /// Annotated dataset (JSONL)
    input: PathBuf,

    /// Where to write the labeled dataset
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    em: EmArgs,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Reference dataset with soft labels
    #[arg(long)]
    truth: PathBuf,

    /// Predicted dataset with soft labels
    #[arg(long)]
    pred: PathBuf,

    /// Dimension to score (repeatable; default all four)
    #[arg(long = "dimension", short = 'd')]
    dimensions: Vec<Dimension>,

    /// Also score a constant predictor equal to the reference mean
    #[arg(long)]
    baseline: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective settings and where they came from
    Show,
    /// Validate a settings file
    Validate {
        /// File to validate (default: the resolved settings file)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let cli_level = LogLevel::from_flags(cli.global.quiet, cli.global.verbose);
    // Machine-readable stdout gets machine-readable stderr.
    let cli_format = cli.global.format.is_machine().then_some(LogFormat::Jsonl);
    init_logging(
        &LogConfig::from_env(cli_level, cli_format).with_color(!cli.global.no_color),
    );

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "run started",
        version = env!("CARGO_PKG_VERSION")
    );

    let result = match &cli.command {
        Commands::Fit(args) => run_fit(&cli.global, args, &ctx),
        Commands::Label(args) => run_label(&cli.global, args, &ctx),
        Commands::Evaluate(args) => run_evaluate(&cli.global, args, &ctx),
        Commands::Config(args) => run_config(&cli.global, args, &ctx),
        Commands::Version => print_version(&cli.global),
    };

    let exit_code = match result {
        Ok(code) => {
            log_event!(
                ctx,
                DEBUG,
                event_names::RUN_FINISHED,
                Stage::Write,
                "run finished",
                exit_code = code.as_i32() as i64
            );
            code
        }
        Err(err) => {
            let code = ExitCode::for_error(&err);
            let message = err.to_string();
            log_event!(
                ctx,
                ERROR,
                event_names::RUN_FAILED,
                Stage::Write,
                "run failed",
                error_code = err.code() as u64,
                error = message.as_str()
            );
            output_error(&cli.global, &ctx, &err);
            code
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn load_settings(global: &GlobalOpts, overrides: EmOverrides, ctx: &LogContext) -> Result<EffectiveSettings> {
    let effective = config::load(global.settings.as_deref(), overrides)?;
    let snapshot = &effective.loaded.snapshot;
    if snapshot.path.is_some() {
        log_event!(
            ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "settings loaded",
            source = snapshot.source.as_str(),
            settings_id = snapshot.short_id(),
            tolerance = effective.em.tolerance,
            max_iterations = effective.em.max_iterations as u64
        );
    } else {
        log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no settings file found, using builtin defaults",
            tolerance = effective.em.tolerance,
            max_iterations = effective.em.max_iterations as u64
        );
    }
    Ok(effective)
}

fn load_dataset(path: &Path, ctx: &LogContext) -> Result<Dataset> {
    let dataset = Dataset::load(path)?;
    let path_text = path.display().to_string();
    log_event!(
        ctx,
        INFO,
        event_names::DATASET_LOADED,
        Stage::Load,
        "dataset loaded",
        path = path_text.as_str(),
        records = dataset.len() as u64
    );
    Ok(dataset)
}

fn fit_all(
    dataset: &Dataset,
    dimensions: &[Dimension],
    effective: &EffectiveSettings,
    ctx: &LogContext,
) -> Result<Vec<DimensionFit>> {
    dimensions
        .iter()
        .map(|dimension| {
            let triples = dataset.triples_for(dimension.as_str())?;
            fit_dimension(&dimension.spec(), &triples, &effective.em, ctx)
        })
        .collect()
}

fn converged_code(converged: bool) -> ExitCode {
    if converged {
        ExitCode::Clean
    } else {
        ExitCode::NotConverged
    }
}

fn run_fit(global: &GlobalOpts, args: &FitArgs, ctx: &LogContext) -> Result<ExitCode> {
    let effective = load_settings(global, args.em.overrides(), ctx)?;
    let dataset = load_dataset(&args.input, ctx)?;
    let fits = fit_all(&dataset, &args.em.selected(), &effective, ctx)?;

    let report = FitReport::new(ctx.run_id.clone(), effective.loaded.snapshot, fits);
    let mut stdout = std::io::stdout().lock();
    output::write_fit(&mut stdout, &report, global.format)?;
    stdout.flush()?;
    Ok(converged_code(report.all_converged()))
}

fn run_label(global: &GlobalOpts, args: &LabelArgs, ctx: &LogContext) -> Result<ExitCode> {
    let effective = load_settings(global, args.em.overrides(), ctx)?;
    let dataset = load_dataset(&args.input, ctx)?;
    let fits = fit_all(&dataset, &args.em.selected(), &effective, ctx)?;
    let converged = fits.iter().all(|f| f.diagnostics.converged);

    let (labeled, summary) = label_records(&dataset.records, &fits)?;
    log_event!(
        ctx,
        INFO,
        event_names::LABEL_DONE,
        Stage::Label,
        "labels attached",
        records = labeled.len() as u64,
        dimensions = fits.len() as u64
    );

    write_jsonl(&args.output, &labeled, args.force)?;
    let output_text = args.output.display().to_string();
    log_event!(
        ctx,
        INFO,
        event_names::OUTPUT_WRITTEN,
        Stage::Write,
        "labeled dataset written",
        path = output_text.as_str(),
        records = labeled.len() as u64
    );

    let report = LabelReport {
        schema_version: OUTPUT_SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        generated_at: chrono::Utc::now(),
        input: args.input.display().to_string(),
        output: output_text,
        records: labeled.len(),
        settings: effective.loaded.snapshot,
        summary,
        converged,
    };
    let mut stdout = std::io::stdout().lock();
    output::write_label(&mut stdout, &report, global.format)?;
    stdout.flush()?;
    Ok(converged_code(converged))
}

fn run_evaluate(global: &GlobalOpts, args: &EvaluateArgs, ctx: &LogContext) -> Result<ExitCode> {
    let truth = load_dataset(&args.truth, ctx)?;
    let pred = load_dataset(&args.pred, ctx)?;
    let dimensions = if args.dimensions.is_empty() {
        Dimension::ALL.to_vec()
    } else {
        args.dimensions.clone()
    };

    let report = EvaluateReport {
        schema_version: OUTPUT_SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        generated_at: chrono::Utc::now(),
        truth: args.truth.display().to_string(),
        pred: args.pred.display().to_string(),
        report: evaluate(&truth, &pred, &dimensions, args.baseline, ctx)?,
    };
    let mut stdout = std::io::stdout().lock();
    output::write_evaluation(&mut stdout, &report, global.format)?;
    stdout.flush()?;
    Ok(ExitCode::Clean)
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs, ctx: &LogContext) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show => run_config_show(global, ctx),
        ConfigCommands::Validate { path } => run_config_validate(global, path.as_deref(), ctx),
    }
}

/// Display the effective settings (builtin defaults if no file is found).
fn run_config_show(global: &GlobalOpts, ctx: &LogContext) -> Result<ExitCode> {
    let effective = load_settings(global, EmOverrides::default(), ctx)?;
    let snapshot = &effective.loaded.snapshot;
    let response = serde_json::json!({
        "schema_version": OUTPUT_SCHEMA_VERSION,
        "run_id": ctx.run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "source": {
            "kind": snapshot.source,
            "path": snapshot.path,
            "hash": snapshot.content_hash,
            "using_defaults": snapshot.path.is_none(),
        },
        "settings": effective.loaded.settings,
    });

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Jsonl => println!("{}", serde_json::to_string(&response)?),
        OutputFormat::Summary => println!(
            "[{}] config: {} tolerance={} max_iterations={} seed={}",
            ctx.run_id,
            snapshot.path.as_deref().unwrap_or("builtin defaults"),
            effective.em.tolerance,
            effective.em.max_iterations,
            effective.em.seed_emission
        ),
        OutputFormat::Md => {
            println!("# sl-core config show");
            println!();
            match &snapshot.path {
                Some(path) => {
                    println!("Source: {} ({})", path, snapshot.source);
                    println!("Hash: {}", snapshot.content_hash.as_deref().unwrap_or("n/a"));
                }
                None => println!("Source: **builtin defaults** (no settings.json found)"),
            }
            println!("Schema version: {}", effective.loaded.settings.schema_version);
            println!();
            println!("| setting | value |");
            println!("|---|---|");
            println!("| tolerance | {} |", effective.em.tolerance);
            println!("| max_iterations | {} |", effective.em.max_iterations);
            println!("| seed_emission | {} |", effective.em.seed_emission);
        }
    }
    Ok(ExitCode::Clean)
}

/// Validate a settings file, or the resolved one when no path is given.
fn run_config_validate(global: &GlobalOpts, path: Option<&Path>, ctx: &LogContext) -> Result<ExitCode> {
    let (settings, checked) = match path {
        Some(p) => {
            let settings = Settings::from_file(p).map_err(config_error)?;
            validate_settings(&settings).map_err(config_error)?;
            (settings, Some(p.display().to_string()))
        }
        None => {
            let effective = load_settings(global, EmOverrides::default(), ctx)?;
            let checked = effective.loaded.snapshot.path.clone();
            (effective.loaded.settings, checked)
        }
    };

    let response = serde_json::json!({
        "schema_version": OUTPUT_SCHEMA_VERSION,
        "run_id": ctx.run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "valid",
        "path": checked,
        "using_defaults": checked.is_none(),
        "settings_schema_version": settings.schema_version,
    });

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Jsonl => println!("{}", serde_json::to_string(&response)?),
        OutputFormat::Summary => println!("[{}] config validate: OK", ctx.run_id),
        OutputFormat::Md => {
            println!("# Settings validation");
            println!();
            println!("Status: valid");
            match &checked {
                Some(p) => println!("File: {}", p),
                None => println!("File: none, using builtin defaults"),
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn print_version(global: &GlobalOpts) -> Result<ExitCode> {
    let version_info = serde_json::json!({
        "schema_version": OUTPUT_SCHEMA_VERSION,
        "settings_schema_version": CONFIG_SCHEMA_VERSION,
        "sl_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&version_info)?),
        OutputFormat::Jsonl => println!("{}", serde_json::to_string(&version_info)?),
        _ => {
            println!("sl-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", OUTPUT_SCHEMA_VERSION);
        }
    }
    Ok(ExitCode::Clean)
}

/// Report an error on stderr in the selected format.
fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) {
    let structured = StructuredError::from(err);
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "status": "error",
                "error": structured,
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error {}: {}", ctx.run_id, structured.code, structured.message);
        }
        OutputFormat::Md => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, use_color));
        }
    }
}
