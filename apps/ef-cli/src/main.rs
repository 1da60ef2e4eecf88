use clap::{Parser, Subcommand};
use ef_app::{AnalysisPayload, AnalysisProgressEvent, AnalysisService, AppResult};
use ef_project::{validate_matrix, VariationMode};
use ef_sensitivity::METRIC_RANGE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ef-cli")]
#[command(about = "Econoflow CLI - techno-economic cash-flow sensitivity analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an analysis payload file
    Validate {
        /// Path to the payload JSON file
        payload_path: PathBuf,
    },
    /// List resolvable sensitivity parameters
    Params,
    /// Run the full four-stage pipeline for a payload
    Analyze {
        /// Path to the payload JSON file
        payload_path: PathBuf,
        /// Artifact store root directory
        root: PathBuf,
    },
    /// Show a stored result record
    ShowResult {
        /// Artifact store root directory
        root: PathBuf,
        /// Batch version
        version: String,
        /// Parameter identifier (e.g. S13)
        param_id: String,
        /// Compare-to key (e.g. S80)
        compare_to_key: String,
        /// Variation mode: symmetric, multipoint, or offset
        mode: String,
    },
    /// Show a version's pipeline status record
    Status {
        /// Artifact store root directory
        root: PathBuf,
        /// Batch version
        version: String,
    },
}

fn load_payload(path: &PathBuf) -> AppResult<AnalysisPayload> {
    let content = std::fs::read_to_string(path)?;
    let payload: AnalysisPayload = serde_json::from_str(&content)
        .map_err(|e| ef_app::AppError::Store(format!("failed to parse payload: {e}")))?;
    Ok(payload)
}

fn parse_mode(mode: &str) -> Result<VariationMode, String> {
    match mode {
        "symmetric" => Ok(VariationMode::Symmetric),
        "multipoint" => Ok(VariationMode::Multipoint),
        "offset" => Ok(VariationMode::Offset),
        other => Err(format!("unknown mode: {other}")),
    }
}

fn cmd_validate(payload_path: &PathBuf) -> AppResult<()> {
    let payload = load_payload(payload_path)?;
    validate_matrix(&payload.matrix, payload.snapshot.plant_lifetime)
        .map_err(ef_app::AppError::Validation)?;
    for param in &payload.sen_parameters {
        ef_sensitivity::resolve(&param.param_id)?;
    }
    println!(
        "OK: version {}, {} interval(s), {} parameter(s)",
        payload.version,
        payload.matrix.len(),
        payload.sen_parameters.len()
    );
    Ok(())
}

fn cmd_params() {
    println!("Configuration fields:");
    for (name, _) in ef_project::PROPERTY_TABLE {
        let digits: String = name
            .rsplit("Amount")
            .next()
            .unwrap_or_default()
            .to_string();
        println!("  S{digits:<4} {name}");
    }
    println!("Summary metrics:");
    for (offset, name) in ef_engine::SUMMARY_METRICS.iter().enumerate() {
        println!("  S{:<4} {name}", METRIC_RANGE.start() + offset as u32);
    }
}

fn cmd_analyze(payload_path: &PathBuf, root: &PathBuf) -> AppResult<()> {
    let payload = load_payload(payload_path)?;
    let service = AnalysisService::new(root)?;

    let mut on_progress = |event: AnalysisProgressEvent| {
        let counts = match (event.completed_variations, event.total_variations) {
            (Some(done), Some(total)) => format!(" [{done}/{total}]"),
            _ => String::new(),
        };
        println!(
            "[{:8.2}s] {:?}{}{}",
            event.elapsed_wall_s,
            event.stage,
            counts,
            event
                .message
                .map(|m| format!(" - {m}"))
                .unwrap_or_default()
        );
    };
    let report = service.analyze(&payload, Some(&mut on_progress))?;

    println!("Run {} completed for version {}", report.run_id, report.version);
    for result in &report.results {
        println!(
            "  {}: {} outcome(s) -> {}",
            result.param_id,
            result.outcomes,
            result.result_path.display()
        );
    }
    for failure in &report.failures {
        eprintln!(
            "  FAILED {} {}: {}",
            failure.param_id, failure.signed_label, failure.error
        );
    }
    Ok(())
}

fn cmd_show_result(
    root: &PathBuf,
    version: &str,
    param_id: &str,
    compare_to_key: &str,
    mode: VariationMode,
) -> AppResult<()> {
    let service = AnalysisService::new(root)?;
    let record = service
        .store()
        .load_result(version, param_id, compare_to_key, mode)?;
    println!(
        "{} {} vs {} ({}) at {}",
        record.metadata.version,
        record.metadata.param_id,
        record.metadata.compare_to_key,
        record.metadata.mode,
        record.metadata.timestamp
    );
    for outcome in &record.results {
        println!(
            "  {:>8}  price {:>12.4}  npv {:>14.2}  ({} iterations)",
            outcome.signed_label, outcome.price, outcome.npv, outcome.iterations
        );
    }
    Ok(())
}

fn cmd_status(root: &PathBuf, version: &str) -> AppResult<()> {
    let service = AnalysisService::new(root)?;
    let status = service.store().load_status(version)?;
    println!(
        "version {}  run {}  configured: {}  at {}",
        status.version, status.run_id, status.configured, status.timestamp
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Validate { payload_path } => cmd_validate(payload_path),
        Commands::Params => {
            cmd_params();
            Ok(())
        }
        Commands::Analyze { payload_path, root } => cmd_analyze(payload_path, root),
        Commands::ShowResult {
            root,
            version,
            param_id,
            compare_to_key,
            mode,
        } => match parse_mode(mode) {
            Ok(mode) => cmd_show_result(root, version, param_id, compare_to_key, mode),
            Err(message) => {
                eprintln!("Error: {message}");
                std::process::exit(2);
            }
        },
        Commands::Status { root, version } => cmd_status(root, version),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
