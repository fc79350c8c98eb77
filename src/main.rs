use anyhow::{Context, Result};
use batch_oee::calculation::{calculate_with_options, CalculationOptions, CalculationResult};
use batch_oee::cli::{Cli, OutputFormat};
use batch_oee::config::ConfigStore;
use batch_oee::csv_output::{breakdown_to_csv, CsvOutput};
use batch_oee::interval::{EndPolicy, OperationInterval};
use batch_oee::json_output::JsonReport;
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load interval records from a JSON array
fn load_intervals(path: &Path) -> Result<Vec<OperationInterval>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read intervals file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse interval records in {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<ConfigStore> {
    match path {
        Some(path) => ConfigStore::from_path(path)
            .with_context(|| format!("Invalid classification config: {}", path.display())),
        None => ConfigStore::default_isa88().context("Failed to load built-in loss mappings"),
    }
}

fn render(result: &CalculationResult, format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Text => result.to_string(),
        OutputFormat::Json => {
            let json = JsonReport::from_result(result)
                .to_json()
                .context("Failed to serialize JSON report")?;
            format!("{}\n", json)
        }
        OutputFormat::Csv => {
            let mut csv = CsvOutput::new(true);
            csv.extend(&result.categorized_intervals);
            csv.to_csv()
        }
        OutputFormat::BreakdownCsv => breakdown_to_csv(result.time_breakdown()),
    };
    Ok(output)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;
    let intervals = load_intervals(&args.intervals)?;

    let options = CalculationOptions {
        end_policy: match args.now {
            Some(now) => EndPolicy::Live { now },
            None => EndPolicy::WindowEnd,
        },
        overlap_policy: args.overlap.into(),
        idle_operation: args.idle_operation.clone(),
    };

    let result = calculate_with_options(&intervals, &config, args.start, args.end, &options)
        .context("OEE calculation failed")?;

    if args.strict {
        let unmapped: Vec<&str> = result.unmapped_operations().collect();
        if !unmapped.is_empty() {
            anyhow::bail!(
                "Operations missing from loss_mappings: {} (run without --strict to count them as unplanned stops)",
                unmapped.join(", ")
            );
        }
    }

    let output = render(&result, args.format)?;
    print!("{}", output);

    Ok(())
}
