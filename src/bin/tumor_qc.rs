//! tumor-qc - Tumor Measurement Quality Control CLI
//!
//! Command-line interface for anomaly screening, growth fitting and baseline
//! homogeneity checks. Input is a JSON array of animal records:
//!
//! ```json
//! [{"id": "M1", "group": "Control", "time_points": [0, 7, 14], "measurements": [100, 150, 220]}]
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tumor_qc::anomaly::{analyze_dataset, FilteringStrictness, ProfileName, ProfileSelection};
use tumor_qc::config::AnalysisConfig;
use tumor_qc::data::{AnimalRecord, MeasurementKind};
use tumor_qc::error::Result;
use tumor_qc::homogeneity::evaluate_homogeneity;
use tumor_qc::model::{
    compare_growth_rates, fit_growth_model_batch_with_progress, BatchFit, BatchOptions,
    GroupComparison,
};

/// CLI-friendly measurement kind
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMeasurementKind {
    /// Tumor volume (mm³)
    Volume,
    /// Tumor or body weight (g)
    Weight,
}

impl From<CliMeasurementKind> for MeasurementKind {
    fn from(kind: CliMeasurementKind) -> Self {
        match kind {
            CliMeasurementKind::Volume => MeasurementKind::Volume,
            CliMeasurementKind::Weight => MeasurementKind::Weight,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Quality control for longitudinal tumor measurements
#[derive(Parser)]
#[command(name = "tumor-qc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect anomalies and derive filtered dataset views
    Analyze {
        /// Path to animal records JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Named sensitivity profile, overriding the configuration
        #[arg(short, long)]
        profile: Option<String>,

        /// Filtering strictness: critical, critical-and-high or all
        #[arg(short, long)]
        strictness: Option<String>,

        /// What the measurements record
        #[arg(short, long, value_enum, default_value = "volume")]
        kind: CliMeasurementKind,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit exponential growth models for every animal
    Fit {
        /// Path to animal records JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Animals per parallel batch
        #[arg(short, long, default_value = "50")]
        batch_size: usize,

        /// Compare each group's growth rates against this control group
        #[arg(long)]
        control: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate baseline homogeneity per group
    Homogeneity {
        /// Path to animal records JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis configuration (YAML or JSON) providing CV thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the built-in sensitivity profiles
    Profiles {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            config,
            profile,
            strictness,
            kind,
            format,
            output,
        } => cmd_analyze(
            &input,
            config.as_deref(),
            profile.as_deref(),
            strictness.as_deref(),
            kind.into(),
            format,
            output.as_deref(),
        ),

        Commands::Fit {
            input,
            batch_size,
            control,
            format,
            output,
        } => cmd_fit(&input, batch_size, control.as_deref(), format, output.as_deref()),

        Commands::Homogeneity {
            input,
            config,
            format,
            output,
        } => cmd_homogeneity(&input, config.as_deref(), format, output.as_deref()),

        Commands::Profiles { format } => cmd_profiles(format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Load animal records from a JSON array.
fn load_animals(path: &Path) -> Result<Vec<AnimalRecord>> {
    let content = std::fs::read_to_string(path)?;
    let animals: Vec<AnimalRecord> = serde_json::from_str(&content)?;
    info!(path = %path.display(), animals = animals.len(), "loaded animal records");
    Ok(animals)
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            AnalysisConfig::from_file(path)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

/// Render `value` as JSON/YAML, or with `text` for the text format.
fn render<T: Serialize>(value: &T, format: OutputFormat, text: impl FnOnce() -> String) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
    }
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!(path = %path.display(), "wrote output");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Run the anomaly analysis
fn cmd_analyze(
    input: &Path,
    config_path: Option<&Path>,
    profile: Option<&str>,
    strictness: Option<&str>,
    kind: MeasurementKind,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(name) = profile {
        config.profile = ProfileSelection::Named(name.parse::<ProfileName>()?);
    }
    if let Some(level) = strictness {
        config.strictness = level.parse::<FilteringStrictness>()?;
    }

    let animals = load_animals(input)?;
    info!(
        profile = config.profile.name(),
        strictness = %config.strictness,
        kind = %kind,
        "running anomaly analysis"
    );
    let result = analyze_dataset(&animals, kind, &config)?;

    let rendered = render(&result, format, || result.to_string())?;
    emit(&rendered, output)
}

#[derive(Serialize)]
struct FitReport {
    #[serde(flatten)]
    batch: BatchFit,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparisons: Option<Vec<GroupComparison>>,
}

fn fit_text(report: &FitReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<16} {:>10} {:>10} {:>8} {:>10}\n",
        "Animal", "Group", "a", "r", "R²", "Doubling"
    ));
    for animal in &report.batch.animals {
        match &animal.model {
            Some(model) if model.is_valid() => out.push_str(&format!(
                "{:<12} {:<16} {:>10.2} {:>10.4} {:>8.3} {:>10}\n",
                animal.animal_id,
                animal.group,
                model.a,
                model.r,
                model.r2,
                animal
                    .doubling_time
                    .map(|d| format!("{:.1}", d))
                    .unwrap_or_else(|| "-".to_string())
            )),
            Some(model) => out.push_str(&format!(
                "{:<12} {:<16} {}\n",
                animal.animal_id,
                animal.group,
                model.error.as_deref().unwrap_or("degenerate fit")
            )),
            None => out.push_str(&format!(
                "{:<12} {:<16} failed: {}\n",
                animal.animal_id,
                animal.group,
                animal.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }
    out.push('\n');
    out.push_str(&report.batch.stats.to_string());

    if let Some(comparisons) = &report.comparisons {
        out.push_str("\nGrowth rate comparisons\n");
        for c in comparisons {
            let p = c
                .mann_whitney
                .map(|mw| format!("{:.4}", mw.p))
                .unwrap_or_else(|| "NA".to_string());
            let inhibition = c
                .rate_inhibition
                .map(|i| format!("{:.1}%", i))
                .unwrap_or_else(|| "NA".to_string());
            out.push_str(&format!(
                "  {} vs {}: median r {:.4} vs {:.4}, p = {}, d = {:.2} ({}), inhibition {}\n",
                c.group,
                c.control,
                c.median_rate,
                c.median_rate_control,
                p,
                c.effect_size.value,
                c.effect_size.description,
                inhibition
            ));
        }
    }
    out
}

/// Fit growth models in parallel batches
fn cmd_fit(
    input: &Path,
    batch_size: usize,
    control: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let animals = load_animals(input)?;
    let options = BatchOptions { batch_size };

    let batch = fit_growth_model_batch_with_progress(&animals, &options, |p| {
        debug!(
            batch = p.batch_index + 1,
            of = p.total_batches,
            overall = p.overall_progress,
            "fit progress"
        );
    })?;
    info!(
        valid = batch.stats.valid_models,
        total = batch.stats.total_animals,
        "growth fitting complete"
    );

    let comparisons = control
        .map(|group| compare_growth_rates(&batch, group))
        .transpose()?;
    let report = FitReport { batch, comparisons };

    let rendered = render(&report, format, || fit_text(&report))?;
    emit(&rendered, output)
}

/// Evaluate baseline homogeneity
fn cmd_homogeneity(
    input: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let animals = load_animals(input)?;
    let report = evaluate_homogeneity(&animals, &config.homogeneity)?;

    let rendered = render(&report, format, || report.to_string())?;
    emit(&rendered, output)
}

#[derive(Serialize)]
struct ProfileListing {
    name: &'static str,
    description: &'static str,
    #[serde(flatten)]
    profile: tumor_qc::anomaly::SensitivityProfile,
}

/// List the built-in profiles
fn cmd_profiles(format: OutputFormat) -> Result<()> {
    let listing: Vec<ProfileListing> = ProfileName::ALL
        .iter()
        .map(|name| ProfileListing {
            name: name.name(),
            description: name.description(),
            profile: name.profile(),
        })
        .collect();

    let rendered = render(&listing, format, || {
        let mut out = format!(
            "{:<14} {:>8} {:>8} {:>6} {:>9} {:>9}  Description\n",
            "Profile", "MaxGrow", "MaxDecl", "IQR k", "MinGroup", "Multiple"
        );
        for entry in &listing {
            let p = &entry.profile;
            out.push_str(&format!(
                "{:<14} {:>8.2} {:>8.2} {:>6.1} {:>9} {:>9}  {}\n",
                entry.name,
                p.max_growth_rate,
                p.max_decline_rate,
                p.iqr_sensitivity,
                p.min_group_size_for_iqr,
                p.require_multiple_flags,
                entry.description
            ));
        }
        out
    })?;
    emit(&rendered, None)
}
