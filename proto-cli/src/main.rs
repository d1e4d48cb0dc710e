//! Protoscope
//!
//! Infers a machine-readable protocol definition from a raw capture of
//! an instrument's serial output.

mod settings;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use proto_detect::ProtocolDetector;
use proto_gen::{infer_definition, GeneratedDefinition, IdentifierPolicy};
use proto_model::{DetectionResult, EncodingKind, TerminatorCandidate};
use settings::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serial protocol definition inference
#[derive(Parser)]
#[command(name = "protoscope")]
#[command(about = "Infer a protocol definition from captured device output")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a protocol definition from a capture
    Infer(InferArgs),
    /// Report the detected encoding and terminator hierarchy only
    Detect(DetectArgs),
    /// Write the default settings file
    InitSettings {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args)]
struct InferArgs {
    /// Capture file, or `-` for stdin
    input: PathBuf,
    /// Write the definition here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Device name recorded in the definition
    #[arg(long)]
    device_name: Option<String>,
    /// Definition version
    #[arg(long = "definition-version")]
    definition_version: Option<String>,
    /// Skip encoding detection and decode as this encoding
    #[arg(long)]
    encoding: Option<EncodingKind>,
    /// Validate field names against Rust keywords instead of C-family ones
    #[arg(long)]
    rust_identifiers: bool,
    /// Fail when the definition does not validate
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct DetectArgs {
    /// Capture file, or `-` for stdin
    input: PathBuf,
    /// Print the detection result as JSON
    #[arg(long)]
    json: bool,
    /// Skip encoding detection and decode as this encoding
    #[arg(long)]
    encoding: Option<EncodingKind>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for the definition
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "protoscope=info,proto_detect=info,proto_analyze=info,proto_gen=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => infer(args, load_settings(cli.settings.as_deref())?),
        Commands::Detect(args) => detect(args, load_settings(cli.settings.as_deref())?),
        Commands::InitSettings { force } => init_settings(cli.settings.as_deref(), force),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path).map_err(|e| anyhow!(e)),
        None => Ok(Settings::load()),
    }
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        return Ok(data);
    }
    std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn infer(args: InferArgs, settings: Settings) -> Result<()> {
    let data = read_input(&args.input)?;
    tracing::info!("Read {} bytes from {}", data.len(), args.input.display());

    let mut config = settings.pipeline;
    if let Some(encoding) = args.encoding {
        config.detector.encoding = Some(encoding);
    }
    if let Some(name) = args.device_name {
        config.generator.device_name = name;
    }
    if let Some(version) = args.definition_version {
        config.generator.version = version;
    }
    if args.rust_identifiers {
        config.generator.identifiers = IdentifierPolicy::rust();
    }
    if settings.stamp_date && config.generator.generated_date.is_none() {
        config.generator.generated_date = Some(chrono::Utc::now().to_rfc3339());
    }

    let generated = infer_definition(&data, &config)?;
    report(&generated, args.strict || settings.strict)?;

    match &args.output {
        Some(path) => {
            generated.write_json(path)?;
            tracing::info!("Wrote definition to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", generated.to_json()?)?;
        }
    }
    Ok(())
}

/// Log validation problems, failing in strict mode
fn report(generated: &GeneratedDefinition, strict: bool) -> Result<()> {
    if generated.is_valid() {
        return Ok(());
    }
    if strict {
        bail!(
            "definition failed validation: {}",
            generated.errors.join("; ")
        );
    }
    tracing::warn!(
        "Writing definition with {} validation problem(s)",
        generated.errors.len()
    );
    Ok(())
}

fn detect(args: DetectArgs, settings: Settings) -> Result<()> {
    let data = read_input(&args.input)?;
    let mut config = settings.pipeline.detector;
    if let Some(encoding) = args.encoding {
        config.encoding = Some(encoding);
    }

    let detection = ProtocolDetector::with_config(config).try_detect(&data)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
    } else {
        print_detection(&detection);
    }
    Ok(())
}

fn print_detection(detection: &DetectionResult) {
    let level = |c: &Option<TerminatorCandidate>| match c {
        Some(c) => format!("{} (confidence {:.2})", c.display_name, c.confidence),
        None => "-".to_string(),
    };
    let hierarchy = &detection.hierarchy;

    println!(
        "Encoding:    {} (confidence {:.2}, {})",
        detection.encoding.kind, detection.encoding.confidence, detection.encoding.rationale
    );
    println!("Frame:       {}", level(&hierarchy.frame));
    println!("Frame start: {}", level(&hierarchy.frame_start));
    println!("Segment:     {}", level(&hierarchy.segment));
    println!("Field:       {}", level(&hierarchy.field_delimiter));
    println!("Structure:   {}", detection.structure.label());
    println!("Confidence:  {:.2}", detection.overall_confidence);
}

fn init_settings(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Settings::settings_path().context("Could not determine settings path")?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Settings::default().save_to(&path).map_err(|e| anyhow!(e))?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
