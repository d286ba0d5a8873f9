use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pdfsift_core::config_file::{self, ConfigFile};
use pdfsift_core::{
    DocumentBuffer, ErrorResponse, ExtractionResponse, PipelineConfig, TextValidator,
    looks_like_pdf,
};
use pdfsift_pdf::Pipeline;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// pdfsift - Pull clean, readable text out of arbitrary PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from a PDF
    Extract {
        /// Path to the PDF file
        file_path: PathBuf,

        /// Print the JSON response instead of plain text
        #[arg(long)]
        json: bool,

        /// Config file applied on top of the platform and local config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the extracted text (or JSON) to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Run the text quality validator over a plain-text file
    Validate {
        /// Path to the text file
        file_path: PathBuf,

        /// Config file applied on top of the platform and local config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Progress goes through pipeline events; tracing output is for diagnostics.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file_path,
            json,
            config,
            output,
            no_color,
        } => extract(&file_path, json, config.as_deref(), output, no_color).await,
        Command::Validate {
            file_path,
            config,
            no_color,
        } => validate(&file_path, config.as_deref(), no_color),
    }
}

/// Platform config, then `./.pdfsift.toml`, then `--config`, then environment.
fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut file: ConfigFile = config_file::load_config();
    if let Some(path) = explicit {
        let overlay = config_file::read_config(path)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        file = config_file::merge(file, overlay);
    }
    Ok(file.with_env_overrides().into_pipeline_config()?)
}

async fn extract(
    file_path: &Path,
    json: bool,
    config: Option<&Path>,
    output: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    let config = resolve_config(config)?;
    let color = ColorMode(!no_color);

    let data = std::fs::read(file_path)
        .map_err(|e| anyhow::anyhow!("{}: {}", file_path.display(), e))?;
    if !looks_like_pdf(&data) {
        anyhow::bail!("{} doesn't appear to be a PDF", file_path.display());
    }

    let pdf_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());
    output::print_header(&mut std::io::stderr(), &pdf_name, data.len(), color)?;

    let pipeline = Pipeline::new(config);
    let outcome = pipeline
        .extract_with_events(DocumentBuffer::from(data), |event| {
            let _ = output::print_event(&mut std::io::stderr(), &event, color);
        })
        .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if json {
                let body = serde_json::to_string_pretty(&ErrorResponse::from(&e))?;
                write_output(output.as_deref(), &body)?;
            }
            output::print_failure(&mut std::io::stderr(), &e, color)?;
            anyhow::bail!("extraction failed for {}", file_path.display());
        }
    };

    let body = if json {
        serde_json::to_string_pretty(&ExtractionResponse::from(&result))?
    } else {
        result.text.clone()
    };
    write_output(output.as_deref(), &body)?;
    output::print_summary(&mut std::io::stderr(), &result, color)?;
    Ok(())
}

fn write_output(path: Option<&Path>, body: &str) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    writeln!(writer, "{}", body)?;
    writer.flush()?;
    Ok(())
}

fn validate(file_path: &Path, config: Option<&Path>, no_color: bool) -> anyhow::Result<()> {
    let config = resolve_config(config)?;
    let text = std::fs::read_to_string(file_path)
        .map_err(|e| anyhow::anyhow!("{}: {}", file_path.display(), e))?;

    let verdict = TextValidator::new(&config.validator).validate(&text);
    output::print_verdict(&mut std::io::stdout(), &verdict, ColorMode(!no_color))?;

    match verdict.reason {
        Some(reason) if !verdict.accepted => anyhow::bail!("text rejected: {reason}"),
        _ => Ok(()),
    }
}
