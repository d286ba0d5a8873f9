use std::io::Write;

use owo_colors::OwoColorize;
use pdfsift_core::{ExtractionResult, PipelineError, PipelineEvent, QualityTier, QualityVerdict};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

pub fn print_header(
    w: &mut dyn Write,
    pdf_name: &str,
    file_size: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "Extracting text from {} {}", pdf_name, format!("({file_size} bytes)").dimmed())
    } else {
        writeln!(w, "Extracting text from {} ({} bytes)", pdf_name, file_size)
    }
}

/// Print a pipeline transition as it happens.
pub fn print_event(
    w: &mut dyn Write,
    event: &PipelineEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        PipelineEvent::Started { .. } => {}
        PipelineEvent::Trying { rank, strategy } => {
            writeln!(w, "[{}] Trying {}...", rank + 1, strategy)?;
        }
        PipelineEvent::Failed {
            rank,
            failure,
            elapsed,
        } => {
            if color.enabled() {
                writeln!(
                    w,
                    "[{}] -> {} {} {}",
                    rank + 1,
                    "FAILED".red(),
                    failure.error,
                    format!("({elapsed:.2?})").dimmed()
                )?;
            } else {
                writeln!(w, "[{}] -> FAILED {} ({:.2?})", rank + 1, failure.error, elapsed)?;
            }
        }
        PipelineEvent::Accepted {
            strategy, elapsed, ..
        } => {
            if color.enabled() {
                writeln!(
                    w,
                    "    -> {} ({}) {}",
                    "ACCEPTED".green(),
                    strategy,
                    format!("({elapsed:.2?})").dimmed()
                )?;
            } else {
                writeln!(w, "    -> ACCEPTED ({}) ({:.2?})", strategy, elapsed)?;
            }
        }
        PipelineEvent::Exhausted { attempts } => {
            writeln!(w, "All {} strategies failed", attempts)?;
        }
    }
    Ok(())
}

/// Print the one-line summary after a successful extraction.
pub fn print_summary(
    w: &mut dyn Write,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "{} words, {} characters from {} of {} pages via {}",
        result.word_count,
        result.character_count,
        result.extracted_page_count,
        result.page_count,
        result.strategy
    );
    if !color.enabled() {
        return writeln!(w, "{} [quality: {}]", line, result.quality_tier.as_str());
    }
    let tier = result.quality_tier.as_str();
    match result.quality_tier {
        QualityTier::High => writeln!(w, "{} [quality: {}]", line.bold(), tier.green()),
        QualityTier::Medium => writeln!(w, "{} [quality: {}]", line.bold(), tier.yellow()),
        QualityTier::Low => writeln!(w, "{} [quality: {}]", line.bold(), tier.red()),
    }
}

pub fn print_failure(
    w: &mut dyn Write,
    error: &PipelineError,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "ERROR:".red().bold(), error)?;
    } else {
        writeln!(w, "ERROR: {}", error)?;
    }
    for failure in error.failures() {
        writeln!(w, "  {}", failure)?;
    }
    Ok(())
}

pub fn print_verdict(
    w: &mut dyn Write,
    verdict: &QualityVerdict,
    color: ColorMode,
) -> std::io::Result<()> {
    match (&verdict.reason, color.enabled()) {
        (None, true) => writeln!(w, "{}", "ACCEPTED".green()),
        (None, false) => writeln!(w, "ACCEPTED"),
        (Some(reason), true) => writeln!(w, "{} {}", "REJECTED:".red(), reason),
        (Some(reason), false) => writeln!(w, "REJECTED: {}", reason),
    }
}
