use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use doc_insights::cli::BatchArgs;
use doc_insights::config::is_allowed_extension;
use doc_insights::extractor::extension_of;
use doc_insights::progress::ProgressTracker;
use doc_insights::{init_logging, AppConfig, Pipeline, UploadedFile};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = BatchArgs::parse();
    let mut config = AppConfig::from_pipeline_args(&args.pipeline);
    if args.no_suggestions {
        config.suggest.api_key = None;
    }

    let paths = find_input_files(&args.inputs)?;
    if paths.is_empty() {
        warn!("No PDF or image files found");
        return Ok(());
    }
    info!("Found {} file(s)", paths.len());

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(UploadedFile::new(path.to_string_lossy(), bytes));
    }

    let pipeline = Pipeline::from_config(&config)?;
    let progress = ProgressTracker::new(files.len());
    let report = pipeline
        .run_with_progress(files, Some(progress.clone()))
        .await?;
    progress.finish();

    let json = report.to_json()?;
    match &args.output {
        Some(output) => {
            tokio::fs::write(output, &json)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        None => println!("{}", json),
    }

    let ocr_files = report.files.iter().filter(|f| f.used_ocr).count();
    eprintln!("\nExtraction complete!");
    eprintln!("Processed: {}/{} files", report.files.len(), paths.len());
    eprintln!("Used OCR: {}", ocr_files);
    eprintln!("Skipped: {}", report.skipped.len());
    for skipped in &report.skipped {
        eprintln!("  - {}", skipped.reason);
    }
    eprintln!("Words: {}", report.analysis.word_count);
    eprintln!("Tone: {}", report.tone);
    if let Some(output) = &args.output {
        eprintln!("Report written to: {}", output.display());
    }

    Ok(())
}

/// Expand directories recursively; explicitly named files are kept even when
/// their extension is not supported so they show up as skipped.
fn find_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input) {
            let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
            let path = entry.path();
            if path.is_file() && has_supported_extension(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| is_allowed_extension(&extension_of(name)))
        .unwrap_or(false)
}
