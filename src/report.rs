use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::sync::Arc;

use crate::analyzer::{analyze, AnalysisResult};
use crate::config::{AnalyzerOptions, AppConfig};
use crate::error::{ProcessError, SkippedFile};
use crate::extractor::{ExtractionResult, Extractor, UploadedFile};
use crate::ocr::{OcrEngine, TesseractOcr};
use crate::progress::ProgressTracker;
use crate::sentiment::SentimentLabel;
use crate::suggest::{SuggestionClient, Suggestions};

/// Everything produced for one upload: what is rendered and what is exported.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ExtractionResult>,
    pub skipped: Vec<SkippedFile>,
    pub combined_text: String,
    pub analysis: AnalysisResult,
    /// Absent when suggestions are disabled or the service failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
    /// The model's tone when it gave one, otherwise the local sentiment label.
    pub tone: SentimentLabel,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Extract → analyze → suggest, sharing one configuration.
pub struct Pipeline {
    extractor: Extractor,
    suggestions: SuggestionClient,
    analyzer: AnalyzerOptions,
}

impl Pipeline {
    pub fn new(extractor: Extractor, suggestions: SuggestionClient, analyzer: AnalyzerOptions) -> Self {
        Self {
            extractor,
            suggestions,
            analyzer,
        }
    }

    /// Pipeline backed by the Tesseract/Poppler tools named in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractOcr::new(config.ocr.clone()));
        Ok(Self::new(
            Extractor::new(config.extract.clone(), ocr),
            SuggestionClient::new(config.suggest.clone())?,
            config.analyzer.clone(),
        ))
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.suggestions.is_enabled()
    }

    pub async fn run(&self, files: Vec<UploadedFile>) -> Result<Report, ProcessError> {
        self.run_with_progress(files, None).await
    }

    pub async fn run_with_progress(
        &self,
        files: Vec<UploadedFile>,
        progress: Option<ProgressTracker>,
    ) -> Result<Report, ProcessError> {
        if files.is_empty() {
            return Err(ProcessError::NoFiles);
        }

        let total = files.len();
        let batch = self
            .extractor
            .extract_all(files, progress)
            .await
            .ensure_processed()?;

        info!(
            "Processed {}/{} file(s), {} skipped",
            batch.files.len(),
            total,
            batch.skipped.len()
        );

        let analysis = analyze(&batch.combined_text, &self.analyzer);
        let suggestions = self.suggestions.suggest(&batch.combined_text).await;
        let tone = suggestions
            .as_ref()
            .and_then(|s| s.tone)
            .unwrap_or(analysis.sentiment.label);

        Ok(Report {
            generated_at: Utc::now(),
            files: batch.files,
            skipped: batch.skipped,
            combined_text: batch.combined_text,
            analysis,
            suggestions,
            tone,
        })
    }
}
