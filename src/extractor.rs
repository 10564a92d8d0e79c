use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::{is_allowed_extension, ExtractConfig};
use crate::error::{ExtractError, ProcessError, SkippedFile};
use crate::format::{collapse_whitespace, join_blocks, postprocess};
use crate::ocr::OcrEngine;
use crate::pdf::{decide_page, PageDecision, PdfDocument};
use crate::progress::ProgressTracker;

/// An uploaded file, before any parsing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// Lower-cased extension, empty when the name has none.
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let extension = extension_of(&filename);
        Self {
            filename,
            extension,
            bytes,
        }
    }
}

pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Direct,
    Ocr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    pub number: u32,
    pub source: TextSource,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub filename: String,
    pub kind: FileKind,
    /// Never absent; a file without any readable text yields "".
    pub text: String,
    pub used_ocr: bool,
    pub pages: Vec<PageText>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchExtraction {
    pub files: Vec<ExtractionResult>,
    pub skipped: Vec<SkippedFile>,
    pub combined_text: String,
}

impl BatchExtraction {
    /// A batch where every file was rejected or unreadable is an error.
    pub fn ensure_processed(self) -> Result<Self, ProcessError> {
        if self.files.is_empty() {
            return Err(ProcessError::NothingProcessed {
                skipped: self.skipped,
            });
        }
        Ok(self)
    }
}

/// Extracts text from PDFs and images, falling back to OCR page by page.
#[derive(Clone)]
pub struct Extractor {
    config: ExtractConfig,
    ocr: Arc<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(config: ExtractConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    /// Extract one file.
    pub async fn extract(&self, file: &UploadedFile) -> Result<ExtractionResult, ExtractError> {
        let start_time = Instant::now();

        let result = match file.extension.as_str() {
            "pdf" => self.extract_pdf(file).await?,
            ext if is_allowed_extension(ext) => self.extract_image(file).await?,
            ext => {
                return Err(ExtractError::UnsupportedFileType {
                    filename: file.filename.clone(),
                    extension: ext.to_string(),
                })
            }
        };

        info!(
            "Extracted {} chars from {} ({} page(s), ocr: {}) in {:.2}s",
            result.text.chars().count(),
            result.filename,
            result.pages.len(),
            result.used_ocr,
            start_time.elapsed().as_secs_f64()
        );
        Ok(result)
    }

    async fn extract_pdf(&self, file: &UploadedFile) -> Result<ExtractionResult, ExtractError> {
        let min_chars = self.config.direct_text_min_chars;
        let bytes = file.bytes.clone();

        let scanned = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<ScannedPage>> {
            let mut document = PdfDocument::load(bytes)?;
            let page_numbers = document.page_numbers().to_vec();

            let mut pages = Vec::with_capacity(page_numbers.len());
            for number in page_numbers {
                let direct = document.direct_text(number);
                let decision = match decide_page(&direct, min_chars) {
                    PageDecision::NeedsOcr => {
                        let secondary = document.secondary_text(number);
                        decide_page(&secondary, min_chars)
                    }
                    decision => decision,
                };
                pages.push(ScannedPage {
                    number,
                    decision,
                    direct: direct.trim().to_string(),
                });
            }
            Ok(pages)
        })
        .await
        .map_err(|e| ExtractError::UnreadableFile {
            filename: file.filename.clone(),
            reason: format!("PDF parsing aborted: {}", e),
        })?
        .map_err(|e| ExtractError::UnreadableFile {
            filename: file.filename.clone(),
            reason: format!("{:#}", e),
        })?;

        let mut pages = Vec::with_capacity(scanned.len());
        let mut used_ocr = false;

        for page in scanned {
            let (source, raw) = match page.decision {
                PageDecision::DirectText(text) => (TextSource::Direct, text),
                PageDecision::NeedsOcr => {
                    debug!("Page {} of {} has no usable text layer", page.number, file.filename);
                    match self.ocr.ocr_pdf_page(&file.bytes, page.number).await {
                        Ok(text) => {
                            used_ocr = true;
                            (TextSource::Ocr, text)
                        }
                        Err(e) => {
                            warn!(
                                "OCR failed for page {} of {}: {:#}",
                                page.number, file.filename, e
                            );
                            (TextSource::Direct, page.direct)
                        }
                    }
                }
            };

            pages.push(PageText {
                number: page.number,
                source,
                text: postprocess(&raw, self.config.preserve_formatting),
            });
        }

        if used_ocr {
            info!("Used OCR for {}", file.filename);
        }

        Ok(ExtractionResult {
            filename: file.filename.clone(),
            kind: FileKind::Pdf,
            text: self.combine_pages(&pages),
            used_ocr,
            pages,
        })
    }

    async fn extract_image(&self, file: &UploadedFile) -> Result<ExtractionResult, ExtractError> {
        let bytes = file.bytes.clone();
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| ExtractError::UnreadableFile {
                filename: file.filename.clone(),
                reason: format!("image decoding aborted: {}", e),
            })?
            .map_err(|e| ExtractError::UnreadableFile {
                filename: file.filename.clone(),
                reason: format!("not a valid image: {}", e),
            })?;

        let raw = self
            .ocr
            .ocr_image(image)
            .await
            .map_err(|e| ExtractError::OcrFailed {
                filename: file.filename.clone(),
                reason: format!("{:#}", e),
            })?;

        let text = postprocess(&raw, self.config.preserve_formatting);
        Ok(ExtractionResult {
            filename: file.filename.clone(),
            kind: FileKind::Image,
            pages: vec![PageText {
                number: 1,
                source: TextSource::Ocr,
                text: text.clone(),
            }],
            text,
            used_ocr: true,
        })
    }

    fn combine_pages(&self, pages: &[PageText]) -> String {
        let joined = join_blocks(pages.iter().map(|p| p.text.as_str()));
        if self.config.preserve_formatting {
            joined
        } else {
            collapse_whitespace(&joined)
        }
    }

    /// Extract a batch. Unsupported files are rejected up front; the rest run
    /// concurrently, bounded by the configured worker count. Results keep
    /// upload order.
    pub async fn extract_all(
        &self,
        files: Vec<UploadedFile>,
        progress: Option<ProgressTracker>,
    ) -> BatchExtraction {
        let mut batch = BatchExtraction::default();
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = Vec::new();

        for file in files {
            if !is_allowed_extension(&file.extension) {
                let err = ExtractError::UnsupportedFileType {
                    filename: file.filename.clone(),
                    extension: file.extension.clone(),
                };
                warn!("Skipping {}", err);
                batch.skipped.push(SkippedFile::from(&err));
                if let Some(progress) = &progress {
                    progress.file_done(&file.filename, true);
                }
                continue;
            }

            let semaphore = semaphore.clone();
            let progress = progress.clone();
            let extractor = self.clone();
            let filename = file.filename.clone();

            let task = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = extractor.extract(&file).await;
                if let Some(progress) = &progress {
                    progress.file_done(&file.filename, result.is_err());
                }
                result
            });
            tasks.push((filename, task));
        }

        for (filename, task) in tasks {
            match task.await {
                Ok(Ok(result)) => batch.files.push(result),
                Ok(Err(e)) => {
                    warn!("Skipping {}", e);
                    batch.skipped.push(SkippedFile::from(&e));
                }
                Err(e) => {
                    error!("Extraction task for {} failed: {}", filename, e);
                    let err = ExtractError::UnreadableFile {
                        filename,
                        reason: "extraction aborted unexpectedly".to_string(),
                    };
                    batch.skipped.push(SkippedFile::from(&err));
                }
            }
        }

        batch.combined_text = join_blocks(batch.files.iter().map(|f| f.text.as_str()));
        batch
    }
}

struct ScannedPage {
    number: u32,
    decision: PageDecision,
    direct: String,
}
