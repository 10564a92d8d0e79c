use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{PipelineArgs, ServeArgs};

/// Pages whose trimmed direct text has at most this many characters are
/// treated as scanned and sent to OCR.
pub const DIRECT_TEXT_MIN_CHARS: usize = 10;

/// Rasterization resolution for OCR of PDF pages.
pub const OCR_DPI: u32 = 300;

pub const DEFAULT_TOP_KEYWORDS: usize = 8;
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SUGGESTION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SUGGESTION_CHAR_CAP: usize = 4000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_SECRET_KEY: &str = "devkey";

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Extensions accepted for upload, lower-case.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub preserve_formatting: bool,
    pub direct_text_min_chars: usize,
    pub workers: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            direct_text_min_chars: DIRECT_TEXT_MIN_CHARS,
            workers: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub tesseract_cmd: PathBuf,
    /// Directory holding `pdftoppm`; `None` searches `PATH`.
    pub poppler_path: Option<PathBuf>,
    pub language: String,
    pub dpi: u32,
    pub timeout: Duration,
    pub preserve_interword_spaces: bool,
}

impl OcrConfig {
    pub fn pdftoppm_cmd(&self) -> PathBuf {
        match &self.poppler_path {
            Some(dir) => dir.join("pdftoppm"),
            None => PathBuf::from("pdftoppm"),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            poppler_path: None,
            language: "eng".to_string(),
            dpi: OCR_DPI,
            timeout: Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS),
            preserve_interword_spaces: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub top_keywords: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            top_keywords: DEFAULT_TOP_KEYWORDS,
        }
    }
}

#[derive(Clone)]
pub struct SuggestConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub char_cap: usize,
    pub timeout: Duration,
}

impl std::fmt::Debug for SuggestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("char_cap", &self.char_cap)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            char_cap: DEFAULT_SUGGESTION_CHAR_CAP,
            timeout: Duration::from_secs(DEFAULT_SUGGESTION_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub secret_key: String,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("secret_key", &"<redacted>")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Process-wide settings, read once at start and passed to every component.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub extract: ExtractConfig,
    pub ocr: OcrConfig,
    pub analyzer: AnalyzerOptions,
    pub suggest: SuggestConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_pipeline_args(args: &PipelineArgs) -> Self {
        let api_key = args
            .gemini_api_key
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            extract: ExtractConfig {
                preserve_formatting: args.preserve_formatting,
                direct_text_min_chars: args.direct_text_min_chars,
                workers: args.workers.max(1),
            },
            ocr: OcrConfig {
                tesseract_cmd: args.tesseract_cmd.clone(),
                poppler_path: args.poppler_path.clone(),
                timeout: Duration::from_secs(args.ocr_timeout_secs),
                preserve_interword_spaces: args.preserve_formatting,
                ..OcrConfig::default()
            },
            analyzer: AnalyzerOptions {
                top_keywords: args.top_keywords,
            },
            suggest: SuggestConfig {
                api_key,
                model: args.gemini_model.clone(),
                char_cap: args.suggestion_char_cap,
                timeout: Duration::from_secs(args.suggestion_timeout_secs),
                ..SuggestConfig::default()
            },
            server: ServerConfig::default(),
        }
    }

    pub fn from_serve_args(args: &ServeArgs) -> Self {
        let mut config = Self::from_pipeline_args(&args.pipeline);
        config.server = ServerConfig {
            bind: args.bind.clone(),
            secret_key: args.secret_key.clone(),
            max_upload_bytes: args.max_upload_bytes,
        };
        config
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.suggest.api_key.is_some()
    }

    pub fn uses_default_secret(&self) -> bool {
        self.server.secret_key == DEFAULT_SECRET_KEY
    }
}

pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
}
