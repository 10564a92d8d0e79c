use clap::{Args, Parser};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_OCR_TIMEOUT_SECS, DEFAULT_SUGGESTION_CHAR_CAP,
    DEFAULT_SUGGESTION_TIMEOUT_SECS, DEFAULT_TOP_KEYWORDS, DIRECT_TEXT_MIN_CHARS,
};

/// Settings shared by the server and the batch tool.
///
/// Every option can also come from the environment (or a `.env` file).
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Keep line breaks as found instead of collapsing whitespace
    #[arg(long, env = "PRESERVE_FORMATTING", default_value_t = true, action = clap::ArgAction::Set,
          value_parser = clap::builder::BoolishValueParser::new())]
    pub preserve_formatting: bool,

    /// Number of files extracted concurrently
    #[arg(short, long, env = "WORKERS", default_value = "4")]
    pub workers: usize,

    /// Tesseract binary
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    pub tesseract_cmd: PathBuf,

    /// Directory containing the Poppler `pdftoppm` binary
    #[arg(long, env = "POPPLER_PATH")]
    pub poppler_path: Option<PathBuf>,

    /// Upper bound for a single rasterization or OCR run
    #[arg(long, env = "OCR_TIMEOUT_SECS", default_value_t = DEFAULT_OCR_TIMEOUT_SECS)]
    pub ocr_timeout_secs: u64,

    /// Pages with at most this many direct-text characters fall back to OCR
    #[arg(long, env = "DIRECT_TEXT_MIN_CHARS", default_value_t = DIRECT_TEXT_MIN_CHARS)]
    pub direct_text_min_chars: usize,

    /// Number of ranked keywords
    #[arg(long, env = "TOP_KEYWORDS", default_value_t = DEFAULT_TOP_KEYWORDS)]
    pub top_keywords: usize,

    /// Gemini API key; suggestions are disabled without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    /// Characters of extracted text sent to the suggestion API
    #[arg(long, env = "SUGGESTION_CHAR_CAP", default_value_t = DEFAULT_SUGGESTION_CHAR_CAP)]
    pub suggestion_char_cap: usize,

    /// Request timeout for the suggestion API
    #[arg(long, env = "SUGGESTION_TIMEOUT_SECS", default_value_t = DEFAULT_SUGGESTION_TIMEOUT_SECS)]
    pub suggestion_timeout_secs: u64,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "doc-insights")]
#[command(about = "Upload PDFs and images, extract text and get text insights")]
#[command(version)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Secret used to sign upload form tokens
    #[arg(long, env = "SECRET_KEY", default_value = "devkey", hide_env_values = true)]
    pub secret_key: String,

    /// Maximum size of an upload request body
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "doc-insights-batch")]
#[command(about = "Extract and analyze local PDFs and images into a JSON report")]
#[command(version)]
pub struct BatchArgs {
    /// Files or directories to process (directories are searched recursively)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the suggestion API even when a key is configured
    #[arg(long)]
    pub no_suggestions: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}
