use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use image::{imageops, DynamicImage, GrayImage, ImageFormat};
use log::{debug, error, info};
use std::ffi::OsString;
use std::io::Cursor;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

use crate::config::OcrConfig;
use crate::error::ConfigError;

/// Turns images, or single PDF pages, into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn ocr_image(&self, image: DynamicImage) -> Result<String>;

    /// Rasterize `page_number` (1-based) of `pdf` and OCR it.
    async fn ocr_pdf_page(&self, pdf: &[u8], page_number: u32) -> Result<String>;
}

/// OCR through the `tesseract` and Poppler `pdftoppm` command line tools.
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Check that both external tools can be started.
    pub async fn check_tools(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if let Err(e) = self.probe_tool(&self.config.tesseract_cmd, "--version").await {
            error!("Tesseract not found. Install with: apt install tesseract-ocr");
            problems.push(ConfigError::ToolUnavailable {
                tool: "tesseract",
                path: self.config.tesseract_cmd.clone(),
                reason: format!("{:#}", e),
            });
        }

        let pdftoppm = self.config.pdftoppm_cmd();
        if let Err(e) = self.probe_tool(&pdftoppm, "-v").await {
            error!("pdftoppm not found. Install with: apt install poppler-utils");
            problems.push(ConfigError::ToolUnavailable {
                tool: "pdftoppm",
                path: pdftoppm,
                reason: format!("{:#}", e),
            });
        }

        problems
    }

    /// Only launching matters here: old Poppler releases exit non-zero on `-v`.
    async fn probe_tool(&self, program: &Path, arg: &str) -> Result<()> {
        let mut command = Command::new(program);
        command.arg(arg).kill_on_drop(true);
        tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| anyhow!("{} did not respond", program.display()))?
            .with_context(|| format!("Failed to run {}", program.display()))?;
        Ok(())
    }

    async fn run_tool(&self, program: &Path, args: &[OsString]) -> Result<Output> {
        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| {
                anyhow!(
                    "{} timed out after {:?}",
                    program.display(),
                    self.config.timeout
                )
            })?
            .with_context(|| format!("Failed to run {}", program.display()))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} failed: {}",
                program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(output)
    }

    async fn tesseract_file(&self, image_path: &Path) -> Result<String> {
        let mut args: Vec<OsString> = vec![
            image_path.as_os_str().to_owned(),
            "stdout".into(),
            "-l".into(),
            self.config.language.clone().into(),
            "--oem".into(),
            "3".into(),
            "--psm".into(),
            "6".into(),
        ];
        if self.config.preserve_interword_spaces {
            args.push("-c".into());
            args.push("preserve_interword_spaces=1".into());
        }

        let output = self.run_tool(&self.config.tesseract_cmd, &args).await?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn tesseract_png(&self, png: &[u8]) -> Result<String> {
        let temp_dir = tempfile::tempdir()?;
        let image_path = temp_dir.path().join("ocr_input.png");
        tokio::fs::write(&image_path, png).await?;
        self.tesseract_file(&image_path).await
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn ocr_image(&self, image: DynamicImage) -> Result<String> {
        let png = tokio::task::spawn_blocking(move || encode_for_ocr(&image))
            .await
            .context("Image preprocessing task failed")??;
        self.tesseract_png(&png).await
    }

    async fn ocr_pdf_page(&self, pdf: &[u8], page_number: u32) -> Result<String> {
        info!("Rasterizing page {} at {} DPI for OCR", page_number, self.config.dpi);

        let temp_dir = tempfile::tempdir()?;
        let pdf_path = temp_dir.path().join("input.pdf");
        let image_prefix = temp_dir.path().join("page");
        tokio::fs::write(&pdf_path, pdf).await?;

        let page = page_number.to_string();
        let args: Vec<OsString> = vec![
            "-f".into(),
            page.clone().into(),
            "-l".into(),
            page.into(),
            "-r".into(),
            self.config.dpi.to_string().into(),
            "-png".into(),
            "-singlefile".into(),
            pdf_path.as_os_str().to_owned(),
            image_prefix.as_os_str().to_owned(),
        ];
        self.run_tool(&self.config.pdftoppm_cmd(), &args).await?;

        let rasterized = tokio::fs::read(image_prefix.with_extension("png"))
            .await
            .context("pdftoppm produced no image")?;
        let png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let image =
                image::load_from_memory(&rasterized).context("Failed to decode rasterized page")?;
            debug!("Page {} rasterized to {}x{}", page_number, image.width(), image.height());
            encode_for_ocr(&image)
        })
        .await
        .context("Page preprocessing task failed")??;

        self.tesseract_png(&png).await
    }
}

/// Preprocess and PNG-encode an image for Tesseract. CPU bound; callers run
/// it on the blocking pool.
pub fn encode_for_ocr(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    DynamicImage::ImageLuma8(prepare_for_ocr(image))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode image for OCR")?;
    Ok(png)
}

/// Gentle clean-up that helps Tesseract without eating thin strokes:
/// grayscale, stretch contrast, sharpen, then push near-white to white and
/// near-black to black.
pub fn prepare_for_ocr(image: &DynamicImage) -> GrayImage {
    let mut gray = image.to_luma8();
    autocontrast(&mut gray);
    let mut gray = imageops::unsharpen(&gray, 1.0, 2);

    for pixel in gray.pixels_mut() {
        let value = pixel.0[0];
        pixel.0[0] = if value > 200 {
            255
        } else if value < 80 {
            0
        } else {
            value
        };
    }
    gray
}

fn autocontrast(gray: &mut GrayImage) {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if max <= min {
        return;
    }

    let range = u32::from(max - min);
    for pixel in gray.pixels_mut() {
        let value = u32::from(pixel.0[0] - min);
        pixel.0[0] = (value * 255 / range) as u8;
    }
}
