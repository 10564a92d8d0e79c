#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use doc_insights::config::{AppConfig, ExtractConfig};
use doc_insights::ocr::OcrEngine;
use doc_insights::{Extractor, Pipeline, SuggestionClient};
use image::{DynamicImage, GrayImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// OCR stand-in that returns canned text and records which pages it saw.
#[derive(Default)]
pub struct FakeOcr {
    pub text: String,
    pub fail: bool,
    pub image_calls: AtomicUsize,
    pub pages: Mutex<Vec<u32>>,
}

impl FakeOcr {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn ocr_pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn ocr_image(&self, _image: DynamicImage) -> Result<String> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("tesseract exploded"));
        }
        Ok(self.text.clone())
    }

    async fn ocr_pdf_page(&self, _pdf: &[u8], page_number: u32) -> Result<String> {
        self.pages.lock().unwrap().push(page_number);
        if self.fail {
            return Err(anyhow!("pdftoppm exploded"));
        }
        Ok(self.text.clone())
    }
}

pub fn extractor(ocr: Arc<FakeOcr>, preserve_formatting: bool) -> Extractor {
    Extractor::new(
        ExtractConfig {
            preserve_formatting,
            ..ExtractConfig::default()
        },
        ocr,
    )
}

/// Pipeline with fake OCR and suggestions disabled.
pub fn pipeline(ocr: Arc<FakeOcr>) -> Pipeline {
    let config = AppConfig::default();
    Pipeline::new(
        Extractor::new(config.extract.clone(), ocr),
        SuggestionClient::new(config.suggest.clone()).unwrap(),
        config.analyzer.clone(),
    )
}

fn page_dict(pages_id: ObjectId, content_id: ObjectId, resources_id: ObjectId) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    }
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>) -> Vec<u8> {
    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A digital PDF with one page per entry; an empty entry gives a page with
/// no text layer at all.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 36.into()]),
                Operation::new("Td", vec![60.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(page_dict(pages_id, content_id, resources_id));
        kids.push(page_id.into());
    }

    finish(doc, pages_id, kids)
}

/// A single-page PDF whose only content is a grayscale picture, like a scan.
pub fn image_pdf(image: &GrayImage) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let (width, height) = image.dimensions();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im1" => image_id,
        },
    });

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![595.into(), 0.into(), 0.into(), 842.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(page_dict(pages_id, content_id, resources_id));

    finish(doc, pages_id, vec![page_id.into()])
}

pub fn png_bytes(image: &GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
