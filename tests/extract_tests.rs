mod common;

use common::{extractor, image_pdf, png_bytes, text_pdf, FakeOcr};
use doc_insights::config::OcrConfig;
use doc_insights::error::{ExtractError, SkipKind};
use doc_insights::extractor::{FileKind, TextSource};
use doc_insights::ocr::TesseractOcr;
use doc_insights::{Extractor, UploadedFile};
use image::{GrayImage, Luma};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_digital_pdf_extracts_without_ocr() {
    let ocr = FakeOcr::returning("should not be used");
    let extractor = extractor(ocr.clone(), true);
    let file = UploadedFile::new("hello.pdf", text_pdf(&["Hello World"]));

    let result = extractor.extract(&file).await.unwrap();

    assert_eq!(result.kind, FileKind::Pdf);
    assert!(result.text.contains("Hello World"), "got {:?}", result.text);
    assert!(!result.used_ocr);
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].source, TextSource::Direct);
    assert!(ocr.ocr_pages().is_empty());
}

#[tokio::test]
async fn test_page_without_text_layer_falls_back_to_ocr() {
    let ocr = FakeOcr::returning("Scanned invoice total 42");
    let extractor = extractor(ocr.clone(), true);
    let file = UploadedFile::new("scan.pdf", text_pdf(&[""]));

    let result = extractor.extract(&file).await.unwrap();

    assert!(result.used_ocr);
    assert_eq!(result.text, "Scanned invoice total 42");
    assert_eq!(result.pages[0].source, TextSource::Ocr);
    assert_eq!(ocr.ocr_pages(), vec![1]);
}

#[tokio::test]
async fn test_only_insufficient_pages_are_ocred() {
    let ocr = FakeOcr::returning("text recovered by ocr");
    let extractor = extractor(ocr.clone(), true);
    let file = UploadedFile::new(
        "mixed.pdf",
        text_pdf(&["First page with real text", "", "Short"]),
    );

    let result = extractor.extract(&file).await.unwrap();

    let sources: Vec<TextSource> = result.pages.iter().map(|p| p.source).collect();
    assert_eq!(
        sources,
        vec![TextSource::Direct, TextSource::Ocr, TextSource::Ocr]
    );
    assert_eq!(ocr.ocr_pages(), vec![2, 3]);
    assert!(result.used_ocr);
    assert!(result.text.starts_with("First page with real text"));
    assert!(result.text.contains("text recovered by ocr"));
}

#[tokio::test]
async fn test_ocr_failure_keeps_direct_text() {
    let ocr = FakeOcr::failing();
    let extractor = extractor(ocr.clone(), true);
    let file = UploadedFile::new("scan.pdf", text_pdf(&["", "A readable second page"]));

    let result = extractor.extract(&file).await.unwrap();

    assert!(!result.used_ocr);
    assert_eq!(result.text, "A readable second page");
    assert_eq!(result.pages[0].text, "");
}

#[tokio::test]
async fn test_formatting_modes() {
    let scanned = text_pdf(&[""]);
    let ocr = FakeOcr::returning("line one   \nline two\n\n\n\nnext para");

    let preserved = extractor(ocr.clone(), true)
        .extract(&UploadedFile::new("a.pdf", scanned.clone()))
        .await
        .unwrap();
    assert_eq!(preserved.text, "line one\nline two\n\nnext para");

    let collapsed = extractor(ocr, false)
        .extract(&UploadedFile::new("a.pdf", scanned))
        .await
        .unwrap();
    assert_eq!(collapsed.text, "line one line two next para");
}

#[tokio::test]
async fn test_image_goes_straight_to_ocr() {
    let ocr = FakeOcr::returning("Text in a photo");
    let extractor = extractor(ocr.clone(), true);
    let png = png_bytes(&GrayImage::from_pixel(16, 16, Luma([255])));

    let result = extractor
        .extract(&UploadedFile::new("photo.PNG", png))
        .await
        .unwrap();

    assert_eq!(result.kind, FileKind::Image);
    assert!(result.used_ocr);
    assert_eq!(result.text, "Text in a photo");
    assert_eq!(ocr.image_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreadable_files() {
    let extractor = extractor(FakeOcr::returning("unused"), true);

    let err = extractor
        .extract(&UploadedFile::new("broken.pdf", b"this is not a pdf at all".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnreadableFile { ref filename, .. } if filename == "broken.pdf"));

    let err = extractor
        .extract(&UploadedFile::new("broken.jpg", b"not a jpeg".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnreadableFile { .. }));
}

#[tokio::test]
async fn test_unsupported_type_is_rejected() {
    let extractor = extractor(FakeOcr::returning("unused"), true);

    let err = extractor
        .extract(&UploadedFile::new("report.exe", vec![0x4d, 0x5a]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExtractError::UnsupportedFileType { ref extension, .. } if extension == "exe"
    ));
}

#[tokio::test]
async fn test_batch_skips_bad_files_and_keeps_order() {
    let extractor = extractor(FakeOcr::returning("unused"), true);
    let files = vec![
        UploadedFile::new("report.pdf", text_pdf(&["Quarterly report summary"])),
        UploadedFile::new("report.exe", vec![0x4d, 0x5a]),
        UploadedFile::new("broken.pdf", b"nope".to_vec()),
        UploadedFile::new("notes.pdf", text_pdf(&["Meeting notes for Monday"])),
    ];

    let batch = extractor.extract_all(files, None).await;

    let names: Vec<&str> = batch.files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["report.pdf", "notes.pdf"]);
    assert_eq!(batch.skipped.len(), 2);
    assert_eq!(batch.skipped[0].filename, "report.exe");
    assert_eq!(batch.skipped[0].kind, SkipKind::UnsupportedFileType);
    assert_eq!(batch.skipped[1].filename, "broken.pdf");
    assert_eq!(batch.skipped[1].kind, SkipKind::UnreadableFile);
    assert!(batch.combined_text.contains("Quarterly report summary\n\nMeeting notes for Monday"));
}

#[tokio::test]
async fn test_image_ocr_failure_skips_file() {
    let extractor = extractor(FakeOcr::failing(), true);
    let png = png_bytes(&GrayImage::from_pixel(8, 8, Luma([0])));

    let batch = extractor
        .extract_all(vec![UploadedFile::new("scan.jpeg", png)], None)
        .await;

    assert!(batch.files.is_empty());
    assert_eq!(batch.skipped[0].kind, SkipKind::UnreadableFile);
    assert!(batch.ensure_processed().is_err());
}

/// Runs only where Tesseract and Poppler are installed.
#[tokio::test]
async fn test_real_ocr_on_rasterized_pdf() {
    let ocr = TesseractOcr::new(OcrConfig::default());
    if !ocr.check_tools().await.is_empty() {
        eprintln!("skipping: tesseract/pdftoppm not installed");
        return;
    }

    // Render a digital page to pixels, then wrap the pixels in a new PDF
    // so the result has no text layer.
    let digital = text_pdf(&["HELLO WORLD"]);
    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("digital.pdf");
    std::fs::write(&pdf_path, &digital).unwrap();
    let status = std::process::Command::new("pdftoppm")
        .args(["-r", "100", "-gray", "-png", "-singlefile"])
        .arg(&pdf_path)
        .arg(dir.path().join("page"))
        .status()
        .unwrap();
    assert!(status.success());
    let page = image::open(dir.path().join("page.png")).unwrap().to_luma8();

    let extractor = Extractor::new(Default::default(), Arc::new(ocr));
    let result = extractor
        .extract(&UploadedFile::new("scanned.pdf", image_pdf(&page)))
        .await
        .unwrap();

    assert!(result.used_ocr);
    assert!(!result.text.trim().is_empty());
    assert!(result.text.to_uppercase().contains("HELLO"), "got {:?}", result.text);
}
