//! Server-rendered HTML for the upload form and the result page.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt::Write as _;

use crate::config::ALLOWED_EXTENSIONS;
use crate::error::SkippedFile;
use crate::report::Report;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#1d232a}\
h1{font-size:1.6rem}section{margin:1.5rem 0}\
pre{white-space:pre-wrap;background:#f4f6f8;padding:1rem;border-radius:6px;max-height:24rem;overflow:auto}\
table{border-collapse:collapse}td,th{padding:.25rem .75rem;text-align:left;border-bottom:1px solid #dde2e7}\
.error{color:#a4161a}.muted{color:#6c757d}.tag{display:inline-block;background:#e7f0fb;border-radius:4px;padding:0 .4rem;margin:.1rem}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{}</style></head><body>{}</body></html>",
        escape_html(title),
        STYLE,
        body
    )
}

fn upload_form(token: &str) -> String {
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\
         <input type=\"hidden\" name=\"csrf_token\" value=\"{}\">\
         <input type=\"file\" name=\"files\" accept=\"{}\" multiple required> \
         <button type=\"submit\">Extract &amp; analyze</button></form>",
        escape_html(token),
        accept
    )
}

fn skipped_list(skipped: &[SkippedFile]) -> String {
    if skipped.is_empty() {
        return String::new();
    }
    let mut html = String::from("<section><h2>Skipped files</h2><ul>");
    for file in skipped {
        let _ = write!(html, "<li class=\"error\">{}</li>", escape_html(&file.reason));
    }
    html.push_str("</ul></section>");
    html
}

/// The upload form, optionally with an error from the previous attempt.
pub fn upload_page(token: &str, error: Option<&str>, skipped: &[SkippedFile]) -> String {
    let mut body = String::from("<h1>Doc Insights</h1>");
    let _ = write!(
        body,
        "<p class=\"muted\">Upload PDFs or images ({}) to extract their text and get post insights.</p>",
        ALLOWED_EXTENSIONS.join(", ")
    );
    if let Some(error) = error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape_html(error));
    }
    body.push_str(&skipped_list(skipped));
    body.push_str(&upload_form(token));
    layout("Doc Insights", &body)
}

pub fn report_page(report: &Report, token: &str) -> serde_json::Result<String> {
    let json = report.to_json()?;
    let analysis = &report.analysis;
    let mut body = String::from("<h1>Doc Insights</h1>");
    body.push_str(&upload_form(token));

    let _ = write!(
        body,
        "<p><a download=\"doc-insights-report.json\" href=\"data:application/json;base64,{}\">Download JSON report</a></p>",
        STANDARD.encode(json.as_bytes())
    );

    body.push_str(&skipped_list(&report.skipped));

    body.push_str("<section><h2>Summary</h2><table>");
    let sentiment = &analysis.sentiment;
    let rows = [
        (
            "Words",
            escape_html(&format!("{} ({})", analysis.word_count, analysis.insights.length.message())),
        ),
        ("Characters", analysis.char_count.to_string()),
        (
            "Average word length",
            escape_html(&format!(
                "{} ({})",
                analysis.average_word_length,
                analysis.insights.readability.message()
            )),
        ),
        ("Hashtags", tags(&analysis.hashtags)),
        ("Mentions", tags(&analysis.mentions)),
        ("Links", tags(&analysis.urls)),
        ("Tone", report.tone.to_string()),
        (
            "Sentiment",
            format!(
                "compound {:.3} ({}), positive {:.3}, neutral {:.3}, negative {:.3}",
                sentiment.compound,
                sentiment.label,
                sentiment.positive,
                sentiment.neutral,
                sentiment.negative
            ),
        ),
    ];
    for (label, value) in rows {
        let _ = write!(body, "<tr><th>{}</th><td>{}</td></tr>", label, value);
    }
    body.push_str("</table><ul>");
    for note in analysis.insights.notes() {
        let _ = write!(body, "<li>{}</li>", escape_html(&note));
    }
    body.push_str("</ul></section>");

    body.push_str("<section><h2>Top keywords</h2><ol>");
    for keyword in &analysis.top_keywords {
        let _ = write!(
            body,
            "<li>{} <span class=\"muted\">({})</span></li>",
            escape_html(&keyword.keyword),
            keyword.frequency
        );
    }
    body.push_str("</ol></section>");

    if let Some(suggestions) = &report.suggestions {
        body.push_str("<section><h2>AI suggestions</h2>");
        let _ = write!(
            body,
            "<p><strong>Caption:</strong> {}</p><p>{}</p><h3>Engagement ideas</h3><ol>",
            escape_html(&suggestions.caption),
            tags(&suggestions.hashtags)
        );
        for idea in &suggestions.engagement_ideas {
            let _ = write!(body, "<li>{}</li>", escape_html(idea));
        }
        body.push_str("</ol>");
        if let Some(tone) = suggestions.tone {
            let _ = write!(body, "<p class=\"muted\">Model tone: {}</p>", tone);
        }
        if let Some(confidence) = suggestions.confidence {
            let _ = write!(body, "<p class=\"muted\">Model confidence: {:.2}</p>", confidence);
        }
        body.push_str("</section>");
    }

    body.push_str("<section><h2>Extracted text</h2>");
    for file in &report.files {
        let method = if file.used_ocr { "OCR" } else { "text layer" };
        let _ = write!(
            body,
            "<h3>{} <span class=\"muted\">({} page(s), {})</span></h3><pre>{}</pre>",
            escape_html(&file.filename),
            file.pages.len(),
            method,
            escape_html(&file.text)
        );
    }
    body.push_str("</section>");

    Ok(layout("Doc Insights - results", &body))
}

fn tags(values: &[String]) -> String {
    if values.is_empty() {
        return "<span class=\"muted\">none</span>".to_string();
    }
    values
        .iter()
        .map(|v| format!("<span class=\"tag\">{}</span>", escape_html(v)))
        .collect::<Vec<_>>()
        .join(" ")
}
