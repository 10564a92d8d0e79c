use serde::Serialize;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound scores at or above this are positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Compound scores at or below this are negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_compound(score: f64) -> Self {
        if score >= POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Parse a label as written by people or models ("Positive", "negative").
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "neutral" => Some(SentimentLabel::Neutral),
            "negative" => Some(SentimentLabel::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentiment {
    /// VADER compound score in [-1, 1].
    pub compound: f64,
    pub label: SentimentLabel,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// Score text with the VADER lexicon.
pub fn score(text: &str) -> Sentiment {
    if text.trim().is_empty() {
        return Sentiment {
            compound: 0.0,
            label: SentimentLabel::Neutral,
            positive: 0.0,
            neutral: 0.0,
            negative: 0.0,
        };
    }

    let analyzer = SentimentIntensityAnalyzer::new();
    let scores = analyzer.polarity_scores(text);
    let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);

    let compound = get("compound").clamp(-1.0, 1.0);
    Sentiment {
        compound,
        label: SentimentLabel::from_compound(compound),
        positive: get("pos"),
        neutral: get("neu"),
        negative: get("neg"),
    }
}
