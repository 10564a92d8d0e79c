//! Text metrics for the combined extracted text.
//!
//! Everything here is a pure function of the input text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::config::AnalyzerOptions;
use crate::sentiment::{self, Sentiment};

/// Keywords shorter than this are ignored.
pub const MIN_KEYWORD_LEN: usize = 3;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("valid hashtag pattern"));
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("valid mention pattern"));
static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:https?://|www\.)[^\s<>"]+"#).expect("valid url pattern")
});

const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ']', '}', '\'', '"'];

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did",
        "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "few",
        "for", "from", "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having",
        "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in",
        "into", "is", "isn't", "it", "it's", "its", "itself", "just", "let's", "me", "more",
        "most", "mustn't", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
        "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
        "shan't", "she", "should", "shouldn't", "so", "some", "such", "than", "that", "that's",
        "the", "their", "theirs", "them", "themselves", "then", "there", "there's", "these",
        "they", "they're", "this", "those", "through", "to", "too", "under", "until", "up",
        "very", "was", "wasn't", "we", "we're", "were", "weren't", "what", "what's", "when",
        "where", "which", "while", "who", "who's", "whom", "why", "will", "with", "won't",
        "would", "wouldn't", "you", "you're", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub keyword: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBand {
    VeryShort,
    Medium,
    Long,
}

impl LengthBand {
    pub fn from_word_count(words: usize) -> Self {
        if words < 50 {
            LengthBand::VeryShort
        } else if words > 300 {
            LengthBand::Long
        } else {
            LengthBand::Medium
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LengthBand::VeryShort => "very short, may lack context",
            LengthBand::Medium => "medium length, good for LinkedIn",
            LengthBand::Long => "long, consider trimming for attention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readability {
    Easy,
    Moderate,
    Complex,
}

impl Readability {
    pub fn from_average_word_length(average: f64) -> Self {
        if average < 5.0 {
            Readability::Easy
        } else if average < 7.0 {
            Readability::Moderate
        } else {
            Readability::Complex
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Readability::Easy => "easy to read",
            Readability::Moderate => "moderate complexity",
            Readability::Complex => "complex, may reduce engagement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HashtagUsage {
    Missing,
    Few,
    Good,
}

impl HashtagUsage {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => HashtagUsage::Missing,
            1 | 2 => HashtagUsage::Few,
            _ => HashtagUsage::Good,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            HashtagUsage::Missing => "missing hashtags",
            HashtagUsage::Few => "could add more hashtags for reach",
            HashtagUsage::Good => "good use of hashtags",
        }
    }
}

/// Plain-language hints about how the text would read as a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub length: LengthBand,
    pub readability: Readability,
    pub hashtags: HashtagUsage,
    pub tags_collaborators: bool,
    pub link_heavy: bool,
}

impl Insights {
    pub fn notes(&self) -> Vec<String> {
        let mut notes = vec![
            format!("Length: {}", self.length.message()),
            format!("Readability: {}", self.readability.message()),
            format!("Hashtags: {}", self.hashtags.message()),
        ];
        if self.tags_collaborators {
            notes.push("Mentions: strong collaboration tagging".to_string());
        }
        if self.link_heavy {
            notes.push("Links: may appear promotional if all are kept".to_string());
        }
        notes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub word_count: usize,
    pub char_count: usize,
    pub average_word_length: f64,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub urls: Vec<String>,
    pub top_keywords: Vec<Keyword>,
    pub sentiment: Sentiment,
    pub insights: Insights,
}

pub fn analyze(text: &str, options: &AnalyzerOptions) -> AnalysisResult {
    let word_count = text.split_whitespace().count();
    let hashtags = unique_matches(&HASHTAG, text);
    let mentions = unique_matches(&MENTION, text);
    let urls = extract_urls(text);
    let average_word_length = average_word_length(text);

    let insights = Insights {
        length: LengthBand::from_word_count(word_count),
        readability: Readability::from_average_word_length(average_word_length),
        hashtags: HashtagUsage::from_count(hashtags.len()),
        tags_collaborators: !mentions.is_empty(),
        link_heavy: urls.len() > 2,
    };

    AnalysisResult {
        word_count,
        char_count: text.chars().count(),
        average_word_length,
        top_keywords: top_keywords(text, options.top_keywords),
        sentiment: sentiment::score(text),
        hashtags,
        mentions,
        urls,
        insights,
    }
}

fn unique_matches(pattern: &Regex, text: &str) -> Vec<String> {
    dedup_in_order(pattern.find_iter(text).map(|m| m.as_str().to_string()))
}

pub fn extract_urls(text: &str) -> Vec<String> {
    dedup_in_order(
        URL.find_iter(text)
            .map(|m| trim_url(m.as_str()).to_string())
            .filter(|url| !url.is_empty()),
    )
}

/// Drop sentence punctuation after a URL. A closing paren is kept while it
/// balances an opening one inside the URL.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(URL_TRAILING_PUNCTUATION);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(rest) if rest.matches(')').count() >= rest.matches('(').count() => rest,
            _ => trimmed,
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

/// Case-sensitive, keeps the first occurrence of each value.
fn dedup_in_order<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Lower-case a token and keep only letters, digits and inner apostrophes.
fn normalize_token(token: &str) -> String {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '\u{2019}')
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.trim_matches('\'').to_string()
}

fn is_url_token(token: &str) -> bool {
    URL.is_match(token)
}

fn average_word_length(text: &str) -> f64 {
    let lengths: Vec<usize> = text
        .split_whitespace()
        .filter(|t| !is_url_token(t))
        .map(|t| normalize_token(t).chars().count())
        .filter(|&len| len > 0)
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    let average = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    (average * 100.0).round() / 100.0
}

/// Most frequent non-stopword tokens; ties go to the word seen first.
pub fn top_keywords(text: &str, limit: usize) -> Vec<Keyword> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in text.split_whitespace().filter(|t| !is_url_token(t)) {
        let word = normalize_token(token);
        if word.chars().count() < MIN_KEYWORD_LEN || STOPWORDS.contains(word.as_str()) {
            continue;
        }
        match index.get(&word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word.clone(), counts.len());
                counts.push((word, 1));
            }
        }
    }

    // stable sort keeps first-occurrence order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(keyword, frequency)| Keyword { keyword, frequency })
        .collect()
}
