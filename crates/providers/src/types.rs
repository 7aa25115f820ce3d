//! Gemini `generateContent` wire types.
//!
//! The same `contents` shape is used by the inbound chat endpoint and by the
//! outbound upstream call.

use serde::{Deserialize, Deserializer, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Total characters across every text part of every turn.
    pub fn char_count(&self) -> usize {
        self.contents.iter().map(Content::char_count).sum()
    }
}

/// One turn: `{ role, parts: [{ text }] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_owned(),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }

    /// Concatenated text of all text parts, or `None` when there are none.
    pub fn joined_text(&self) -> Option<String> {
        let mut texts = self.parts.iter().filter_map(|p| p.text.as_deref()).peekable();
        texts.peek()?;
        Some(texts.collect())
    }

    pub fn char_count(&self) -> usize {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .map(|t| t.chars().count())
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub safety_ratings: Vec<SafetyRating>,
}

impl Candidate {
    /// Highest probability among this candidate's safety ratings, or `None`
    /// when it carries no ratings.
    pub fn safety_score(&self) -> Option<f64> {
        self.safety_ratings
            .iter()
            .map(|r| r.probability.score())
            .fold(None, |max, s| match max {
                Some(m) if m >= s => Some(m),
                _ => Some(s),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRating {
    #[serde(default)]
    pub category: String,
    pub probability: Probability,
}

/// A safety probability, either numeric or one of Gemini's level names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Probability {
    Score(f64),
    Level(String),
}

impl Probability {
    /// Numeric rank used for ordering.  Levels map to
    /// `NEGLIGIBLE`=0, `LOW`=1, `MEDIUM`=2, `HIGH`=3; unknown levels rank 0.
    pub fn score(&self) -> f64 {
        match self {
            Self::Score(s) => *s,
            Self::Level(level) => match level.as_str() {
                "LOW" => 1.0,
                "MEDIUM" => 2.0,
                "HIGH" => 3.0,
                _ => 0.0,
            },
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
