use crate::error::{CoreError, LlmError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Placeholder used for any persona section the model response did not provide.
pub const NOT_DETERMINED: &str = "Not determined";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Post => "POST",
            ItemKind::Comment => "COMMENT",
        }
    }
}

/// One scraped post or comment, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub kind: ItemKind,
    pub id: String,
    pub text: String,
    pub subreddit: String,
    pub timestamp: DateTime<Utc>,
    pub permalink: String,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelName {
    #[default]
    #[serde(rename = "llama3-70b-8192")]
    Llama3_70b,
    #[serde(rename = "llama3-8b-8192")]
    Llama3_8b,
    #[serde(rename = "mixtral-8x7b-32768")]
    Mixtral8x7b,
}

impl ModelName {
    pub const ALL: [ModelName; 3] = [
        ModelName::Llama3_70b,
        ModelName::Llama3_8b,
        ModelName::Mixtral8x7b,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Llama3_70b => "llama3-70b-8192",
            ModelName::Llama3_8b => "llama3-8b-8192",
            ModelName::Mixtral8x7b => "mixtral-8x7b-32768",
        }
    }

    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                CoreError::Llm(LlmError::InvalidModel {
                    model: wanted.to_string(),
                })
            })
    }
}

/// Parameters of one analysis run, validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub profile_identifier: String,
    pub depth: usize,
    pub model: ModelName,
    pub output_dir: PathBuf,
}

impl RunConfig {
    pub const DEFAULT_DEPTH: i64 = 100;
    pub const DEFAULT_OUTPUT_DIR: &'static str = "output";

    pub fn new(
        profile_identifier: impl Into<String>,
        depth: i64,
        model: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, CoreError> {
        let profile_identifier = profile_identifier.into();
        if profile_identifier.trim().is_empty() {
            return Err(CoreError::invalid_input("profile identifier is empty"));
        }
        if depth <= 0 {
            return Err(CoreError::invalid_input(format!(
                "depth must be a positive integer, got {}",
                depth
            )));
        }
        let model = model.parse::<ModelName>()?;

        Ok(Self {
            profile_identifier,
            depth: depth as usize,
            model,
            output_dir: output_dir.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Interests,
    Traits,
    Tone,
    Values,
    EngagementPattern,
    Quotes,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Interests,
        Section::Traits,
        Section::Tone,
        Section::Values,
        Section::EngagementPattern,
        Section::Quotes,
    ];

    /// Heading used in prompts and in the text report.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Interests => "Core Interests",
            Section::Traits => "Personality Traits",
            Section::Tone => "Communication Tone",
            Section::Values => "Core Values",
            Section::EngagementPattern => "Engagement Pattern",
            Section::Quotes => "Notable Quotes",
        }
    }
}

/// Non-fatal parse problem attached to a profile instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartialParseWarning {
    EmptyResponse,
    MissingSection { section: Section },
    EmptySection { section: Section },
    UnverifiedQuote { text: String },
}

impl fmt::Display for PartialParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialParseWarning::EmptyResponse => write!(f, "model returned an empty response"),
            PartialParseWarning::MissingSection { section } => {
                write!(f, "section '{}' not found", section.title())
            }
            PartialParseWarning::EmptySection { section } => {
                write!(f, "section '{}' was empty", section.title())
            }
            PartialParseWarning::UnverifiedQuote { text } => {
                write!(f, "quote could not be traced to a fetched item: \"{}\"", text)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub source_item_id: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub interests: Vec<String>,
    pub traits: Vec<String>,
    #[serde(rename = "tone")]
    pub tone_description: String,
    pub values: Vec<String>,
    pub engagement_pattern: String,
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub warnings: Vec<PartialParseWarning>,
}

impl PersonaProfile {
    pub fn unverified_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter().filter(|q| !q.verified)
    }

    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Run metadata carried into both report artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub username: String,
    pub model: ModelName,
    pub item_count: usize,
    pub post_count: usize,
    pub comment_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl ReportMeta {
    pub fn new(username: &str, model: ModelName, items: &[ContentItem]) -> Self {
        let post_count = items.iter().filter(|i| i.kind == ItemKind::Post).count();
        Self {
            username: username.to_string(),
            model,
            item_count: items.len(),
            post_count,
            comment_count: items.len() - post_count,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorExt, ErrorKind};

    #[test]
    fn test_model_name_parsing() {
        assert_eq!(
            "llama3-8b-8192".parse::<ModelName>().unwrap(),
            ModelName::Llama3_8b
        );
        assert_eq!(
            " mixtral-8x7b-32768 ".parse::<ModelName>().unwrap(),
            ModelName::Mixtral8x7b
        );
        assert_eq!(ModelName::default().as_str(), "llama3-70b-8192");

        let err = "gpt-4".parse::<ModelName>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidModel);
    }

    #[test]
    fn test_run_config_validation() {
        let config = RunConfig::new("kojied", 100, "llama3-8b-8192", "output").unwrap();
        assert_eq!(config.depth, 100);
        assert_eq!(config.model, ModelName::Llama3_8b);
        assert_eq!(config.output_dir, PathBuf::from("output"));

        for depth in [0, -1, -500] {
            let err = RunConfig::new("kojied", depth, "llama3-8b-8192", "output").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        let err = RunConfig::new("kojied", 10, "not-a-model", "output").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidModel);

        let err = RunConfig::new("  ", 10, "llama3-8b-8192", "output").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_report_meta_counts() {
        let item = |kind, id: &str| ContentItem {
            kind,
            id: id.to_string(),
            text: "text".to_string(),
            subreddit: "rust".to_string(),
            timestamp: Utc::now(),
            permalink: String::new(),
            score: 1,
        };
        let items = vec![
            item(ItemKind::Post, "a"),
            item(ItemKind::Comment, "b"),
            item(ItemKind::Comment, "c"),
        ];
        let meta = ReportMeta::new("kojied", ModelName::Llama3_8b, &items);
        assert_eq!(meta.item_count, 3);
        assert_eq!(meta.post_count, 1);
        assert_eq!(meta.comment_count, 2);
    }
}
