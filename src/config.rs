use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assemble::{AuthorText, DEFAULT_AUTHOR, DEFAULT_AUTHOR_LINE};
use crate::classify::DEFAULT_ID_PREFIX;
use crate::error::{Error, Result};
use crate::model::{AuthorLayout, DEFAULT_SUFFIX, NamingPolicy, StyleChoice};

/// Threshold used when the word gate is enabled without an explicit value.
pub const DEFAULT_MIN_WORDS: usize = 800;

/// What happens to a document below the word-count threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LowWordAction {
    /// Process it, prefixing the output name with the low-word-count marker.
    #[default]
    Mark,
    /// Copy the source into `字数不足{N}字/` and skip processing.
    Move,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub style: StyleChoice,
    pub suffix_enabled: bool,
    pub suffix_text: String,
    pub show_author_info: bool,
    pub keep_image_position: bool,
    pub author_layout: AuthorLayout,
    /// Author sentence template; `{name}` is replaced by the author.
    pub author_line: String,
    pub default_author: String,
    pub id_prefix: String,
    /// Word-count gate threshold; `None` disables the gate.
    pub min_words: Option<usize>,
    pub low_word_action: LowWordAction,
    /// Worker threads; `None` uses one per CPU.
    pub jobs: Option<usize>,
    pub report: Option<PathBuf>,
    /// `soffice` executable used to convert legacy `.doc` files.
    pub libreoffice: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: StyleChoice::Default,
            suffix_enabled: true,
            suffix_text: DEFAULT_SUFFIX.to_string(),
            show_author_info: true,
            keep_image_position: true,
            author_layout: AuthorLayout::Parenthesized,
            author_line: DEFAULT_AUTHOR_LINE.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            min_words: None,
            low_word_action: LowWordAction::Mark,
            jobs: None,
            report: None,
            libreoffice: None,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::InputNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.author_line.contains("{name}") {
            return Err(Error::Config("author_line must contain {name}".into()));
        }
        if self.jobs == Some(0) {
            return Err(Error::Config("jobs must be at least 1".into()));
        }
        if self.id_prefix.chars().any(|c| !c.is_ascii_digit()) {
            return Err(Error::Config(format!(
                "id_prefix must be digits, got {:?}",
                self.id_prefix
            )));
        }
        Ok(())
    }

    /// Naming policy for one file; `low_words` is the word gate's verdict.
    pub fn naming_policy(&self, low_words: bool) -> NamingPolicy {
        NamingPolicy {
            suffix_enabled: self.suffix_enabled,
            suffix_text: self.suffix_text.clone(),
            show_author_info: self.show_author_info,
            mark_low_wordcount: low_words && self.low_word_action == LowWordAction::Mark,
            keep_image_position: self.keep_image_position,
            author_layout: self.author_layout,
        }
    }

    pub fn author_text(&self) -> AuthorText {
        AuthorText {
            line: self.author_line.clone(),
            default_name: self.default_author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"style": "formal", "min_words": 500}"#).unwrap();
        assert_eq!(config.style, StyleChoice::Formal);
        assert_eq!(config.min_words, Some(500));
        assert_eq!(config.default_author, "佚名");
        assert!(config.suffix_enabled);
    }

    #[test]
    fn author_line_without_placeholder_is_rejected() {
        let err = Config::from_json(r#"{"author_line": "作者"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn move_action_never_marks() {
        let config = Config {
            low_word_action: LowWordAction::Move,
            ..Config::default()
        };
        assert!(!config.naming_policy(true).mark_low_wordcount);
        assert!(Config::default().naming_policy(true).mark_low_wordcount);
    }
}
