//! Paragraph role classification.
//!
//! Roles come from an ordered rule table evaluated per paragraph in source
//! order; the first rule whose predicate holds assigns the role. Author names
//! are pulled from id lines as a side effect of the id-line rule.

mod heading;

pub use heading::heading_level;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{ClassificationResult, Paragraph, ParagraphRole};

pub const DEFAULT_ID_PREFIX: &str = "852";

#[derive(Clone, Debug)]
pub struct ClassifierOptions {
    pub show_author_info: bool,
    /// Sub-classify body text into headings (formal template only).
    pub detect_headings: bool,
    /// Leading digits that mark a student-id line.
    pub id_prefix: String,
    /// Author already known before reading the body, e.g. from the filename.
    pub known_author: Option<String>,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            show_author_info: true,
            detect_headings: false,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            known_author: None,
        }
    }
}

struct State {
    title_seen: bool,
    author_emitted: bool,
}

struct Rule {
    name: &'static str,
    applies: fn(&Paragraph, &State, &Classifier) -> bool,
    role: fn(&Paragraph, &Classifier) -> ParagraphRole,
}

const RULES: &[Rule] = &[
    Rule {
        name: "empty",
        applies: |p, _, _| p.is_empty(),
        role: |_, _| ParagraphRole::Skip,
    },
    Rule {
        name: "title",
        applies: |_, s, _| !s.title_seen,
        role: |_, _| ParagraphRole::Title,
    },
    Rule {
        name: "id-line",
        applies: |p, _, c| c.is_id_line(p.text()),
        role: |_, _| ParagraphRole::Skip,
    },
    Rule {
        name: "author",
        applies: |_, s, c| c.options.show_author_info && !s.author_emitted,
        role: |_, _| ParagraphRole::Author,
    },
    Rule {
        name: "body",
        applies: |_, _, _| true,
        role: |p, c| c.body_role(p),
    },
];

pub struct Classifier {
    options: ClassifierOptions,
    id_hyphen_name: Regex,
    id_space_name: Regex,
}

impl Classifier {
    pub fn new(options: ClassifierOptions) -> Result<Self> {
        let prefix = regex::escape(&options.id_prefix);
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| Error::Config(format!("id prefix pattern: {e}")))
        };
        Ok(Self {
            id_hyphen_name: compile(format!(r"{prefix}\d*[^-]*-([^-\d\W]+)"))?,
            id_space_name: compile(format!(r"{prefix}\d*[\s-]*([^\d\W]+)"))?,
            options,
        })
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    fn is_id_line(&self, text: &str) -> bool {
        !self.options.id_prefix.is_empty() && text.starts_with(self.options.id_prefix.as_str())
    }

    /// Author name from an id line: `id-name` first, then `id name`.
    pub fn author_from_id_line(&self, text: &str) -> Option<String> {
        [&self.id_hyphen_name, &self.id_space_name]
            .iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }

    fn body_role(&self, paragraph: &Paragraph) -> ParagraphRole {
        if !self.options.detect_headings {
            return ParagraphRole::Body;
        }
        match heading_level(paragraph.text(), paragraph.style_name.as_deref()) {
            Some(level) => ParagraphRole::Heading(level),
            None => ParagraphRole::Body,
        }
    }

    pub fn classify(&self, paragraphs: &[Paragraph]) -> Result<ClassificationResult> {
        let mut state = State {
            title_seen: false,
            author_emitted: false,
        };
        let mut author = self.options.known_author.clone();
        let mut author_body = None;
        let mut roles = Vec::with_capacity(paragraphs.len());

        for (idx, paragraph) in paragraphs.iter().enumerate() {
            let Some(rule) = RULES.iter().find(|r| (r.applies)(paragraph, &state, self)) else {
                roles.push(ParagraphRole::Skip);
                continue;
            };
            let role = (rule.role)(paragraph, self);
            match rule.name {
                "title" => state.title_seen = true,
                "author" => {
                    state.author_emitted = true;
                    author_body = Some(self.body_role(paragraph));
                }
                "id-line" if author.is_none() => {
                    author = self.author_from_id_line(paragraph.text());
                    if let Some(name) = &author {
                        log::debug!("Author {name} from id line at paragraph {idx}");
                    }
                }
                _ => {}
            }
            log::trace!("paragraph {idx}: {} -> {role:?}", rule.name);
            roles.push(role);
        }

        if !state.title_seen {
            return Err(Error::NoTitleExtracted);
        }
        Ok(ClassificationResult {
            roles,
            author,
            author_body,
        })
    }
}

/// First author name found on any id line, for reporting.
pub fn find_author(classifier: &Classifier, paragraphs: &[Paragraph]) -> Option<String> {
    paragraphs
        .iter()
        .map(Paragraph::text)
        .filter(|t| classifier.is_id_line(t))
        .find_map(|t| classifier.author_from_id_line(t))
}
