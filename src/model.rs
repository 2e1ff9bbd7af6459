use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub struct Run {
    pub text: String,
    /// Relation ids of images referenced from this run, in markup order.
    pub image_refs: Vec<String>,
}

pub struct Paragraph {
    /// Concatenated run text, untrimmed.
    pub raw_text: String,
    /// Display name of the paragraph style, when the package defines one.
    pub style_name: Option<String>,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn text(&self) -> &str {
        self.raw_text.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
}

pub struct TableRow {
    pub cells: Vec<TableCell>,
}

pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .flat_map(|c| c.paragraphs.iter())
    }
}

pub struct SourceDocument {
    /// Top-level body paragraphs in source order.
    pub paragraphs: Vec<Paragraph>,
    /// Top-level body tables; read for word counting only.
    pub tables: Vec<Table>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageRelation {
    pub id: String,
    /// Part name inside the package, e.g. `word/media/image1.png`.
    pub part: String,
    pub content_type: String,
}

impl ImageRelation {
    pub fn extension(&self) -> &'static str {
        let ct = self.content_type.to_ascii_lowercase();
        if ct.contains("png") {
            "png"
        } else if ct.contains("gif") {
            "gif"
        } else if ct.contains("tiff") {
            "tiff"
        } else if ct.contains("bmp") {
            "bmp"
        } else if ct.contains("emf") {
            "emf"
        } else if ct.contains("wmf") {
            "wmf"
        } else {
            "jpeg"
        }
    }
}

/// Image relations of the main document part, in relationship-file order.
#[derive(Clone, Debug, Default)]
pub struct RelationTable {
    pub relations: Vec<ImageRelation>,
}

impl RelationTable {
    pub fn get(&self, id: &str) -> Option<&ImageRelation> {
        self.relations.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphRole {
    Title,
    Subtitle,
    Author,
    Heading(u8),
    Body,
    ImageOnly,
    Skip,
}

#[derive(Clone, Debug, Default)]
pub struct ClassificationResult {
    /// One role per source paragraph, same indexing as `SourceDocument::paragraphs`.
    pub roles: Vec<ParagraphRole>,
    /// Author found in the filename or an id line; `None` if neither matched.
    pub author: Option<String>,
    /// Role of the Author paragraph's own text, which is kept after the
    /// synthesized author sentence.
    pub author_body: Option<ParagraphRole>,
}

impl ClassificationResult {
    pub fn title_index(&self) -> Option<usize> {
        self.roles.iter().position(|r| *r == ParagraphRole::Title)
    }
}

/// Paragraph index -> temporary image files, in run-encounter order.
pub type ImageAnchor = BTreeMap<usize, Vec<PathBuf>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentMetadata {
    pub author_name: Option<String>,
    pub original_title: String,
    pub used_default_author: bool,
    pub has_images: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleChoice {
    #[default]
    Default,
    /// Chinese official-document template; enables heading detection.
    Formal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorLayout {
    /// `(作者)标题`
    #[default]
    Parenthesized,
    /// `作者-标题`
    Hyphenated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NamingPolicy {
    pub suffix_enabled: bool,
    pub suffix_text: String,
    pub show_author_info: bool,
    pub mark_low_wordcount: bool,
    pub keep_image_position: bool,
    pub author_layout: AuthorLayout,
}

pub const DEFAULT_SUFFIX: &str =
    "——福州大学先进制造学院与海洋学院关工委2023年'中华魂'（毛泽东伟大精神品格）主题教育征文";

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            suffix_enabled: true,
            suffix_text: DEFAULT_SUFFIX.to_string(),
            show_author_info: true,
            mark_low_wordcount: false,
            keep_image_position: true,
            author_layout: AuthorLayout::Parenthesized,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
}

/// Concrete formatting for one output paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphFormat {
    pub style_id: &'static str,
    pub style_name: &'static str,
    pub font: &'static str,
    pub font_size: f32, // points
    pub bold: bool,
    pub alignment: Alignment,
    pub first_line_indent: f32, // points
}

pub enum OutputBlock {
    Text {
        role: ParagraphRole,
        text: String,
        format: ParagraphFormat,
    },
    /// One centered paragraph holding every image, each at a fixed display width.
    Images {
        paths: Vec<PathBuf>,
        display_width: f32, // points
    },
    Blank,
}

#[derive(Default)]
pub struct OutputDocument {
    pub blocks: Vec<OutputBlock>,
    pub style: StyleChoice,
    pub title: String,
    pub author: String,
}

impl OutputDocument {
    pub fn new(style: StyleChoice) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn count_role(&self, role: ParagraphRole) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, OutputBlock::Text { role: r, .. } if *r == role))
            .count()
    }

    pub fn texts(&self) -> impl Iterator<Item = (ParagraphRole, &str)> {
        self.blocks.iter().filter_map(|b| match b {
            OutputBlock::Text { role, text, .. } => Some((*role, text.as_str())),
            _ => None,
        })
    }
}
