use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::model::{
    ClassificationResult, DocumentMetadata, ImageAnchor, NamingPolicy, OutputBlock,
    OutputDocument, ParagraphRole, SourceDocument, StyleChoice,
};
use crate::style::{IMAGE_WIDTH_PT, format_for};

pub const DEFAULT_AUTHOR: &str = "佚名";
pub const DEFAULT_AUTHOR_LINE: &str = "（先进制造学院与海洋学院关工委通讯员{name}）";

/// Text the assembler synthesizes rather than copies.
#[derive(Clone, Debug)]
pub struct AuthorText {
    /// Sentence template; `{name}` is replaced by the author name.
    pub line: String,
    /// Name used when no author could be extracted.
    pub default_name: String,
}

impl Default for AuthorText {
    fn default() -> Self {
        Self {
            line: DEFAULT_AUTHOR_LINE.to_string(),
            default_name: DEFAULT_AUTHOR.to_string(),
        }
    }
}

impl AuthorText {
    pub fn sentence(&self, name: &str) -> String {
        self.line.replace("{name}", name)
    }
}

pub struct Assembly {
    pub document: OutputDocument,
    pub metadata: DocumentMetadata,
}

pub struct Assembler<'a> {
    pub style: StyleChoice,
    pub policy: &'a NamingPolicy,
    pub author_text: &'a AuthorText,
}

impl Assembler<'_> {
    fn push_text(&self, doc: &mut OutputDocument, role: ParagraphRole, text: &str) {
        doc.blocks.push(OutputBlock::Text {
            role,
            text: text.to_string(),
            format: format_for(role, self.style),
        });
    }

    fn push_images(doc: &mut OutputDocument, paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        doc.blocks.push(OutputBlock::Images {
            paths: paths.to_vec(),
            display_width: IMAGE_WIDTH_PT,
        });
    }

    /// Build the output document from classified paragraphs.
    ///
    /// `trailing_images` is only placed when image positions are not kept; it is
    /// appended after a blank line once all paragraphs are consumed.
    pub fn assemble(
        &self,
        source: &SourceDocument,
        classification: &ClassificationResult,
        anchors: &ImageAnchor,
        trailing_images: &[PathBuf],
    ) -> Result<Assembly> {
        let keep_positions = self.policy.keep_image_position;
        let author_name = classification
            .author
            .clone()
            .unwrap_or_else(|| self.author_text.default_name.clone());

        let mut doc = OutputDocument::new(self.style);
        let mut title: Option<String> = None;
        let mut author_emitted = false;

        for (idx, paragraph) in source.paragraphs.iter().enumerate() {
            let anchored = anchors.get(&idx).filter(|_| keep_positions);

            if paragraph.is_empty() {
                if let Some(paths) = anchored {
                    log::debug!("paragraph {idx}: {} image(s) in empty paragraph", paths.len());
                    Self::push_images(&mut doc, paths);
                }
                continue;
            }

            let role = classification
                .roles
                .get(idx)
                .copied()
                .unwrap_or(ParagraphRole::Body);
            let text = paragraph.text();
            match role {
                ParagraphRole::Title => {
                    if title.is_some() {
                        log::warn!("paragraph {idx}: second title ignored, kept as body");
                        self.push_text(&mut doc, ParagraphRole::Body, text);
                        continue;
                    }
                    self.push_text(&mut doc, ParagraphRole::Title, text);
                    if self.policy.suffix_enabled && !self.policy.suffix_text.is_empty() {
                        self.push_text(&mut doc, ParagraphRole::Subtitle, &self.policy.suffix_text);
                    }
                    title = Some(text.to_string());
                }
                ParagraphRole::Skip => {
                    if anchored.is_some() {
                        log::debug!("paragraph {idx}: images on id line are not placed");
                    }
                }
                ParagraphRole::Author => {
                    let sentence = self.author_text.sentence(&author_name);
                    self.push_text(&mut doc, ParagraphRole::Author, &sentence);
                    author_emitted = true;
                    let body = classification.author_body.unwrap_or(ParagraphRole::Body);
                    self.push_text(&mut doc, body, text);
                    if let Some(paths) = anchored {
                        Self::push_images(&mut doc, paths);
                    }
                }
                ParagraphRole::Body
                | ParagraphRole::Heading(_)
                | ParagraphRole::Subtitle
                | ParagraphRole::ImageOnly => {
                    let role = match role {
                        ParagraphRole::Heading(_) => role,
                        _ => ParagraphRole::Body,
                    };
                    self.push_text(&mut doc, role, text);
                    if let Some(paths) = anchored {
                        Self::push_images(&mut doc, paths);
                    }
                }
            }
        }

        let Some(original_title) = title else {
            return Err(Error::NoTitleExtracted);
        };

        let used_default_author = classification.author.is_none();
        if self.policy.show_author_info && !author_emitted {
            let sentence = self.author_text.sentence(&author_name);
            self.push_text(&mut doc, ParagraphRole::Author, &sentence);
        }

        if !keep_positions && !trailing_images.is_empty() {
            doc.blocks.push(OutputBlock::Blank);
            Self::push_images(&mut doc, trailing_images);
        }

        doc.title = original_title.clone();
        doc.author = author_name.clone();

        let metadata = DocumentMetadata {
            author_name: Some(author_name),
            original_title,
            used_default_author,
            has_images: !anchors.is_empty(),
        };
        Ok(Assembly {
            document: doc,
            metadata,
        })
    }
}
