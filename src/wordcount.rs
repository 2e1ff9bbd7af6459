use serde::Serialize;

use crate::model::{Paragraph, SourceDocument};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WordStats {
    /// Letters, digits and CJK ideographs across body and table text.
    pub word_count: usize,
    /// Body paragraphs, empty ones included.
    pub paragraph_count: usize,
    /// Raw character length of body paragraph text.
    pub character_count: usize,
}

fn counts_as_word(c: char) -> bool {
    c.is_alphanumeric() || ('\u{4e00}'..='\u{9fff}').contains(&c)
}

pub fn count_words(text: &str) -> usize {
    text.trim().chars().filter(|c| counts_as_word(*c)).count()
}

fn count_paragraphs<'a>(paragraphs: impl Iterator<Item = &'a Paragraph>) -> usize {
    paragraphs.map(|p| count_words(&p.raw_text)).sum()
}

pub fn document_stats(doc: &SourceDocument) -> WordStats {
    let body_words = count_paragraphs(doc.paragraphs.iter());
    let table_words = count_paragraphs(doc.tables.iter().flat_map(|t| t.paragraphs()));
    WordStats {
        word_count: body_words + table_words,
        paragraph_count: doc.paragraphs.len(),
        character_count: doc.paragraphs.iter().map(|p| p.raw_text.chars().count()).sum(),
    }
}
