use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::docx::BlobSource;
use crate::error::{Error, Result};
use crate::model::{ImageAnchor, RelationTable, SourceDocument};

/// Maps image references in runs to the paragraphs that carry them, writing each
/// referenced blob to a scratch file at most once.
pub struct ImageMapper<'a, S: BlobSource> {
    source: &'a mut S,
    relations: &'a RelationTable,
    temp_dir: &'a Path,
    extracted: HashMap<String, PathBuf>,
    failed: HashSet<String>,
    failures: Vec<Error>,
}

impl<'a, S: BlobSource> ImageMapper<'a, S> {
    pub fn new(source: &'a mut S, relations: &'a RelationTable, temp_dir: &'a Path) -> Self {
        Self {
            source,
            relations,
            temp_dir,
            extracted: HashMap::new(),
            failed: HashSet::new(),
            failures: Vec::new(),
        }
    }

    /// Scratch path for a relation, extracting it on first use.
    fn extract(&mut self, id: &str) -> Option<PathBuf> {
        if let Some(path) = self.extracted.get(id) {
            return Some(path.clone());
        }
        if self.failed.contains(id) {
            return None;
        }
        let relations = self.relations;
        let relation = relations.get(id)?;

        let result = self.source.read_blob(relation).and_then(|data| {
            let safe_id: String = id
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            let path = self.temp_dir.join(format!(
                "img{}_{}.{}",
                self.extracted.len(),
                safe_id,
                relation.extension()
            ));
            std::fs::write(&path, &data).map_err(|e| Error::ImageExtraction {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
            Ok(path)
        });

        match result {
            Ok(path) => {
                log::debug!("Extracted image {id} -> {}", path.display());
                self.extracted.insert(id.to_string(), path.clone());
                Some(path)
            }
            Err(e) => {
                log::warn!("{e}");
                self.failed.insert(id.to_string());
                self.failures.push(e);
                None
            }
        }
    }

    /// Paragraph index -> extracted image paths, following run order within each
    /// paragraph. Unknown relation ids and failed extractions are skipped.
    pub fn map(&mut self, doc: &SourceDocument) -> ImageAnchor {
        let mut anchors = ImageAnchor::new();
        for (idx, paragraph) in doc.paragraphs.iter().enumerate() {
            let mut paths = Vec::new();
            for id in paragraph.runs.iter().flat_map(|r| r.image_refs.iter()) {
                if let Some(path) = self.extract(id) {
                    paths.push(path);
                }
            }
            if !paths.is_empty() {
                anchors.insert(idx, paths);
            }
        }
        anchors
    }

    /// Every image relation in table order, for end-of-document placement.
    pub fn extract_all(&mut self) -> Vec<PathBuf> {
        let ids: Vec<String> = self.relations.relations.iter().map(|r| r.id.clone()).collect();
        ids.iter().filter_map(|id| self.extract(id)).collect()
    }

    pub fn extracted_count(&self) -> usize {
        self.extracted.len()
    }

    /// Per-image errors collected so far; they never abort mapping.
    pub fn take_failures(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.failures)
    }
}

/// Convenience wrapper: map anchors and also return per-image failures.
pub fn map_images<S: BlobSource>(
    source: &mut S,
    relations: &RelationTable,
    doc: &SourceDocument,
    temp_dir: &Path,
) -> Result<(ImageAnchor, Vec<Error>)> {
    std::fs::create_dir_all(temp_dir)?;
    let mut mapper = ImageMapper::new(source, relations, temp_dir);
    let anchors = mapper.map(doc);
    Ok((anchors, mapper.take_failures()))
}
