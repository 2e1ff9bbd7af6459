mod styles;
pub mod writer;

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    ImageRelation, Paragraph, RelationTable, Run, SourceDocument, Table, TableCell, TableRow,
};

use styles::parse_style_names;

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const VML_NS: &str = "urn:schemas-microsoft-com:vml";
const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

pub(crate) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(crate) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

/// Reads embedded resources and body content from a word-processing package.
pub struct Package {
    zip: zip::ZipArchive<Cursor<Vec<u8>>>,
}

/// Source of image bytes for the position mapper.
pub trait BlobSource {
    fn read_blob(&mut self, relation: &ImageRelation) -> Result<Vec<u8>>;
}

impl Package {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::InputNotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            )),
            _ => Error::Io(e),
        })?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let zip = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|_| Error::CorruptPackage("file is not a ZIP archive".into()))?;
        Ok(Self { zip })
    }

    fn read_text(&mut self, name: &str) -> Option<String> {
        let mut content = String::new();
        self.zip
            .by_name(name)
            .ok()?
            .read_to_string(&mut content)
            .ok()?;
        Some(content)
    }

    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .zip
            .by_name(name)
            .map_err(|e| Error::CorruptPackage(format!("{name}: {e}")))?;
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Parse the main document part into paragraphs and tables.
    pub fn read_document(&mut self) -> Result<SourceDocument> {
        let xml_content = self.read_text("word/document.xml").ok_or_else(|| {
            Error::CorruptPackage("missing word/document.xml (is this a DOCX file?)".into())
        })?;
        let style_names = self
            .read_text("word/styles.xml")
            .map(|xml| parse_style_names(&xml))
            .unwrap_or_default();

        let xml = roxmltree::Document::parse(&xml_content)?;
        let body = wml(xml.root_element(), "body")
            .ok_or_else(|| Error::CorruptPackage("missing w:body".into()))?;

        let mut paragraphs = Vec::new();
        let mut tables = Vec::new();
        for node in collect_block_nodes(body) {
            if node.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match node.tag_name().name() {
                "p" => paragraphs.push(parse_paragraph(node, &style_names)),
                "tbl" => tables.push(parse_table(node, &style_names)),
                _ => {}
            }
        }
        log::debug!(
            "Parsed {} paragraphs and {} tables",
            paragraphs.len(),
            tables.len()
        );
        Ok(SourceDocument { paragraphs, tables })
    }

    /// `dc:title` from the core properties, when set.
    pub fn core_title(&mut self) -> Option<String> {
        let xml_content = self.read_text("docProps/core.xml")?;
        let xml = roxmltree::Document::parse(&xml_content).ok()?;
        xml.descendants()
            .find(|n| n.tag_name().name() == "title" && n.tag_name().namespace() == Some(DC_NS))
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// All relations of the main part whose type denotes an image.
    /// External (linked) images carry no blob and are left out.
    pub fn relation_table(&mut self) -> RelationTable {
        let content_types = self
            .read_text("[Content_Types].xml")
            .map(|xml| ContentTypes::parse(&xml))
            .unwrap_or_default();
        let Some(xml_content) = self.read_text("word/_rels/document.xml.rels") else {
            return RelationTable::default();
        };

        let relations = parse_rels_xml(&xml_content)
            .into_iter()
            .filter(|rel| rel.rel_type.ends_with("/image"))
            .filter(|rel| {
                if rel.external {
                    log::debug!("Skipping linked image {} -> {}", rel.id, rel.target);
                }
                !rel.external
            })
            .map(|rel| {
                let part = resolve_target(&rel.target);
                let content_type = content_types.lookup(&part);
                ImageRelation {
                    id: rel.id,
                    part,
                    content_type,
                }
            })
            .collect();
        RelationTable { relations }
    }
}

impl BlobSource for Package {
    fn read_blob(&mut self, relation: &ImageRelation) -> Result<Vec<u8>> {
        self.read_part(&relation.part)
            .map_err(|e| Error::ImageExtraction {
                id: relation.id.clone(),
                reason: e.to_string(),
            })
    }
}

/// Flatten SDT wrappers: descend into w:sdtContent and collect effective children.
fn collect_block_nodes<'a>(parent: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if is_wml(child, "sdt") {
            if let Some(content) = wml(child, "sdtContent") {
                nodes.extend(collect_block_nodes(content));
            }
        } else {
            nodes.push(child);
        }
    }
    nodes
}

fn collect_run_nodes<'a>(parent: roxmltree::Node<'a, 'a>, out: &mut Vec<roxmltree::Node<'a, 'a>>) {
    for child in parent.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "r" => out.push(child),
            "hyperlink" | "ins" | "smartTag" => collect_run_nodes(child, out),
            "sdt" => {
                if let Some(content) = wml(child, "sdtContent") {
                    collect_run_nodes(content, out);
                }
            }
            _ => {}
        }
    }
}

fn parse_paragraph(node: roxmltree::Node, style_names: &HashMap<String, String>) -> Paragraph {
    let style_name = wml(node, "pPr")
        .and_then(|ppr| wml_attr(ppr, "pStyle"))
        .map(|id| style_names.get(id).cloned().unwrap_or_else(|| id.to_string()));

    let mut run_nodes = Vec::new();
    collect_run_nodes(node, &mut run_nodes);

    let runs: Vec<Run> = run_nodes.into_iter().map(parse_run).collect();
    let raw_text = runs.iter().map(|r| r.text.as_str()).collect();
    Paragraph {
        raw_text,
        style_name,
        runs,
    }
}

fn parse_run(run_node: roxmltree::Node) -> Run {
    let mut text = String::new();
    for child in run_node.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or("")),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    Run {
        text,
        image_refs: image_refs(run_node),
    }
}

/// Distinct relation ids referenced by DrawingML blips and legacy VML image
/// data, in document order.
fn image_refs(run_node: roxmltree::Node) -> Vec<String> {
    let mut refs = Vec::new();
    collect_image_refs(run_node, &mut refs);
    refs
}

fn collect_image_refs(node: roxmltree::Node, refs: &mut Vec<String>) {
    for child in node.children() {
        let ns = child.tag_name().namespace();
        let id = match child.tag_name().name() {
            "blip" if ns == Some(DML_NS) => child.attribute((REL_NS, "embed")),
            "imagedata" if ns == Some(VML_NS) => child.attribute((REL_NS, "id")),
            // Choice and Fallback describe the same content; read only one.
            "AlternateContent" if ns == Some(MC_NS) => {
                let branch = |name: &str| {
                    child.children().find(|n| {
                        n.tag_name().name() == name && n.tag_name().namespace() == Some(MC_NS)
                    })
                };
                if let Some(chosen) = branch("Choice").or_else(|| branch("Fallback")) {
                    collect_image_refs(chosen, refs);
                }
                continue;
            }
            _ => {
                collect_image_refs(child, refs);
                continue;
            }
        };
        if let Some(id) = id
            && !refs.iter().any(|r| r == id)
        {
            refs.push(id.to_string());
        }
    }
}

fn parse_table(node: roxmltree::Node, style_names: &HashMap<String, String>) -> Table {
    let rows = collect_block_nodes(node)
        .into_iter()
        .filter(|n| is_wml(*n, "tr"))
        .map(|tr| TableRow {
            cells: collect_block_nodes(tr)
                .into_iter()
                .filter(|n| is_wml(*n, "tc"))
                .map(|tc| TableCell {
                    paragraphs: collect_block_nodes(tc)
                        .into_iter()
                        .filter(|n| is_wml(*n, "p"))
                        .map(|p| parse_paragraph(p, style_names))
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Table { rows }
}

struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

fn parse_rels_xml(xml_content: &str) -> Vec<Relationship> {
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return Vec::new();
    };
    xml.root_element()
        .children()
        .filter(|n| n.tag_name().name() == "Relationship")
        .filter_map(|n| {
            Some(Relationship {
                id: n.attribute("Id")?.to_string(),
                rel_type: n.attribute("Type").unwrap_or("").to_string(),
                target: n.attribute("Target")?.to_string(),
                external: n.attribute("TargetMode") == Some("External"),
            })
        })
        .collect()
}

/// Relationship targets of the main part are relative to `word/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["word"];
            for seg in target.split('/') {
                match seg {
                    "." | "" => {}
                    ".." => {
                        parts.pop();
                    }
                    s => parts.push(s),
                }
            }
            parts.join("/")
        }
    }
}

#[derive(Default)]
struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn parse(xml_content: &str) -> Self {
        let mut types = Self::default();
        let Ok(xml) = roxmltree::Document::parse(xml_content) else {
            return types;
        };
        for node in xml.root_element().children() {
            if node.tag_name().namespace() != Some(CT_NS) {
                continue;
            }
            let Some(content_type) = node.attribute("ContentType") else {
                continue;
            };
            match node.tag_name().name() {
                "Default" => {
                    if let Some(ext) = node.attribute("Extension") {
                        types
                            .defaults
                            .insert(ext.to_ascii_lowercase(), content_type.to_string());
                    }
                }
                "Override" => {
                    if let Some(part) = node.attribute("PartName") {
                        types.overrides.insert(
                            part.trim_start_matches('/').to_string(),
                            content_type.to_string(),
                        );
                    }
                }
                _ => {}
            }
        }
        types
    }

    fn lookup(&self, part: &str) -> String {
        if let Some(ct) = self.overrides.get(part) {
            return ct.clone();
        }
        part.rsplit_once('.')
            .and_then(|(_, ext)| self.defaults.get(&ext.to_ascii_lowercase()))
            .cloned()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}
