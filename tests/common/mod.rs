#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const V: &str = "urn:schemas-microsoft-com:vml";
const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn text_run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

fn blip_run(rel_id: &str) -> String {
    format!(
        concat!(
            r#"<w:r><w:drawing><wp:inline><wp:extent cx="100" cy="100"/>"#,
            r#"<a:graphic><a:graphicData uri="{pic}"><pic:pic><pic:blipFill>"#,
            r#"<a:blip r:embed="{id}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic>"#,
            r#"</wp:inline></w:drawing></w:r>"#,
        ),
        pic = PIC,
        id = rel_id
    )
}

fn vml_run(rel_id: &str) -> String {
    format!(r#"<w:r><w:pict><v:shape><v:imagedata r:id="{rel_id}"/></v:shape></w:pict></w:r>"#)
}

/// In-memory word-processing package for tests.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    styles: Vec<(String, String)>,
    rels: Vec<(String, String, bool)>,
    media: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!("<w:p>{}</w:p>", text_run(text)));
        self
    }

    pub fn paragraphs(self, texts: &[&str]) -> Self {
        texts.iter().fold(self, |b, t| b.paragraph(t))
    }

    pub fn empty_paragraph(mut self) -> Self {
        self.body.push_str("<w:p/>");
        self
    }

    /// Paragraph using a style defined with `style`.
    pub fn styled_paragraph(mut self, text: &str, style_id: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{style_id}"/></w:pPr>{}</w:p>"#,
            text_run(text)
        ));
        self
    }

    pub fn style(mut self, id: &str, name: &str) -> Self {
        self.styles.push((id.to_string(), name.to_string()));
        self
    }

    /// Paragraph with optional text followed by one DrawingML run per relation id.
    pub fn image_paragraph(mut self, text: &str, rel_ids: &[&str]) -> Self {
        let mut p = String::from("<w:p>");
        if !text.is_empty() {
            p.push_str(&text_run(text));
        }
        for id in rel_ids {
            p.push_str(&blip_run(id));
        }
        p.push_str("</w:p>");
        self.body.push_str(&p);
        self
    }

    /// Paragraph holding a legacy VML picture.
    pub fn vml_paragraph(mut self, rel_id: &str) -> Self {
        self.body.push_str(&format!("<w:p>{}</w:p>", vml_run(rel_id)));
        self
    }

    /// Picture the way Word writes shapes: a DrawingML choice with a VML
    /// fallback naming the same relation.
    pub fn alternate_content_paragraph(mut self, rel_id: &str) -> Self {
        let drawing = blip_run(rel_id);
        let drawing = &drawing["<w:r>".len()..drawing.len() - "</w:r>".len()];
        let vml = vml_run(rel_id);
        let vml = &vml["<w:r>".len()..vml.len() - "</w:r>".len()];
        self.body.push_str(&format!(
            r#"<w:p><w:r><mc:AlternateContent><mc:Choice Requires="wps">{drawing}</mc:Choice><mc:Fallback>{vml}</mc:Fallback></mc:AlternateContent></w:r></w:p>"#
        ));
        self
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in *row {
                self.body
                    .push_str(&format!("<w:tc><w:p>{}</w:p></w:tc>", text_run(cell)));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    /// Embedded image: relationship plus media part `word/media/<name>`.
    pub fn image(mut self, rel_id: &str, name: &str, bytes: Vec<u8>) -> Self {
        self.rels
            .push((rel_id.to_string(), format!("media/{name}"), false));
        self.media.push((format!("word/media/{name}"), bytes));
        self
    }

    /// Image relationship whose target part is missing from the package.
    pub fn dangling_image(mut self, rel_id: &str, name: &str) -> Self {
        self.rels
            .push((rel_id.to_string(), format!("media/{name}"), false));
        self
    }

    pub fn linked_image(mut self, rel_id: &str, url: &str) -> Self {
        self.rels.push((rel_id.to_string(), url.to_string(), true));
        self
    }

    fn document_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{W}" xmlns:r="{R}" xmlns:a="{A}" xmlns:wp="{WP}" xmlns:pic="{PIC}" xmlns:v="{V}" xmlns:mc="{MC}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            self.body
        )
    }

    fn styles_xml(&self) -> String {
        let mut xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:styles xmlns:w="{W}">"#);
        for (id, name) in &self.styles {
            xml.push_str(&format!(
                r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/></w:style>"#
            ));
        }
        xml.push_str("</w:styles>");
        xml
    }

    fn rels_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        xml.push_str(r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
        for (id, target, external) in &self.rels {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            xml.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{IMAGE_REL}" Target="{target}"{mode}/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn content_types_xml(&self) -> String {
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
            r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#,
        )
        .to_string()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opt = SimpleFileOptions::default();
        let parts = [
            ("[Content_Types].xml", self.content_types_xml()),
            ("word/document.xml", self.document_xml()),
            ("word/styles.xml", self.styles_xml()),
            ("word/_rels/document.xml.rels", self.rels_xml()),
        ];
        for (name, content) in parts {
            zip.start_file(name, opt).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        for (name, bytes) in &self.media {
            zip.start_file(name.as_str(), opt).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, dir: &Path, filename: &str) -> PathBuf {
        let path = dir.join(filename);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// PNG of the given pixel size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// What a generated package contains, read back with zip + roxmltree.
pub struct OutputView {
    /// (style id, text) per text paragraph, in order.
    pub paragraphs: Vec<(String, String)>,
    /// Drawing count per image paragraph, in order.
    pub image_paragraphs: Vec<usize>,
    /// (cx, cy) of every drawing, in order.
    pub extents: Vec<(u64, u64)>,
    pub media: Vec<String>,
    pub style_ids: Vec<String>,
    pub core_title: Option<String>,
    pub core_creator: Option<String>,
}

impl OutputView {
    pub fn texts_with_style(&self, style_id: &str) -> Vec<&str> {
        self.paragraphs
            .iter()
            .filter(|(s, _)| s == style_id)
            .map(|(_, t)| t.as_str())
            .collect()
    }
}

fn read_entry(zip: &mut zip::ZipArchive<std::fs::File>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

pub fn read_output(path: &Path) -> OutputView {
    let file = std::fs::File::open(path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let media = zip
        .file_names()
        .filter(|n| n.starts_with("word/media/"))
        .map(str::to_string)
        .collect();

    let document = read_entry(&mut zip, "word/document.xml").unwrap();
    let doc = roxmltree::Document::parse(&document).unwrap();
    let mut paragraphs = Vec::new();
    let mut image_paragraphs = Vec::new();
    let mut extents = Vec::new();
    for p in doc.descendants().filter(|n| n.has_tag_name((W, "p"))) {
        let style = p
            .descendants()
            .find(|n| n.has_tag_name((W, "pStyle")))
            .and_then(|n| n.attribute((W, "val")))
            .unwrap_or("")
            .to_string();
        let drawings: Vec<_> = p
            .descendants()
            .filter(|n| n.has_tag_name((WP, "extent")))
            .collect();
        if !drawings.is_empty() {
            image_paragraphs.push(drawings.len());
            for d in drawings {
                let cx: u64 = d.attribute("cx").unwrap().parse().unwrap();
                let cy: u64 = d.attribute("cy").unwrap().parse().unwrap();
                extents.push((cx, cy));
            }
            continue;
        }
        let text: String = p
            .descendants()
            .filter(|n| n.has_tag_name((W, "t")))
            .filter_map(|n| n.text())
            .collect();
        if !text.is_empty() {
            paragraphs.push((style, text));
        }
    }

    let styles = read_entry(&mut zip, "word/styles.xml").unwrap();
    let styles_doc = roxmltree::Document::parse(&styles).unwrap();
    let style_ids = styles_doc
        .descendants()
        .filter(|n| n.has_tag_name((W, "style")))
        .filter_map(|n| n.attribute((W, "styleId")))
        .map(str::to_string)
        .collect();

    let core = read_entry(&mut zip, "docProps/core.xml").unwrap_or_default();
    let core_doc = roxmltree::Document::parse(&core).ok();
    let dc = |name: &str| {
        core_doc.as_ref().and_then(|d| {
            d.descendants()
                .find(|n| n.tag_name().name() == name)
                .and_then(|n| n.text())
                .map(str::to_string)
        })
    };

    OutputView {
        paragraphs,
        image_paragraphs,
        extents,
        media,
        style_ids,
        core_title: dc("title"),
        core_creator: dc("creator"),
    }
}

/// Every file under `dir`, recursively, relative to it.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(
                list_files(&path)
                    .into_iter()
                    .map(|p| Path::new(&entry.file_name()).join(p)),
            );
        } else {
            out.push(PathBuf::from(entry.file_name()));
        }
    }
    out.sort();
    out
}
