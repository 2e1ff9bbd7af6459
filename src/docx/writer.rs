//! Serializes an `OutputDocument` into a word-processing package.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::{DML_NS, REL_NS, WML_NS};
use crate::error::{Error, Result};
use crate::model::{Alignment, OutputBlock, OutputDocument, ParagraphFormat};
use crate::style::template_styles;

const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const STYLES_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const EMU_PER_PT: f64 = 12700.0;
const TWIPS_PER_PT: f32 = 20.0;

struct Media {
    rel_id: String,
    part: String,
    bytes: Vec<u8>,
    cx: u64,
    cy: u64,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn media_content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "image/jpeg",
    }
}

/// Pixel size of an image, if its format can be decoded.
fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Extent in EMU at the given display width. Height keeps the aspect ratio,
/// or assumes 4:3 when the format is not decodable.
fn extent(bytes: &[u8], display_width: f32) -> (u64, u64) {
    let cx = (display_width as f64 * EMU_PER_PT).round();
    let cy = match image_dimensions(bytes) {
        Some((w, h)) if w > 0 => cx * h as f64 / w as f64,
        _ => cx * 3.0 / 4.0,
    };
    (cx as u64, cy.round() as u64)
}

struct PackageBuilder {
    body: String,
    media: Vec<Media>,
    next_rel: usize,
}

impl PackageBuilder {
    fn new() -> Self {
        // rId1 is the style sheet
        Self {
            body: String::new(),
            media: Vec::new(),
            next_rel: 2,
        }
    }

    fn text_paragraph(&mut self, text: &str, format: &ParagraphFormat) {
        let jc = match format.alignment {
            Alignment::Left => "left",
            Alignment::Center => "center",
        };
        let _ = write!(
            self.body,
            r#"<w:p><w:pPr><w:pStyle w:val="{}"/><w:jc w:val="{jc}"/></w:pPr><w:r>"#,
            format.style_id
        );
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.body.push_str("<w:br/>");
            }
            for (j, piece) in line.split('\t').enumerate() {
                if j > 0 {
                    self.body.push_str("<w:tab/>");
                }
                if !piece.is_empty() {
                    let _ = write!(
                        self.body,
                        r#"<w:t xml:space="preserve">{}</w:t>"#,
                        escape(piece)
                    );
                }
            }
        }
        self.body.push_str("</w:r></w:p>");
    }

    fn image_paragraph(&mut self, paths: &[PathBuf], display_width: f32) {
        self.body
            .push_str(r#"<w:p><w:pPr><w:pStyle w:val="ImageBlock"/><w:jc w:val="center"/></w:pPr>"#);
        for path in paths {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Skipping image {}: {e}", path.display());
                    continue;
                }
            };
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "png".to_string());
            let n = self.media.len() + 1;
            let rel_id = format!("rId{}", self.next_rel);
            self.next_rel += 1;
            let (cx, cy) = extent(&bytes, display_width);
            let _ = write!(
                self.body,
                concat!(
                    r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                    r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
                    r#"<a:graphic xmlns:a="{dml}"><a:graphicData uri="{pic}">"#,
                    r#"<pic:pic xmlns:pic="{pic}"><pic:nvPicPr><pic:cNvPr id="{n}" name="image{n}.{ext}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                    r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                    r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                    r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                    r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
                ),
                cx = cx,
                cy = cy,
                n = n,
                ext = ext,
                dml = DML_NS,
                pic = PIC_NS,
                rel = rel_id,
            );
            self.media.push(Media {
                rel_id,
                part: format!("media/image{n}.{ext}"),
                bytes,
                cx,
                cy,
            });
        }
        self.body.push_str("</w:p>");
    }

    fn document_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="{w}" xmlns:r="{r}" xmlns:wp="{wp}"><w:body>{body}"#,
                r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
                r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="851" w:footer="992" w:gutter="0"/>"#,
                r#"</w:sectPr></w:body></w:document>"#,
            ),
            w = WML_NS,
            r = REL_NS,
            wp = WP_NS,
            body = self.body,
        )
    }

    fn document_rels_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{STYLES_REL}" Target="styles.xml"/>"#
        );
        for m in &self.media {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{IMAGE_REL}" Target="{}"/>"#,
                m.rel_id, m.part
            );
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn content_types_xml(&self) -> String {
        let extensions: BTreeSet<&str> = self
            .media
            .iter()
            .filter_map(|m| m.part.rsplit_once('.').map(|(_, ext)| ext))
            .collect();
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        ));
        for ext in extensions {
            let _ = write!(
                xml,
                r#"<Default Extension="{ext}" ContentType="{}"/>"#,
                media_content_type(ext)
            );
        }
        xml.push_str(concat!(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
            r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
            r#"</Types>"#,
        ));
        xml
    }
}

fn package_rels_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{ns}">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            r#"</Relationships>"#,
        ),
        ns = PKG_REL_NS
    )
}

fn style_xml(format: &ParagraphFormat) -> String {
    let jc = match format.alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
    };
    let indent = (format.first_line_indent * TWIPS_PER_PT).round() as i32;
    let half_points = (format.font_size * 2.0).round() as i32;
    let bold = if format.bold { "<w:b/><w:bCs/>" } else { "" };
    format!(
        concat!(
            r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="{id}"><w:name w:val="{name}"/>"#,
            r#"<w:basedOn w:val="Normal"/><w:qFormat/>"#,
            r#"<w:pPr><w:jc w:val="{jc}"/><w:ind w:firstLine="{indent}"/></w:pPr>"#,
            r#"<w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}"/>{bold}"#,
            r#"<w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/></w:rPr></w:style>"#,
        ),
        id = format.style_id,
        name = escape(format.style_name),
        jc = jc,
        indent = indent,
        font = escape(format.font),
        bold = bold,
        sz = half_points,
    )
}

fn styles_xml(doc: &OutputDocument) -> String {
    let mut xml = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{w}">"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
        ),
        w = WML_NS
    );
    for format in template_styles(doc.style) {
        xml.push_str(&style_xml(&format));
    }
    xml.push_str("</w:styles>");
    xml
}

fn core_xml(doc: &OutputDocument) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            r#"<dc:title>{title}</dc:title><dc:creator>{author}</dc:creator></cp:coreProperties>"#,
        ),
        title = escape(&doc.title),
        author = escape(&doc.author),
    )
}

/// Build the package bytes. Images that cannot be read from disk are skipped
/// with a warning; the rest of the document is still written.
pub fn to_bytes(doc: &OutputDocument) -> zip::result::ZipResult<Vec<u8>> {
    let mut builder = PackageBuilder::new();
    for block in &doc.blocks {
        match block {
            OutputBlock::Text { text, format, .. } => builder.text_paragraph(text, format),
            OutputBlock::Images {
                paths,
                display_width,
            } => builder.image_paragraph(paths, *display_width),
            OutputBlock::Blank => builder.body.push_str("<w:p/>"),
        }
    }
    for m in &builder.media {
        log::trace!("{} -> {} ({}x{} EMU)", m.rel_id, m.part, m.cx, m.cy);
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opt)?;
    zip.write_all(builder.content_types_xml().as_bytes())?;
    zip.start_file("_rels/.rels", opt)?;
    zip.write_all(package_rels_xml().as_bytes())?;
    zip.start_file("docProps/core.xml", opt)?;
    zip.write_all(core_xml(doc).as_bytes())?;
    zip.start_file("word/document.xml", opt)?;
    zip.write_all(builder.document_xml().as_bytes())?;
    zip.start_file("word/styles.xml", opt)?;
    zip.write_all(styles_xml(doc).as_bytes())?;
    zip.start_file("word/_rels/document.xml.rels", opt)?;
    zip.write_all(builder.document_rels_xml().as_bytes())?;
    for m in &builder.media {
        zip.start_file(format!("word/{}", m.part), opt)?;
        zip.write_all(&m.bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Write the document to `path`, creating parent directories.
pub fn save(doc: &OutputDocument, path: &Path) -> Result<()> {
    let save_err = |source: io::Error| Error::Save {
        path: path.to_path_buf(),
        source,
    };
    let bytes = to_bytes(doc).map_err(|e| save_err(io::Error::other(e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(save_err)?;
    }
    std::fs::write(path, bytes).map_err(save_err)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}
