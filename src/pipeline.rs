//! One input file from package to saved output.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tempfile::TempDir;

use crate::assemble::{Assembler, AuthorText};
use crate::classify::{Classifier, ClassifierOptions, find_author};
use crate::config::{Config, LowWordAction};
use crate::convert::Converter;
use crate::docx::{Package, writer};
use crate::error::{Error, Result};
use crate::events::{EventSink, FileEvents};
use crate::images::ImageMapper;
use crate::model::{DocumentMetadata, NamingPolicy, StyleChoice};
use crate::naming::{author_from_filename, output_filename};
use crate::wordcount::{WordStats, document_stats};

pub const IMAGES_DIR: &str = "成功文件";
pub const NO_IMAGES_DIR: &str = "无图片成功文件";
pub const TEMP_DIR: &str = "temp_images";

pub fn quarantine_dir_name(min_words: usize) -> String {
    format!("字数不足{min_words}字")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordGate {
    pub min_words: usize,
    pub action: LowWordAction,
}

#[derive(Clone, Debug)]
pub struct ProcessOptions {
    pub style: StyleChoice,
    /// Base policy; the low-word-count mark is decided per file by the gate.
    pub policy: NamingPolicy,
    pub author_text: AuthorText,
    pub id_prefix: String,
    pub word_gate: Option<WordGate>,
}

impl ProcessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            style: config.style,
            policy: config.naming_policy(false),
            author_text: config.author_text(),
            id_prefix: config.id_prefix.clone(),
            word_gate: config.min_words.map(|min_words| WordGate {
                min_words,
                action: config.low_word_action,
            }),
        }
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Disposition {
    Saved {
        path: PathBuf,
        metadata: DocumentMetadata,
    },
    /// Below the word threshold under the move policy; the source was copied.
    Quarantined(PathBuf),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub filename: String,
    pub stats: WordStats,
    pub author: Option<String>,
    pub low_words: bool,
    pub disposition: Disposition,
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Open a `.docx` directly, or convert a `.doc` into `scratch` first.
pub fn open_source(input: &Path, scratch: &Path, converter: &dyn Converter) -> Result<Package> {
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "docx" => Package::open(input),
        "doc" => {
            if !input.exists() {
                return Err(Error::InputNotFound(input.to_path_buf()));
            }
            let converted = converter.convert(input, scratch)?;
            Package::open(&converted)
        }
        other => Err(Error::UnsupportedFormat(format!(".{other}"))),
    }
}

/// Per-file scratch directory under `temp_images/`.
///
/// Another file finishing may remove the shared parent in between, so a
/// missing parent is recreated a few times before giving up.
fn scratch_dir(output_root: &Path) -> Result<TempDir> {
    let base = output_root.join(TEMP_DIR);
    let mut attempts = 0;
    loop {
        std::fs::create_dir_all(&base)?;
        match tempfile::Builder::new().prefix("doc").tempdir_in(&base) {
            Ok(dir) => return Ok(dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && attempts < 3 => attempts += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Remove `temp_images/` once no file is using it.
fn release_scratch_root(output_root: &Path) {
    let base = output_root.join(TEMP_DIR);
    // Fails while another file still holds a scratch directory there.
    if std::fs::remove_dir(&base).is_ok() {
        log::debug!("Removed {}", base.display());
    }
}

fn failure_message(err: &Error) -> String {
    match err {
        Error::InputNotFound(_) => "错误：输入文件不存在".to_string(),
        Error::CorruptPackage(detail) => {
            format!("错误：文件可能已损坏或不是有效的Word文档（{detail}）")
        }
        Error::NoTitleExtracted => "未能提取标题".to_string(),
        Error::Save { source, .. } => format!("保存文件时出错：{source}"),
        Error::ConversionUnavailable => "错误：未配置 .doc 转换程序".to_string(),
        other => format!("处理文件时出现错误：{other}"),
    }
}

fn success_message(metadata: &DocumentMetadata, name: &str) -> String {
    let note = match (metadata.used_default_author, metadata.has_images) {
        (true, true) => "（使用默认作者名）",
        (true, false) => "（使用默认作者名，无图片）",
        (false, true) => "",
        (false, false) => "（无图片）",
    };
    format!("文件处理完成{note}：{name}")
}

/// Run the pipeline for one file.
///
/// A failed file gets exactly one error event and a finished file one
/// completion event. The word gate and tolerated problems add their own lines.
/// The per-file scratch directory is removed on every exit path, and
/// `temp_images/` with it when no other file is still running.
pub fn process_file(
    input: &Path,
    output_root: &Path,
    options: &ProcessOptions,
    converter: &dyn Converter,
    sink: &dyn EventSink,
) -> Result<Outcome> {
    let filename = display_name(input);
    let events = FileEvents::new(sink, &filename);
    let result = run(input, output_root, options, converter, &filename, events);
    release_scratch_root(output_root);
    match &result {
        Ok(Outcome {
            disposition: Disposition::Saved { path, metadata },
            ..
        }) => events.success(&success_message(metadata, &display_name(path))),
        Ok(Outcome {
            disposition: Disposition::Quarantined(path),
            ..
        }) => events.success(&format!("已移至 {}", path.display())),
        Err(e) => events.error(&failure_message(e)),
    }
    result
}

fn run(
    input: &Path,
    output_root: &Path,
    options: &ProcessOptions,
    converter: &dyn Converter,
    filename: &str,
    events: FileEvents<'_>,
) -> Result<Outcome> {
    let t0 = Instant::now();
    let scratch = scratch_dir(output_root)?;

    let mut package = open_source(input, scratch.path(), converter)?;
    let relations = package.relation_table();
    let source = package.read_document()?;
    let t_parse = t0.elapsed();

    let classifier = Classifier::new(ClassifierOptions {
        show_author_info: options.policy.show_author_info,
        detect_headings: options.style == StyleChoice::Formal,
        id_prefix: options.id_prefix.clone(),
        known_author: author_from_filename(filename, &options.id_prefix),
    })?;

    let stats = document_stats(&source);
    let mut low_words = false;
    if let Some(gate) = options.word_gate {
        if stats.word_count < gate.min_words {
            low_words = true;
            events.warning(&format!(
                "字数为 {}，不足 {} 字",
                stats.word_count, gate.min_words
            ));
            if gate.action == LowWordAction::Move {
                let dir = output_root.join(quarantine_dir_name(gate.min_words));
                std::fs::create_dir_all(&dir)?;
                let target = dir.join(filename);
                std::fs::copy(input, &target)?;
                let author = classifier
                    .options()
                    .known_author
                    .clone()
                    .or_else(|| find_author(&classifier, &source.paragraphs));
                return Ok(Outcome {
                    filename: filename.to_string(),
                    stats,
                    author,
                    low_words,
                    disposition: Disposition::Quarantined(target),
                });
            }
        } else {
            events.success(&format!("字数为 {}，满足要求", stats.word_count));
        }
    }

    let classification = classifier.classify(&source.paragraphs)?;

    let mut mapper = ImageMapper::new(&mut package, &relations, scratch.path());
    let anchors = mapper.map(&source);
    let trailing = if options.policy.keep_image_position {
        Vec::new()
    } else {
        mapper.extract_all()
    };
    for failure in mapper.take_failures() {
        if failure.is_fatal_for_file() {
            return Err(failure);
        }
        events.warning(&failure.to_string());
    }
    let t_map = t0.elapsed();

    let mut policy = options.policy.clone();
    policy.mark_low_wordcount = low_words && options.word_gate.is_some_and(|g| g.action == LowWordAction::Mark);
    let assembler = Assembler {
        style: options.style,
        policy: &policy,
        author_text: &options.author_text,
    };
    let assembly = assembler.assemble(&source, &classification, &anchors, &trailing)?;
    if assembly.metadata.used_default_author {
        events.warning(&format!(
            "警告：未能提取作者名，使用默认值\"{}\"",
            options.author_text.default_name
        ));
    }

    let dir = if assembly.metadata.has_images {
        IMAGES_DIR
    } else {
        NO_IMAGES_DIR
    };
    let path = output_root
        .join(dir)
        .join(output_filename(&assembly.metadata, &policy));
    writer::save(&assembly.document, &path)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing {filename}: parse={:.1}ms, map={:.1}ms, assemble+write={:.1}ms, total={:.1}ms",
        t_parse.as_secs_f64() * 1000.0,
        (t_map - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_map).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
    );

    Ok(Outcome {
        filename: filename.to_string(),
        stats,
        author: assembly.metadata.author_name.clone(),
        low_words,
        disposition: Disposition::Saved {
            path,
            metadata: assembly.metadata,
        },
    })
}

/// Document title: the core `dc:title` if set, otherwise the first non-empty
/// paragraph.
pub fn read_title(input: &Path, converter: &dyn Converter) -> Result<Option<String>> {
    let scratch = tempfile::tempdir()?;
    let mut package = open_source(input, scratch.path(), converter)?;
    if let Some(title) = package.core_title() {
        return Ok(Some(title));
    }
    let source = package.read_document()?;
    Ok(source
        .paragraphs
        .iter()
        .find(|p| !p.is_empty())
        .map(|p| p.text().to_string()))
}

/// Word statistics and author of a document, without producing output.
pub fn inspect(
    input: &Path,
    id_prefix: &str,
    converter: &dyn Converter,
) -> Result<(WordStats, Option<String>)> {
    let scratch = tempfile::tempdir()?;
    let mut package = open_source(input, scratch.path(), converter)?;
    let source = package.read_document()?;
    let filename = display_name(input);
    let classifier = Classifier::new(ClassifierOptions {
        id_prefix: id_prefix.to_string(),
        ..ClassifierOptions::default()
    })?;
    let author = author_from_filename(&filename, id_prefix)
        .or_else(|| find_author(&classifier, &source.paragraphs));
    Ok((document_stats(&source), author))
}
