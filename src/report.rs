//! Word-count and title reports.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::wordcount::WordStats;

pub const UNKNOWN_AUTHOR: &str = "未知";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub filename: String,
    pub stats: WordStats,
    pub author: Option<String>,
}

impl ReportRow {
    pub fn passes(&self, min_words: usize) -> bool {
        self.stats.word_count >= min_words
    }
}

/// Consumer of per-file word statistics. Write-only.
pub trait ReportExporter {
    fn export(&self, rows: &[ReportRow], min_words: usize) -> Result<()>;
}

#[derive(Serialize)]
struct WordCountRecord<'a> {
    #[serde(rename = "文件名")]
    filename: &'a str,
    #[serde(rename = "作者")]
    author: &'a str,
    #[serde(rename = "字数")]
    word_count: usize,
    #[serde(rename = "段落数")]
    paragraph_count: usize,
    #[serde(rename = "字符数")]
    character_count: usize,
    #[serde(rename = "状态")]
    status: &'static str,
}

#[derive(Serialize)]
struct TitleRecord<'a> {
    #[serde(rename = "序号")]
    index: usize,
    #[serde(rename = "文件名")]
    filename: &'a str,
    #[serde(rename = "标题")]
    title: &'a str,
    #[serde(rename = "作者")]
    author: &'a str,
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    Error::Save {
        path: path.to_path_buf(),
        source: std::io::Error::other(err),
    }
}

/// Rows in ascending word-count order.
pub fn sorted_rows(rows: &[ReportRow]) -> Vec<&ReportRow> {
    let mut sorted: Vec<&ReportRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        a.stats
            .word_count
            .cmp(&b.stats.word_count)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    sorted
}

pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportExporter for CsvReport {
    fn export(&self, rows: &[ReportRow], min_words: usize) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(&self.path).map_err(|e| csv_error(&self.path, e))?;
        for row in sorted_rows(rows) {
            wtr.serialize(WordCountRecord {
                filename: &row.filename,
                author: row.author.as_deref().unwrap_or(UNKNOWN_AUTHOR),
                word_count: row.stats.word_count,
                paragraph_count: row.stats.paragraph_count,
                character_count: row.stats.character_count,
                status: if row.passes(min_words) { "合格" } else { "不足" },
            })
            .map_err(|e| csv_error(&self.path, e))?;
        }
        wtr.flush()?;
        log::info!("Word-count report written to {}", self.path.display());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleRow {
    pub filename: String,
    pub title: String,
    pub author: Option<String>,
}

pub fn write_titles_csv(path: &Path, rows: &[TitleRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for (i, row) in rows.iter().enumerate() {
        wtr.serialize(TitleRecord {
            index: i + 1,
            filename: &row.filename,
            title: &row.title,
            author: row.author.as_deref().unwrap_or(UNKNOWN_AUTHOR),
        })
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Aggregate figures printed after a word-count run.
#[derive(Clone, Debug, PartialEq)]
pub struct WordCountSummary {
    pub total: usize,
    pub average: f64,
    pub max: usize,
    pub min: usize,
    pub threshold: usize,
    pub below: usize,
}

impl WordCountSummary {
    pub fn from_rows(rows: &[ReportRow], threshold: usize) -> Self {
        let counts: Vec<usize> = rows.iter().map(|r| r.stats.word_count).collect();
        let total = counts.len();
        let average = if total == 0 {
            0.0
        } else {
            counts.iter().sum::<usize>() as f64 / total as f64
        };
        Self {
            total,
            average,
            max: counts.iter().copied().max().unwrap_or(0),
            min: counts.iter().copied().min().unwrap_or(0),
            threshold,
            below: rows.iter().filter(|r| !r.passes(threshold)).count(),
        }
    }

    pub fn passing(&self) -> usize {
        self.total - self.below
    }
}

impl fmt::Display for WordCountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "统计信息:")?;
        writeln!(f, "总文件数: {} 个", self.total)?;
        writeln!(f, "平均字数: {:.1} 字", self.average)?;
        writeln!(f, "最大字数: {} 字", self.max)?;
        writeln!(f, "最小字数: {} 字", self.min)?;
        writeln!(f, "字数标准: {} 字", self.threshold)?;
        writeln!(f, "字数不足文件: {} 个", self.below)?;
        write!(f, "字数合格文件: {} 个", self.passing())
    }
}
