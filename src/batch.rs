//! Directory-level orchestration: discovery, ordering, the worker pool and the
//! per-run summary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::convert::Converter;
use crate::error::{Error, Result};
use crate::events::{EventSink, FileEvents};
use crate::naming::{author_from_filename, author_number};
use crate::pipeline::{
    Disposition, Outcome, ProcessOptions, TEMP_DIR, display_name, inspect, process_file, read_title,
};
use crate::report::{ReportRow, TitleRow};

pub const UNTITLED: &str = "无标题";
const MAX_LISTED_TITLE_CHARS: usize = 100;

/// Word documents in `input_dir`, ordered by the author number in their names.
/// Office lock files (`~$...`) are ignored.
pub fn discover(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input_dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::InputNotFound(input_dir.to_path_buf()),
        _ => Error::Io(e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = display_name(&path);
        if name.starts_with("~$") {
            log::debug!("Ignoring lock file {name}");
            continue;
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        if matches!(ext.as_deref(), Some("doc" | "docx")) {
            files.push(path);
        }
    }
    files.sort_by_cached_key(|p| {
        let name = display_name(p);
        (author_number(&name), name)
    });
    Ok(files)
}

#[derive(Debug)]
pub enum FileResult {
    Done(Outcome),
    Failed { filename: String, error: Error },
    /// Not started because the run was cancelled.
    Cancelled(String),
}

impl FileResult {
    pub fn filename(&self) -> &str {
        match self {
            FileResult::Done(outcome) => &outcome.filename,
            FileResult::Failed { filename, .. } | FileResult::Cancelled(filename) => filename,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    /// One entry per input, in input order.
    pub results: Vec<FileResult>,
}

impl BatchSummary {
    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.results.iter().filter_map(|r| match r {
            FileResult::Done(outcome) => Some(outcome),
            _ => None,
        })
    }

    pub fn saved(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o.disposition, Disposition::Saved { .. }))
            .count()
    }

    pub fn quarantined(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o.disposition, Disposition::Quarantined(_)))
            .count()
    }

    pub fn low_words(&self) -> usize {
        self.outcomes().filter(|o| o.low_words).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.results.iter().filter_map(|r| match r {
            FileResult::Failed { filename, error } => Some((filename.as_str(), error)),
            _ => None,
        })
    }

    pub fn cancelled(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, FileResult::Cancelled(_)))
            .count()
    }

    /// Author numbers of failed files, ascending; files without one are left out.
    pub fn failed_author_numbers(&self) -> Vec<u64> {
        let mut numbers: Vec<u64> = self
            .failures()
            .map(|(name, _)| author_number(name))
            .filter(|n| *n != u64::MAX)
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    pub fn report_rows(&self) -> Vec<ReportRow> {
        self.outcomes()
            .map(|o| ReportRow {
                filename: o.filename.clone(),
                stats: o.stats,
                author: o.author.clone(),
            })
            .collect()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        write!(
            f,
            "处理完成：共 {} 个文件，成功 {} 个，失败 {} 个，字数不足 {} 个",
            self.results.len(),
            self.saved(),
            failed,
            self.low_words()
        )?;
        if self.cancelled() > 0 {
            write!(f, "，已取消 {} 个", self.cancelled())?;
        }
        let numbers = self.failed_author_numbers();
        if !numbers.is_empty() {
            let list: Vec<String> = numbers.iter().map(u64::to_string).collect();
            write!(f, "\n失败文件编号：{}", list.join(", "))?;
        }
        Ok(())
    }
}

pub struct Batch<'a> {
    options: &'a ProcessOptions,
    converter: &'a dyn Converter,
    sink: &'a dyn EventSink,
    jobs: Option<usize>,
    cancel: Arc<AtomicBool>,
}

impl<'a> Batch<'a> {
    pub fn new(
        options: &'a ProcessOptions,
        converter: &'a dyn Converter,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            options,
            converter,
            sink,
            jobs: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Setting the flag stops new files from starting; files already running finish.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn run_one(&self, input: &Path, output_root: &Path) -> FileResult {
        let filename = display_name(input);
        if self.cancel.load(Ordering::Relaxed) {
            log::debug!("Cancelled before start: {filename}");
            return FileResult::Cancelled(filename);
        }
        match process_file(input, output_root, self.options, self.converter, self.sink) {
            Ok(outcome) => FileResult::Done(outcome),
            Err(error) => FileResult::Failed { filename, error },
        }
    }

    /// Process every input. A failing file never stops the others.
    pub fn run(&self, inputs: &[PathBuf], output_root: &Path) -> Result<BatchSummary> {
        std::fs::create_dir_all(output_root)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .thread_name(|i| format!("docx-reform-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("worker pool: {e}")))?;

        let results: Vec<FileResult> = pool.install(|| {
            inputs
                .par_iter()
                .map(|input| self.run_one(input, output_root))
                .collect()
        });

        let temp = output_root.join(TEMP_DIR);
        if let Err(e) = std::fs::remove_dir_all(&temp)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("Could not remove {}: {e}", temp.display());
        }

        let summary = BatchSummary { results };
        log::info!("{summary}");
        Ok(summary)
    }
}

fn shorten_title(title: String) -> String {
    if title.chars().count() > MAX_LISTED_TITLE_CHARS {
        let kept: String = title.chars().take(MAX_LISTED_TITLE_CHARS - 3).collect();
        kept + "..."
    } else {
        title
    }
}

/// Title of every input; `无标题` with a warning when a document has none.
/// Unreadable files get an error event and no row.
pub fn extract_titles(
    inputs: &[PathBuf],
    id_prefix: &str,
    converter: &dyn Converter,
    sink: &dyn EventSink,
) -> Vec<TitleRow> {
    inputs
        .par_iter()
        .filter_map(|input| {
            let filename = display_name(input);
            let events = FileEvents::new(sink, &filename);
            let title = match read_title(input, converter) {
                Ok(Some(title)) => shorten_title(title),
                Ok(None) => {
                    events.warning(&format!("未找到标题，使用\"{UNTITLED}\""));
                    UNTITLED.to_string()
                }
                Err(e) => {
                    events.error(&format!("提取标题失败 - {e}"));
                    return None;
                }
            };
            Some(TitleRow {
                author: author_from_filename(&filename, id_prefix),
                filename,
                title,
            })
        })
        .collect()
}

/// Word statistics for every readable input.
pub fn collect_stats(
    inputs: &[PathBuf],
    id_prefix: &str,
    converter: &dyn Converter,
    sink: &dyn EventSink,
) -> Vec<ReportRow> {
    inputs
        .par_iter()
        .filter_map(|input| {
            let filename = display_name(input);
            match inspect(input, id_prefix, converter) {
                Ok((stats, author)) => Some(ReportRow {
                    filename,
                    stats,
                    author,
                }),
                Err(e) => {
                    FileEvents::new(sink, &filename).error(&format!("字数检测失败 - {e}"));
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_titles_are_shortened_for_listing() {
        let title: String = "长".repeat(120);
        let short = shorten_title(title);
        assert_eq!(short.chars().count(), 100);
        assert!(short.ends_with("..."));
        assert_eq!(shorten_title("短标题".into()), "短标题");
    }

    #[test]
    fn failed_numbers_skip_unnumbered_files() {
        let summary = BatchSummary {
            results: vec![
                FileResult::Failed {
                    filename: "作者12.docx".into(),
                    error: Error::NoTitleExtracted,
                },
                FileResult::Failed {
                    filename: "无编号.docx".into(),
                    error: Error::NoTitleExtracted,
                },
                FileResult::Failed {
                    filename: "作者3.docx".into(),
                    error: Error::NoTitleExtracted,
                },
            ],
        };
        assert_eq!(summary.failed_author_numbers(), [3, 12]);
        assert!(summary.to_string().contains("失败文件编号：3, 12"));
    }
}
