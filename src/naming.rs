use std::sync::LazyLock;

use regex::Regex;

use crate::model::{AuthorLayout, DocumentMetadata, NamingPolicy};

pub const DOCUMENT_EXTENSION: &str = ".docx";
pub const LOW_WORDCOUNT_MARK: &str = "[字数不足]";

const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\n'];
const MAX_SANITIZED_CHARS: usize = 180;
const MAX_BASE_CHARS: usize = 200;
const ELLIPSIS: char = '…';
/// Longest tail (including the dot) still treated as a file extension.
const MAX_EXTENSION_CHARS: usize = 10;

fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn split_extension(s: &str) -> (&str, &str) {
    match s.rfind('.') {
        Some(i) if i > 0 => {
            let ext = &s[i..];
            let plausible = ext.chars().count() <= MAX_EXTENSION_CHARS
                && ext[1..].chars().all(|c| c.is_alphanumeric());
            if plausible { (&s[..i], ext) } else { (s, "") }
        }
        _ => (s, ""),
    }
}

/// Make a string safe as a Windows file name component.
///
/// Forbidden characters become `_`, runs of `_` collapse, four or more em-dashes
/// collapse to two, and remaining em-dash pairs collapse to one unless the
/// string opens with a pair. The result is at most 180 characters, keeping a
/// short extension if one is present.
pub fn sanitize(input: &str) -> String {
    let mut s: String = input
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();

    while s.contains("__") {
        s = s.replace("__", "_");
    }
    while s.contains("————") {
        s = s.replace("————", "——");
    }
    while s.contains("——") && !s.starts_with("——") {
        s = s.replace("——", "—");
    }

    if s.chars().count() > MAX_SANITIZED_CHARS {
        let (base, ext) = split_extension(&s);
        let keep = MAX_SANITIZED_CHARS - ext.chars().count();
        s = format!("{}{}", char_prefix(base, keep), ext);
    }

    s.trim().to_string()
}

/// Derive the output file name from extracted metadata.
pub fn output_filename(metadata: &DocumentMetadata, policy: &NamingPolicy) -> String {
    let prefix = if policy.mark_low_wordcount {
        LOW_WORDCOUNT_MARK
    } else {
        ""
    };

    let mut title = metadata.original_title.as_str();
    if policy.suffix_enabled
        && !policy.suffix_text.is_empty()
        && let Some((before, _)) = title.split_once(policy.suffix_text.as_str())
        && !before.trim().is_empty()
    {
        title = before.trim();
    }
    let clean_title = sanitize(title);

    let mut base = if policy.show_author_info {
        let clean_author = sanitize(metadata.author_name.as_deref().unwrap_or(""));
        match policy.author_layout {
            AuthorLayout::Parenthesized => format!("{prefix}({clean_author}){clean_title}"),
            AuthorLayout::Hyphenated => format!("{prefix}{clean_author}-{clean_title}"),
        }
    } else {
        format!("{prefix}{clean_title}")
    };

    if policy.suffix_enabled && !policy.suffix_text.is_empty() {
        base.push_str(&sanitize(&policy.suffix_text));
    }

    if base.chars().count() > MAX_BASE_CHARS {
        base = format!("{}{ELLIPSIS}", char_prefix(&base, MAX_BASE_CHARS - 2));
    }
    base + DOCUMENT_EXTENSION
}

static FILENAME_AUTHOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+[^\u{4e00}-\u{9fa5}]*([\u{4e00}-\u{9fa5}]{2,4})").ok());

/// Author name embedded in an input filename: the id prefix, more digits, then
/// two to four CJK ideographs.
pub fn author_from_filename(filename: &str, id_prefix: &str) -> Option<String> {
    let pattern = FILENAME_AUTHOR.as_ref()?;
    if id_prefix.is_empty() {
        return None;
    }
    filename.match_indices(id_prefix).find_map(|(i, _)| {
        let rest = &filename[i + id_prefix.len()..];
        pattern
            .captures(rest)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Sort key for batch ordering: the first run of digits in the filename.
/// Files without digits sort last.
pub fn author_number(filename: &str) -> u64 {
    let digits: String = filename
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(u64::MAX)
}
