use std::sync::LazyLock;

const CJK_NUMERALS: [&str; 20] = [
    "一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "十一", "十二", "十三", "十四",
    "十五", "十六", "十七", "十八", "十九", "二十",
];

/// Short unnumbered paragraphs containing one of these read as section headings.
const HEADING_KEYWORDS: [&str; 18] = [
    "摘要", "引言", "前言", "背景", "介绍", "结论", "总结", "参考文献", "致谢", "附录", "问题",
    "方法", "研究方法", "实验", "实验结果", "讨论", "建议", "展望",
];

const TRAILING_PUNCT: &[char] = &['。', '，', '；', '：', '！', '？', ',', '.', ';', ':', '!', '?'];

const MAX_NUMBERED_LEN: usize = 50;
const MAX_KEYWORD_LEN: usize = 20;

/// Prefix tables for heading levels 1-4, checked in order.
static LEVEL_PREFIXES: LazyLock<[Vec<String>; 4]> = LazyLock::new(|| {
    let level1 = CJK_NUMERALS.iter().map(|n| format!("{n}、")).collect();
    let level2 = CJK_NUMERALS
        .iter()
        .flat_map(|n| [format!("({n})"), format!("（{n}）")])
        .collect();
    let level3 = (1..=30)
        .map(|i| format!("{i}."))
        .chain((1..=30).map(|i| format!("{i}、")))
        .collect();
    let level4 = (1..=30)
        .flat_map(|i| [format!("({i})"), format!("（{i}）")])
        .collect();
    [level1, level2, level3, level4]
});

fn numbered_level(text: &str) -> Option<u8> {
    LEVEL_PREFIXES
        .iter()
        .position(|prefixes| prefixes.iter().any(|p| text.starts_with(p.as_str())))
        .map(|i| i as u8 + 1)
}

fn keyword_heading(text: &str, len: usize) -> bool {
    len < MAX_KEYWORD_LEN
        && !text.ends_with(TRAILING_PUNCT)
        && HEADING_KEYWORDS.iter().any(|k| text.contains(k))
}

fn style_level(style_name: &str) -> Option<u8> {
    if !style_name.to_lowercase().contains("heading") && !style_name.contains("标题") {
        return None;
    }
    (1u8..=4).find(|i| style_name.contains(char::from(b'0' + i)))
}

/// Heading level (1-4) of a body paragraph, or `None` for plain body text.
///
/// Numbered prefixes win when the paragraph is shorter than 50 characters.
/// A numbered prefix on a longer paragraph does not fall through to a deeper
/// level; only the keyword and style-name checks remain.
pub fn heading_level(text: &str, style_name: Option<&str>) -> Option<u8> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let len = text.chars().count();

    if let Some(level) = numbered_level(text)
        && len < MAX_NUMBERED_LEN
    {
        return Some(level);
    }
    if keyword_heading(text, len) {
        return Some(1);
    }
    style_name.and_then(style_level)
}
