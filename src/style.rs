use crate::model::{Alignment, ParagraphFormat, ParagraphRole, StyleChoice};

/// Display width of placed images: 6 inches.
pub const IMAGE_WIDTH_PT: f32 = 432.0;

const fn format(
    style_id: &'static str,
    style_name: &'static str,
    font: &'static str,
    font_size: f32,
    bold: bool,
    alignment: Alignment,
    first_line_indent: f32,
) -> ParagraphFormat {
    ParagraphFormat {
        style_id,
        style_name,
        font,
        font_size,
        bold,
        alignment,
        first_line_indent,
    }
}

// Default template
const TITLE: ParagraphFormat = format("CustomTitle", "Custom Title", "黑体", 16.0, true, Alignment::Center, 0.0);
const SUBTITLE: ParagraphFormat =
    format("CustomSubtitle", "Custom Subtitle", "黑体", 16.0, true, Alignment::Center, 0.0);
const AUTHOR: ParagraphFormat = format("CustomAuthor", "Custom Author", "宋体", 14.0, true, Alignment::Center, 0.0);
const BODY: ParagraphFormat = format("CustomBody", "Custom Body", "宋体", 12.0, false, Alignment::Left, 24.0);

// Formal template (小二 = 18pt, 小三 = 15pt)
const FORMAL_TITLE: ParagraphFormat = format(
    "ChineseMainTitle",
    "Chinese Main Title",
    "方正小标宋简体",
    18.0,
    false,
    Alignment::Center,
    0.0,
);
const FORMAL_SUBTITLE: ParagraphFormat = format(
    "ChineseSubtitle",
    "Chinese Subtitle",
    "仿宋_GB2312",
    15.0,
    false,
    Alignment::Center,
    0.0,
);
const FORMAL_BODY: ParagraphFormat =
    format("ChineseBody", "Chinese Body", "仿宋_GB2312", 15.0, false, Alignment::Left, 30.0);
const FORMAL_HEADING1: ParagraphFormat =
    format("ChineseHeading1", "Chinese Heading 1", "黑体", 15.0, false, Alignment::Left, 0.0);
const FORMAL_HEADING2: ParagraphFormat =
    format("ChineseHeading2", "Chinese Heading 2", "楷体_GB2312", 15.0, false, Alignment::Left, 0.0);
const FORMAL_HEADING34: ParagraphFormat = format(
    "ChineseHeading34",
    "Chinese Heading 3-4",
    "仿宋_GB2312",
    15.0,
    false,
    Alignment::Left,
    0.0,
);

const IMAGE: ParagraphFormat = format("ImageBlock", "Image Block", "宋体", 12.0, false, Alignment::Center, 0.0);

/// Concrete formatting for a role under a template.
///
/// The formal template has no dedicated author style; author lines use its
/// subtitle style. Headings only exist under the formal template and fall back
/// to body text under the default one.
pub fn format_for(role: ParagraphRole, choice: StyleChoice) -> ParagraphFormat {
    match (choice, role) {
        (StyleChoice::Default, ParagraphRole::Title) => TITLE,
        (StyleChoice::Default, ParagraphRole::Subtitle) => SUBTITLE,
        (StyleChoice::Default, ParagraphRole::Author) => AUTHOR,
        (StyleChoice::Default, ParagraphRole::Body | ParagraphRole::Heading(_)) => BODY,
        (StyleChoice::Formal, ParagraphRole::Title) => FORMAL_TITLE,
        (StyleChoice::Formal, ParagraphRole::Subtitle | ParagraphRole::Author) => FORMAL_SUBTITLE,
        (StyleChoice::Formal, ParagraphRole::Heading(1)) => FORMAL_HEADING1,
        (StyleChoice::Formal, ParagraphRole::Heading(2)) => FORMAL_HEADING2,
        (StyleChoice::Formal, ParagraphRole::Heading(_)) => FORMAL_HEADING34,
        (StyleChoice::Formal, ParagraphRole::Body) => FORMAL_BODY,
        (_, ParagraphRole::ImageOnly | ParagraphRole::Skip) => IMAGE,
    }
}

/// Every paragraph style a template defines, for the output style sheet.
pub fn template_styles(choice: StyleChoice) -> Vec<ParagraphFormat> {
    match choice {
        StyleChoice::Default => vec![TITLE, SUBTITLE, AUTHOR, BODY, IMAGE],
        StyleChoice::Formal => vec![
            FORMAL_TITLE,
            FORMAL_SUBTITLE,
            FORMAL_BODY,
            FORMAL_HEADING1,
            FORMAL_HEADING2,
            FORMAL_HEADING34,
            IMAGE,
        ],
    }
}
