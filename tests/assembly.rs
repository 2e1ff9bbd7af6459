use std::path::PathBuf;

use docx_reform::model::{
    ClassificationResult, ImageAnchor, NamingPolicy, OutputBlock, Paragraph, ParagraphRole,
    SourceDocument, StyleChoice,
};
use docx_reform::{Assembler, Assembly, AuthorText, Classifier, ClassifierOptions, IMAGE_WIDTH_PT, count_words};

fn source(texts: &[&str]) -> SourceDocument {
    SourceDocument {
        paragraphs: texts
            .iter()
            .map(|t| Paragraph {
                raw_text: t.to_string(),
                style_name: None,
                runs: Vec::new(),
            })
            .collect(),
        tables: Vec::new(),
    }
}

fn policy(suffix: bool, author: bool, keep_images: bool) -> NamingPolicy {
    NamingPolicy {
        suffix_enabled: suffix,
        show_author_info: author,
        keep_image_position: keep_images,
        ..NamingPolicy::default()
    }
}

fn assemble(
    doc: &SourceDocument,
    policy: &NamingPolicy,
    style: StyleChoice,
    anchors: &ImageAnchor,
    trailing: &[PathBuf],
) -> Assembly {
    let classification = Classifier::new(ClassifierOptions {
        show_author_info: policy.show_author_info,
        detect_headings: style == StyleChoice::Formal,
        ..ClassifierOptions::default()
    })
    .unwrap()
    .classify(&doc.paragraphs)
    .unwrap();
    assemble_classified(doc, &classification, policy, style, anchors, trailing)
}

fn assemble_classified(
    doc: &SourceDocument,
    classification: &ClassificationResult,
    policy: &NamingPolicy,
    style: StyleChoice,
    anchors: &ImageAnchor,
    trailing: &[PathBuf],
) -> Assembly {
    let author_text = AuthorText::default();
    Assembler {
        style,
        policy,
        author_text: &author_text,
    }
    .assemble(doc, classification, anchors, trailing)
    .unwrap()
}

fn image_blocks(assembly: &Assembly) -> Vec<&[PathBuf]> {
    assembly
        .document
        .blocks
        .iter()
        .filter_map(|b| match b {
            OutputBlock::Images { paths, .. } => Some(paths.as_slice()),
            _ => None,
        })
        .collect()
}

#[test]
fn id_line_author_is_synthesized_and_body_kept() {
    let _ = env_logger::try_init();
    let doc = source(&["标题A", "8520001-张三", "正文第一段"]);
    let assembly = assemble(
        &doc,
        &policy(false, true, true),
        StyleChoice::Default,
        &ImageAnchor::new(),
        &[],
    );

    let texts: Vec<_> = assembly.document.texts().collect();
    assert_eq!(texts[0], (ParagraphRole::Title, "标题A"));
    assert_eq!(assembly.document.count_role(ParagraphRole::Title), 1);
    assert_eq!(assembly.document.count_role(ParagraphRole::Author), 1);
    assert!(
        texts
            .iter()
            .any(|(r, t)| *r == ParagraphRole::Author && t.contains("张三"))
    );
    assert!(texts.contains(&(ParagraphRole::Body, "正文第一段")));
    assert!(!texts.iter().any(|(_, t)| t.contains("852")));

    assert_eq!(assembly.metadata.author_name.as_deref(), Some("张三"));
    assert_eq!(assembly.metadata.original_title, "标题A");
    assert!(!assembly.metadata.used_default_author);
    assert!(!assembly.metadata.has_images);
}

#[test]
fn missing_author_uses_placeholder_once() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "第一段", "第二段"]);
    let assembly = assemble(
        &doc,
        &policy(false, true, true),
        StyleChoice::Default,
        &ImageAnchor::new(),
        &[],
    );

    assert!(assembly.metadata.used_default_author);
    assert_eq!(assembly.metadata.author_name.as_deref(), Some("佚名"));
    assert_eq!(assembly.document.count_role(ParagraphRole::Author), 1);
    let author = assembly
        .document
        .texts()
        .find(|(r, _)| *r == ParagraphRole::Author)
        .unwrap()
        .1;
    assert!(author.contains("佚名"));
}

#[test]
fn author_block_appended_when_document_has_only_a_title() {
    let _ = env_logger::try_init();
    let doc = source(&["只有标题"]);
    let assembly = assemble(
        &doc,
        &policy(false, true, true),
        StyleChoice::Default,
        &ImageAnchor::new(),
        &[],
    );
    let roles: Vec<_> = assembly.document.texts().map(|(r, _)| r).collect();
    assert_eq!(roles, [ParagraphRole::Title, ParagraphRole::Author]);
}

#[test]
fn no_author_block_when_author_info_is_off() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "8520001-张三", "正文"]);
    let assembly = assemble(
        &doc,
        &policy(false, false, true),
        StyleChoice::Default,
        &ImageAnchor::new(),
        &[],
    );
    assert_eq!(assembly.document.count_role(ParagraphRole::Author), 0);
    assert_eq!(assembly.metadata.author_name.as_deref(), Some("张三"));
}

#[test]
fn suffix_becomes_subtitle_after_title() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "正文"]);
    let policy = NamingPolicy {
        suffix_text: "——征文".into(),
        ..policy(true, false, true)
    };
    let assembly = assemble(&doc, &policy, StyleChoice::Default, &ImageAnchor::new(), &[]);
    let texts: Vec<_> = assembly.document.texts().collect();
    assert_eq!(
        texts[..2],
        [(ParagraphRole::Title, "标题"), (ParagraphRole::Subtitle, "——征文")]
    );
}

#[test]
fn empty_paragraph_with_two_images_becomes_one_image_block() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "正文", ""]);
    let images = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
    let anchors = ImageAnchor::from([(2, images.clone())]);
    let assembly = assemble(
        &doc,
        &policy(false, false, true),
        StyleChoice::Default,
        &anchors,
        &[],
    );

    assert_eq!(image_blocks(&assembly), [images.as_slice()]);
    assert!(assembly.metadata.has_images);
    assert!(matches!(
        assembly.document.blocks.last(),
        Some(OutputBlock::Images { display_width, .. }) if *display_width == IMAGE_WIDTH_PT
    ));
    assert_eq!(count_words(&doc.paragraphs[2].raw_text), 0);
}

#[test]
fn body_images_follow_their_paragraph() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "第一段", "第二段"]);
    let anchors = ImageAnchor::from([(1, vec![PathBuf::from("x.png")])]);
    let assembly = assemble(
        &doc,
        &policy(false, false, true),
        StyleChoice::Default,
        &anchors,
        &[],
    );
    let kinds: Vec<&str> = assembly
        .document
        .blocks
        .iter()
        .map(|b| match b {
            OutputBlock::Text { text, .. } => text.as_str(),
            OutputBlock::Images { .. } => "<images>",
            OutputBlock::Blank => "<blank>",
        })
        .collect();
    assert_eq!(kinds, ["标题", "第一段", "<images>", "第二段"]);
}

#[test]
fn images_move_to_end_when_positions_are_not_kept() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "", "正文"]);
    let anchors = ImageAnchor::from([(1, vec![PathBuf::from("a.png")])]);
    let trailing = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
    let assembly = assemble(
        &doc,
        &policy(false, false, false),
        StyleChoice::Default,
        &anchors,
        &trailing,
    );

    let blocks = &assembly.document.blocks;
    assert_eq!(image_blocks(&assembly), [trailing.as_slice()]);
    assert!(matches!(blocks[blocks.len() - 2], OutputBlock::Blank));
    assert!(assembly.metadata.has_images);
}

#[test]
fn images_on_id_lines_are_dropped() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "8520001-张三", "正文"]);
    let anchors = ImageAnchor::from([(1, vec![PathBuf::from("id.png")])]);
    let assembly = assemble(
        &doc,
        &policy(false, true, true),
        StyleChoice::Default,
        &anchors,
        &[],
    );
    assert!(image_blocks(&assembly).is_empty());
    assert!(assembly.metadata.has_images);
}

#[test]
fn formal_template_styles_headings() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "作者段", "一、背景", "正文内容"]);
    let assembly = assemble(
        &doc,
        &policy(false, false, true),
        StyleChoice::Formal,
        &ImageAnchor::new(),
        &[],
    );
    let styled: Vec<(&str, &str)> = assembly
        .document
        .blocks
        .iter()
        .filter_map(|b| match b {
            OutputBlock::Text { text, format, .. } => Some((format.style_id, text.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        styled,
        [
            ("ChineseMainTitle", "标题"),
            ("ChineseBody", "作者段"),
            ("ChineseHeading1", "一、背景"),
            ("ChineseBody", "正文内容"),
        ]
    );
}

#[test]
fn heading_in_author_position_keeps_heading_style() {
    let _ = env_logger::try_init();
    let doc = source(&["标题", "一、背景", "正文内容"]);
    let assembly = assemble(
        &doc,
        &policy(false, true, true),
        StyleChoice::Formal,
        &ImageAnchor::new(),
        &[],
    );
    let roles: Vec<ParagraphRole> = assembly.document.texts().map(|(r, _)| r).collect();
    assert_eq!(
        roles,
        [
            ParagraphRole::Title,
            ParagraphRole::Author,
            ParagraphRole::Heading(1),
            ParagraphRole::Body,
        ]
    );
}

#[test]
fn missing_title_role_fails() {
    let _ = env_logger::try_init();
    let doc = source(&["正文"]);
    let classification = ClassificationResult {
        roles: vec![ParagraphRole::Body],
        author: None,
        author_body: None,
    };
    let author_text = AuthorText::default();
    let policy = policy(false, true, true);
    let result = Assembler {
        style: StyleChoice::Default,
        policy: &policy,
        author_text: &author_text,
    }
    .assemble(&doc, &classification, &ImageAnchor::new(), &[]);
    assert!(matches!(result, Err(docx_reform::Error::NoTitleExtracted)));
}
