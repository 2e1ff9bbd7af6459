mod common;

use common::DocxBuilder;
use docx_reform::model::{Paragraph, ParagraphRole};
use docx_reform::{Classifier, ClassifierOptions, Error, Package, heading_level};

fn paragraphs(builder: DocxBuilder) -> Vec<Paragraph> {
    Package::from_bytes(builder.build())
        .unwrap()
        .read_document()
        .unwrap()
        .paragraphs
}

fn classifier(options: ClassifierOptions) -> Classifier {
    Classifier::new(options).unwrap()
}

#[test]
fn title_is_first_non_empty_paragraph() {
    let _ = env_logger::try_init();
    let paras = paragraphs(
        DocxBuilder::new()
            .empty_paragraph()
            .paragraph("   ")
            .paragraph("  标题A  ")
            .paragraph("标题B"),
    );
    let result = classifier(ClassifierOptions::default())
        .classify(&paras)
        .unwrap();
    assert_eq!(result.title_index(), Some(2));
    assert_eq!(
        result
            .roles
            .iter()
            .filter(|r| **r == ParagraphRole::Title)
            .count(),
        1
    );
    assert_eq!(result.roles[0], ParagraphRole::Skip);
    assert_eq!(result.roles[1], ParagraphRole::Skip);
}

#[test]
fn id_line_is_skipped_and_yields_author() {
    let _ = env_logger::try_init();
    let paras = paragraphs(DocxBuilder::new().paragraphs(&["标题A", "8520001-张三", "正文第一段", "正文第二段"]));
    let result = classifier(ClassifierOptions::default())
        .classify(&paras)
        .unwrap();
    assert_eq!(
        result.roles,
        [
            ParagraphRole::Title,
            ParagraphRole::Skip,
            ParagraphRole::Author,
            ParagraphRole::Body
        ]
    );
    assert_eq!(result.author.as_deref(), Some("张三"));
}

#[test]
fn first_matching_id_line_wins() {
    let _ = env_logger::try_init();
    let paras = paragraphs(DocxBuilder::new().paragraphs(&["标题", "8520002 李四", "8520003-王五", "正文"]));
    let result = classifier(ClassifierOptions::default())
        .classify(&paras)
        .unwrap();
    assert_eq!(result.author.as_deref(), Some("李四"));
    assert_eq!(result.roles[2], ParagraphRole::Skip);
}

#[test]
fn known_author_is_not_replaced_by_id_line() {
    let _ = env_logger::try_init();
    let paras = paragraphs(DocxBuilder::new().paragraphs(&["标题", "8520001-张三", "正文"]));
    let result = classifier(ClassifierOptions {
        known_author: Some("赵六".into()),
        ..ClassifierOptions::default()
    })
    .classify(&paras)
    .unwrap();
    assert_eq!(result.author.as_deref(), Some("赵六"));
}

#[test]
fn no_author_role_when_author_info_is_off() {
    let _ = env_logger::try_init();
    let paras = paragraphs(DocxBuilder::new().paragraphs(&["标题", "第一段", "第二段"]));
    let result = classifier(ClassifierOptions {
        show_author_info: false,
        ..ClassifierOptions::default()
    })
    .classify(&paras)
    .unwrap();
    assert_eq!(
        result.roles,
        [ParagraphRole::Title, ParagraphRole::Body, ParagraphRole::Body]
    );
}

#[test]
fn document_without_text_has_no_title() {
    let _ = env_logger::try_init();
    let paras = paragraphs(DocxBuilder::new().empty_paragraph().paragraph(" \t "));
    let err = classifier(ClassifierOptions::default())
        .classify(&paras)
        .unwrap_err();
    assert!(matches!(err, Error::NoTitleExtracted));
}

#[test]
fn formal_headings_are_detected_in_body_text() {
    let _ = env_logger::try_init();
    let paras = paragraphs(
        DocxBuilder::new()
            .paragraphs(&["标题", "作者段", "一、总体情况", "（二）具体做法", "3. 第三点", "(4) 第四点", "结论"])
            .paragraph(&"很长的正文".repeat(12)),
    );
    let result = classifier(ClassifierOptions {
        detect_headings: true,
        ..ClassifierOptions::default()
    })
    .classify(&paras)
    .unwrap();
    assert_eq!(
        &result.roles[2..],
        [
            ParagraphRole::Heading(1),
            ParagraphRole::Heading(2),
            ParagraphRole::Heading(3),
            ParagraphRole::Heading(4),
            ParagraphRole::Heading(1),
            ParagraphRole::Body,
        ]
    );
}

#[test]
fn style_name_is_a_fallback_signal() {
    let _ = env_logger::try_init();
    let paras = paragraphs(
        DocxBuilder::new()
            .style("H2", "heading 2")
            .paragraph("标题")
            .paragraph("作者段")
            .styled_paragraph("我们的一些做法与体会如下所述，供参考。", "H2"),
    );
    assert_eq!(paras[2].style_name.as_deref(), Some("heading 2"));
    let result = classifier(ClassifierOptions {
        detect_headings: true,
        ..ClassifierOptions::default()
    })
    .classify(&paras)
    .unwrap();
    assert_eq!(result.roles[2], ParagraphRole::Heading(2));
}

#[test]
fn half_and_full_width_parentheses_match_alike() {
    assert_eq!(heading_level("(三)做法", None), Some(2));
    assert_eq!(heading_level("（三）做法", None), Some(2));
    assert_eq!(heading_level("(12)细则", None), Some(4));
    assert_eq!(heading_level("（12）细则", None), Some(4));
}
