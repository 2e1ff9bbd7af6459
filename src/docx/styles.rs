use std::collections::HashMap;

use super::{WML_NS, wml_attr};

/// Map paragraph style ids to their display names (`Heading1` -> `heading 1`).
pub(super) fn parse_style_names(xml_content: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return names;
    };

    for style_node in xml.root_element().children() {
        if style_node.tag_name().name() != "style"
            || style_node.tag_name().namespace() != Some(WML_NS)
        {
            continue;
        }
        if style_node.attribute((WML_NS, "type")) != Some("paragraph") {
            continue;
        }
        let Some(id) = style_node.attribute((WML_NS, "styleId")) else {
            continue;
        };
        let name = wml_attr(style_node, "name").unwrap_or(id);
        names.insert(id.to_string(), name.to_string());
    }
    names
}
