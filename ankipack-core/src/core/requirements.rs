//! Automatic card-generation rules derived from template text.
//!
//! When a standard note type is built without explicit requirement rules,
//! each template's question format is analysed the way Anki itself does it:
//! render the template with a sentinel in some fields and see which fields
//! the sentinel's presence depends on.

use crate::core::note_type::{Quorum, Requirement};
use std::collections::HashMap;

const SENTINEL: &str = "SeNtInEl";

/// A parsed fragment of a mustache-style card template.
#[derive(Debug, PartialEq)]
enum Node<'a> {
    Text(&'a str),
    Field(&'a str),
    Section {
        name: &'a str,
        inverted: bool,
        children: Vec<Node<'a>>,
    },
}

/// Strips filters (`text:`, `cloze:`, `hint:` ...) and triple-mustache markers
/// from a tag, leaving the field name.
fn field_name(tag: &str) -> &str {
    let tag = tag.trim_start_matches(['{', '&']).trim();
    tag.rsplit(':').next().unwrap_or(tag).trim()
}

fn parse(template: &str) -> Vec<Node<'_>> {
    // Each frame is an open section (name, inverted) and the nodes collected in it.
    let mut stack: Vec<(Option<(&str, bool)>, Vec<Node<'_>>)> = vec![(None, Vec::new())];
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        if start > 0 {
            push_node(&mut stack, Node::Text(&rest[..start]));
        }
        let tag = after[..end].trim();
        rest = &after[end + 2..];

        if let Some(name) = tag.strip_prefix('#') {
            stack.push((Some((field_name(name), false)), Vec::new()));
        } else if let Some(name) = tag.strip_prefix('^') {
            stack.push((Some((field_name(name), true)), Vec::new()));
        } else if let Some(name) = tag.strip_prefix('/') {
            let name = field_name(name);
            let closes_top = matches!(stack.last(), Some((Some((open, _)), _)) if *open == name);
            // Stray closing tags are dropped.
            if closes_top && stack.len() > 1 {
                close_section(&mut stack);
            }
        } else if !tag.starts_with('!') {
            push_node(&mut stack, Node::Field(field_name(tag)));
        }
    }
    if !rest.is_empty() {
        push_node(&mut stack, Node::Text(rest));
    }

    // Unterminated sections run to the end of the template.
    while stack.len() > 1 {
        close_section(&mut stack);
    }
    stack.pop().map(|(_, nodes)| nodes).unwrap_or_default()
}

fn push_node<'a>(stack: &mut [(Option<(&'a str, bool)>, Vec<Node<'a>>)], node: Node<'a>) {
    if let Some((_, nodes)) = stack.last_mut() {
        nodes.push(node);
    }
}

fn close_section<'a>(stack: &mut Vec<(Option<(&'a str, bool)>, Vec<Node<'a>>)>) {
    if let Some((Some((name, inverted)), children)) = stack.pop() {
        push_node(
            stack,
            Node::Section {
                name,
                inverted,
                children,
            },
        );
    }
}

fn render(nodes: &[Node<'_>], values: &HashMap<&str, &str>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(name) => out.push_str(values.get(name).copied().unwrap_or_default()),
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let filled = values.get(name).is_some_and(|v| !v.trim().is_empty());
                if filled != *inverted {
                    render(children, values, out);
                }
            }
        }
    }
}

/// Derives the requirement rule for one template from its question format.
///
/// Returns `None` when the question renders the same whatever the fields
/// hold; such a template can never produce a card. An `Any` rule may come
/// back with no fields when no single field changes the question.
pub fn derive_requirement(ord: usize, qfmt: &str, field_names: &[&str]) -> Option<Requirement> {
    let nodes = parse(qfmt);
    let render_with = |values: &HashMap<&str, &str>| {
        let mut out = String::new();
        render(&nodes, values, &mut out);
        out
    };
    let renders_sentinel = |values: &HashMap<&str, &str>| render_with(values).contains(SENTINEL);

    let all_filled: HashMap<&str, &str> = field_names.iter().map(|n| (*n, SENTINEL)).collect();
    let all_blank: HashMap<&str, &str> = field_names.iter().map(|n| (*n, "")).collect();
    let blank_render = render_with(&all_blank);
    // Field contents never change the question.
    if render_with(&all_filled) == blank_render {
        return None;
    }

    let required: Vec<usize> = field_names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            let mut values = all_filled.clone();
            values.insert(**name, "");
            !renders_sentinel(&values)
        })
        .map(|(field_ord, _)| field_ord)
        .collect();
    if !required.is_empty() {
        return Some(Requirement::new(ord, Quorum::All, required));
    }

    let any: Vec<usize> = field_names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            let mut values = all_blank.clone();
            values.insert(**name, SENTINEL);
            render_with(&values) != blank_render
        })
        .map(|(field_ord, _)| field_ord)
        .collect();
    Some(Requirement::new(ord, Quorum::Any, any))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    fn render_template(template: &str, values: &HashMap<&str, &str>) -> String {
        let mut out = String::new();
        render(&parse(template), values, &mut out);
        out
    }

    #[test]
    fn test_render_plain_fields() {
        let out = render_template("Q: {{Front}} / {{ Back }}", &values(&[("Front", "x"), ("Back", "y")]));
        assert_eq!(out, "Q: x / y");
    }

    #[test]
    fn test_render_filters_and_unknown_fields() {
        let out = render_template("{{text:Front}}{{Missing}}", &values(&[("Front", "x")]));
        assert_eq!(out, "x");
    }

    #[test]
    fn test_render_sections() {
        let tmpl = "{{#Hint}}hint: {{Hint}}{{/Hint}}{{^Hint}}none{{/Hint}}";
        assert_eq!(render_template(tmpl, &values(&[("Hint", "h")])), "hint: h");
        assert_eq!(render_template(tmpl, &values(&[("Hint", " ")])), "none");
    }

    #[test]
    fn test_render_ignores_comments_and_stray_closers() {
        let out = render_template("{{! note }}a{{/Nope}}b", &values(&[]));
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_unterminated_section_runs_to_end() {
        let tmpl = "{{#A}}shown {{B}}";
        assert_eq!(render_template(tmpl, &values(&[("A", "1"), ("B", "b")])), "shown b");
        assert_eq!(render_template(tmpl, &values(&[("B", "b")])), "");
    }

    #[test]
    fn test_derive_all_for_single_field_question() {
        let req = derive_requirement(0, "{{Front}}", &["Front", "Back"]).unwrap();
        assert_eq!(req, Requirement::new(0, Quorum::All, vec![0]));
    }

    #[test]
    fn test_derive_all_for_conditional_template() {
        let req = derive_requirement(1, "{{#Add Reverse}}{{Back}}{{/Add Reverse}}", &["Front", "Back", "Add Reverse"])
            .unwrap();
        assert_eq!(req, Requirement::new(1, Quorum::All, vec![1, 2]));
    }

    #[test]
    fn test_derive_any_when_no_field_is_individually_required() {
        let req = derive_requirement(0, "{{Front}}{{Back}}", &["Front", "Back"]).unwrap();
        assert_eq!(req, Requirement::new(0, Quorum::Any, vec![0, 1]));
    }

    #[test]
    fn test_derive_any_includes_fields_guarding_static_text() {
        let req = derive_requirement(0, "{{A}}{{B}}{{#C}}x{{/C}}", &["A", "B", "C"]).unwrap();
        assert_eq!(req, Requirement::new(0, Quorum::Any, vec![0, 1, 2]));
    }

    #[test]
    fn test_derive_none_for_static_template() {
        assert!(derive_requirement(0, "no fields here", &["Front"]).is_none());
    }
}
