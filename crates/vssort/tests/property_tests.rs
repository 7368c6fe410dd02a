//! Property-based tests for sorting
//!
//! These tests use proptest to verify:
//! 1. Idempotence: sorting a sorted tree changes nothing
//! 2. Stability: siblings with equal keys keep their relative order
//! 3. Non-sortable nodes never change index
//! 4. Write → parse gives back the same tree

use proptest::prelude::*;
use vssort::xml::Comment;
use vssort::{from_xml_str, sort, to_xml_string, Document, Element, FormatConfig, Node, SortRules};

const TAGS: &[&str] = &[
    "PropertyValue",
    "ToolsOptionsCategory",
    "ToolsOptionsSubCategory",
    "Category",
    "ToolsOptions",
    "FontsAndColors",
];

/// Strategy for attribute values drawn from a small alphabet so keys collide
fn arb_key() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[aAbB_{]{0,3}")
}

fn arb_leaf() -> impl Strategy<Value = Element> {
    (
        prop::sample::select(TAGS),
        arb_key(),
        arb_key(),
        prop::option::of("[a-z0-9 ]{1,6}"),
    )
        .prop_map(|(tag, name, guid, text)| {
            let mut element = Element::new(tag);
            if let Some(name) = name {
                element = element.with_attribute("name", name);
            }
            if let Some(guid) = guid {
                element = element.with_attribute("GUID", guid);
            }
            element.text = text;
            element
        })
}

/// Strategy for arbitrary settings-like trees
fn arb_element() -> impl Strategy<Value = Element> {
    arb_leaf().prop_recursive(4, 64, 8, |inner| {
        (
            arb_leaf(),
            prop::collection::vec(
                prop_oneof![
                    4 => inner.prop_map(Node::Element),
                    1 => "[a-z ]{0,5}".prop_map(|c| Node::Comment(Comment::new(c))),
                ],
                0..8,
            ),
        )
            .prop_map(|(mut element, children)| {
                element.text = None;
                element.children = children;
                element
            })
    })
}

/// Direct children that are not sortable, with their index
fn non_sortable_positions(element: &Element, rules: &SortRules) -> Vec<(usize, Node)> {
    element
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| !rules.is_sortable(node))
        .map(|(i, node)| (i, node.clone()))
        .collect()
}

proptest! {
    #[test]
    fn sort_is_idempotent(element in arb_element()) {
        let rules = SortRules::default();
        let once = sort(element, &rules);
        let twice = sort(once.clone(), &rules);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn equal_keys_keep_relative_order(
        texts in prop::collection::vec("[a-z]{1,4}", 1..10),
        other in "[a-z]{1,3}",
    ) {
        let rules = SortRules::default();
        let mut root = Element::new("Root");
        for (i, text) in texts.iter().enumerate() {
            root = root.with_child(
                Element::new("PropertyValue")
                    .with_attribute("name", "same")
                    .with_text(text.clone()),
            );
            if i % 2 == 0 {
                root = root.with_child(
                    Element::new("PropertyValue").with_attribute("name", other.clone()),
                );
            }
        }

        let sorted = sort(root, &rules);
        let same: Vec<String> = sorted
            .child_elements()
            .filter(|e| e.attribute("name") == Some("same"))
            .filter_map(|e| e.text.clone())
            .collect();
        prop_assert_eq!(same, texts);
    }

    #[test]
    fn non_sortable_children_keep_index(element in arb_element()) {
        let rules = SortRules::default();
        let before = non_sortable_positions(&element, &rules);
        let sorted = sort(element, &rules);
        for (index, node) in before {
            let after = sorted.children.get(index);
            match (after, &node) {
                (Some(Node::Element(a)), Node::Element(b)) => {
                    prop_assert_eq!(&a.name, &b.name);
                    prop_assert_eq!(&a.attributes, &b.attributes);
                }
                (Some(a), b) => {
                    prop_assert_eq!(a, b);
                }
                (None, _) => {
                    prop_assert!(false, "child {} disappeared", index);
                }
            }
        }
    }

    #[test]
    fn sort_keys_are_ordered(element in arb_element()) {
        let rules = SortRules::default();
        let sorted = sort(element, &rules);
        let keys: Vec<&str> = sorted
            .child_elements()
            .filter_map(|e| rules.key(e))
            .collect();
        prop_assert!(keys.windows(2).all(|w| matches!(w, [a, b] if a <= b)));
    }

    #[test]
    fn write_then_parse_roundtrips(element in arb_element()) {
        let doc = Document::new(element);
        let text = to_xml_string(&doc, &FormatConfig::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reparsed = from_xml_str(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(reparsed, doc);
    }
}
