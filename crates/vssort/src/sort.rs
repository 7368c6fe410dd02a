//! Recursive sibling sorting
//!
//! At every element, the children whose tag has a [`SortRules`] entry are
//! sorted by key and written back into the slots those children occupied.
//! Everything else (comments, processing instructions, elements with other
//! tags) keeps its index, so a sortable run interleaved with unrelated nodes
//! is ordered without displacing them.

use std::ops::AddAssign;

use tracing::debug;

use crate::rules::SortRules;
use crate::xml::model::{Document, Element, Node};

/// Counters gathered while sorting a tree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Elements whose children were examined
    pub elements_visited: usize,
    /// Sibling groups with two or more sortable members
    pub groups_sorted: usize,
    /// Sortable nodes that ended up in a different slot
    pub nodes_moved: usize,
}

impl AddAssign for SortStats {
    fn add_assign(&mut self, other: Self) {
        self.elements_visited += other.elements_visited;
        self.groups_sorted += other.groups_sorted;
        self.nodes_moved += other.nodes_moved;
    }
}

/// Sort `element` and all of its descendants, returning the sorted tree.
pub fn sort(mut element: Element, rules: &SortRules) -> Element {
    sort_in_place(&mut element, rules);
    element
}

/// Sort a whole document in place. Prolog and epilog nodes are left alone.
pub fn sort_document(doc: &mut Document, rules: &SortRules) -> SortStats {
    let stats = sort_in_place(&mut doc.root, rules);
    debug!(
        elements = stats.elements_visited,
        groups = stats.groups_sorted,
        moved = stats.nodes_moved,
        "sorted document"
    );
    stats
}

/// Sort `element` and all of its descendants in place.
pub fn sort_in_place(element: &mut Element, rules: &SortRules) -> SortStats {
    let mut stats = SortStats {
        elements_visited: 1,
        ..SortStats::default()
    };
    if element.children.is_empty() {
        return stats;
    }

    stats += reorder_children(element, rules);

    for child in &mut element.children {
        if let Node::Element(child) = child {
            stats += sort_in_place(child, rules);
        }
    }
    stats
}

/// Reorder the sortable direct children of `element` among their own slots.
fn reorder_children(element: &mut Element, rules: &SortRules) -> SortStats {
    let sortable_count = element
        .children
        .iter()
        .filter(|child| rules.is_sortable(child))
        .count();
    if sortable_count < 2 {
        return SortStats::default();
    }

    // `None` marks a slot owned by the sortable run
    let mut layout: Vec<Option<Node>> = Vec::with_capacity(element.children.len());
    let mut run: Vec<(usize, Node)> = Vec::with_capacity(sortable_count);
    for child in element.children.drain(..) {
        if rules.is_sortable(&child) {
            run.push((run.len(), child));
            layout.push(None);
        } else {
            layout.push(Some(child));
        }
    }

    // stable, so equal keys keep their document order
    run.sort_by(|(_, a), (_, b)| sort_key(a, rules).cmp(sort_key(b, rules)));

    let nodes_moved = run
        .iter()
        .enumerate()
        .filter(|(slot, (original, _))| slot != original)
        .count();

    let mut sorted = run.into_iter().map(|(_, node)| node);
    element.children = layout
        .into_iter()
        .filter_map(|slot| slot.or_else(|| sorted.next()))
        .collect();

    debug!(
        parent = %element.name,
        sortable = sortable_count,
        moved = nodes_moved,
        "reordered children"
    );
    SortStats {
        elements_visited: 0,
        groups_sorted: 1,
        nodes_moved,
    }
}

fn sort_key<'a>(node: &'a Node, rules: &SortRules) -> &'a str {
    node.as_element()
        .and_then(|element| rules.key(element))
        .unwrap_or_default()
}
