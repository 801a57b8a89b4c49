//! Region reconciler: builds ephemeral display trees from the flat region
//! list for a chosen grouping mode.
//!
//! A pure function of (region list, processor, mode): inputs are never
//! mutated, output is recomputed on every call, and nothing is memoized.
//! The processor closure maps each region to whatever leaf payload the
//! consuming view needs.

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;

use std::collections::{HashMap, HashSet};

use crate::config::ConfigRegistry;
use crate::consts::NO_LABEL_GROUP;
use crate::region::{Region, strip_id_suffix};

/// How the region list is grouped for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    /// Hierarchy from explicit `parent_id` links.
    #[default]
    Manual,
    /// One synthetic group per distinct label, plus a no-label catch-all.
    Label,
    /// Grouping by region type. Not implemented upstream; yields an empty
    /// tree with a diagnostic rather than guessing semantics.
    Type,
}

/// Reconciler options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOptions {
    /// Sort label groups by their configured hotkey (feature-flagged in the
    /// consuming UI).
    pub sort_by_hotkey: bool,
}

/// One node of the display tree. Ephemeral: recomputed per render, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    /// Unique key within the tree.
    pub key: String,
    /// Group caption, for group nodes.
    pub label: Option<String>,
    pub is_group: bool,
    /// Processor output, for region leaves.
    pub item: Option<T>,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    fn leaf(key: String, item: T) -> Self {
        Self { key, label: None, is_group: false, item: Some(item), children: Vec::new() }
    }

    fn group(key: String, label: String) -> Self {
        Self { key, label: Some(label), is_group: true, item: None, children: Vec::new() }
    }
}

/// Build a display tree from the region list.
pub fn build_tree<T>(
    regions: &[Region],
    registry: &ConfigRegistry,
    mode: GroupMode,
    options: TreeOptions,
    processor: &impl Fn(&Region) -> T,
) -> Vec<TreeNode<T>> {
    match mode {
        GroupMode::Manual => build_manual(regions, processor),
        GroupMode::Label => build_by_label(regions, registry, options, processor),
        GroupMode::Type => {
            tracing::warn!("grouping by type is not supported; returning an empty tree");
            Vec::new()
        }
    }
}

/// Build the `parent_id` hierarchy.
///
/// A parent reference may carry a `#suffix` disambiguator; when an exact
/// match fails, the lookup retries with the suffix stripped. Unmatched
/// references are treated as roots — the tree fails open, never drops a
/// region.
fn build_manual<T>(regions: &[Region], processor: &impl Fn(&Region) -> T) -> Vec<TreeNode<T>> {
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    let mut by_base: HashMap<&str, usize> = HashMap::new();
    for (i, region) in regions.iter().enumerate() {
        by_id.entry(region.id.as_str()).or_insert(i);
        by_base.entry(region.base_id()).or_insert(i);
    }

    // children[i] holds indices of regions whose parent resolved to i.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); regions.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, region) in regions.iter().enumerate() {
        let parent = region.parent_id.as_deref().filter(|p| !p.is_empty()).and_then(|p| {
            by_id
                .get(p)
                .or_else(|| by_base.get(strip_id_suffix(p)))
                .copied()
                .filter(|&pi| pi != i)
        });
        match parent {
            Some(pi) => children[pi].push(i),
            None => roots.push(i),
        }
    }

    let mut visited: HashSet<usize> = HashSet::new();
    let mut out: Vec<TreeNode<T>> = Vec::new();
    for root in roots {
        out.push(attach(root, regions, &children, &mut visited, processor));
    }
    // Cycles leave their members unreached; surface them as roots.
    for i in 0..regions.len() {
        if !visited.contains(&i) {
            out.push(attach(i, regions, &children, &mut visited, processor));
        }
    }
    out
}

fn attach<T>(
    index: usize,
    regions: &[Region],
    children: &[Vec<usize>],
    visited: &mut HashSet<usize>,
    processor: &impl Fn(&Region) -> T,
) -> TreeNode<T> {
    visited.insert(index);
    let region = &regions[index];
    let mut node = TreeNode::leaf(region.id.clone(), processor(region));
    for &child in &children[index] {
        if !visited.contains(&child) {
            node.children.push(attach(child, regions, children, visited, processor));
        }
    }
    node
}

/// Build one group per distinct label, keyed `value#controlName` so equal
/// label text in different label sets stays distinct. Regions with several
/// labels fan out into every matching group; unlabeled regions land in the
/// no-label catch-all.
fn build_by_label<T>(
    regions: &[Region],
    registry: &ConfigRegistry,
    options: TreeOptions,
    processor: &impl Fn(&Region) -> T,
) -> Vec<TreeNode<T>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, TreeNode<T>> = HashMap::new();

    for region in regions {
        let labels = region.labels();
        if labels.is_empty() {
            let key = NO_LABEL_GROUP.to_string();
            let group = groups
                .entry(key.clone())
                .or_insert_with(|| TreeNode::group(key.clone(), NO_LABEL_GROUP.to_string()));
            push_leaf(group, region, &key, processor);
            if !order.contains(&key) {
                order.push(key);
            }
            continue;
        }
        for (control_name, label) in labels {
            let key = format!("{label}#{control_name}");
            let group = groups
                .entry(key.clone())
                .or_insert_with(|| TreeNode::group(key.clone(), label.to_string()));
            push_leaf(group, region, &key, processor);
            if !order.contains(&key) {
                order.push(key);
            }
        }
    }

    if options.sort_by_hotkey {
        order.sort_by_key(|key| hotkey_rank(key, registry));
    } else {
        // no-label always sorts last
        if let Some(pos) = order.iter().position(|k| k == NO_LABEL_GROUP) {
            let key = order.remove(pos);
            order.push(key);
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        if let Some(node) = groups.remove(&key) {
            out.push(node);
        }
    }
    out
}

fn push_leaf<T>(group: &mut TreeNode<T>, region: &Region, group_key: &str, processor: &impl Fn(&Region) -> T) {
    let key = format!("{group_key}#{id}", id = region.id);
    group.children.push(TreeNode::leaf(key, processor(region)));
}

/// Sort rank for a label group key: its configured hotkey if any, with the
/// no-label group always last.
fn hotkey_rank(key: &str, registry: &ConfigRegistry) -> (u8, String) {
    if key == NO_LABEL_GROUP {
        return (2, String::new());
    }
    let (value, control_name) = match key.rsplit_once('#') {
        Some(pair) => pair,
        None => (key, ""),
    };
    registry
        .control(control_name)
        .and_then(|c| c.hotkey_for(value))
        .map_or_else(|| (1, value.to_string()), |hk| (0, hk.to_string()))
}
