//! Configuration deduplication.
//!
//! Translation gives every line, transformer and regulator its own copies of
//! conductors, spacings and configurations. Structurally identical configs
//! are collapsed onto one canonical instance, kind by kind in dependency
//! order so that line configurations are compared after their conductor and
//! spacing references have already been canonicalized.

use std::collections::BTreeMap;

use feedr_core::{ConfigBody, ConfigKind, ConversionDiagnostics, ObjectArena};

/// Disjoint sets over entry indices. The root of a set is its smallest index.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // path halving
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        if ra < rb {
            self.parent[rb] = ra;
        } else {
            self.parent[ra] = rb;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Superseded config name to canonical name.
    pub renames: BTreeMap<String, String>,
}

impl DedupReport {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

fn rewrite_line_configurations(arena: &mut ObjectArena, renames: &BTreeMap<String, String>) {
    if renames.is_empty() {
        return;
    }
    for (_, obj) in arena.iter_mut() {
        for config in obj.configs.iter_mut() {
            if let ConfigBody::LineConfiguration(lc) = &mut config.body {
                lc.rewrite_references(|name| renames.get(name).cloned());
            }
        }
    }
}

/// Collapse identical configs of one kind; returns the renames made.
fn collapse_kind(
    arena: &mut ObjectArena,
    kind: ConfigKind,
    diagnostics: &mut ConversionDiagnostics,
) -> BTreeMap<String, String> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for (_, obj) in arena.iter() {
        for config in obj.configs.iter().filter(|c| c.kind() == kind) {
            match serde_json::to_string(&config.body) {
                Ok(key) => entries.push((key, config.name.clone())),
                Err(e) => diagnostics.add_warning_with_entity(
                    "numeric",
                    &format!("configuration not comparable: {}", e),
                    &config.name,
                ),
            }
        }
    }
    entries.sort();

    let mut sets = UnionFind::new(entries.len());
    for i in 1..entries.len() {
        if entries[i].0 == entries[i - 1].0 {
            sets.union(i - 1, i);
        }
    }

    let mut renames = BTreeMap::new();
    for i in 0..entries.len() {
        let root = sets.find(i);
        if root != i {
            renames.insert(entries[i].1.clone(), entries[root].1.clone());
        }
    }

    if !renames.is_empty() {
        for (_, obj) in arena.iter_mut() {
            obj.configs
                .retain(|c| c.kind() != kind || !renames.contains_key(&c.name));
        }
    }
    renames
}

/// Collapse structurally identical configs and point every reference at the
/// canonical survivor.
pub fn deduplicate_configs(
    arena: &mut ObjectArena,
    diagnostics: &mut ConversionDiagnostics,
) -> DedupReport {
    let mut renames = BTreeMap::new();
    for kind in ConfigKind::DEPENDENCY_ORDER {
        if kind == ConfigKind::LineConfiguration {
            rewrite_line_configurations(arena, &renames);
        }
        let collapsed = collapse_kind(arena, kind, diagnostics);
        tracing::debug!(kind = kind.as_str(), collapsed = collapsed.len(), "deduplicated");
        renames.extend(collapsed);
    }

    for (_, obj) in arena.iter_mut() {
        if let Some(slot) = obj.element.configuration_mut() {
            if let Some(canonical) = slot.as_deref().and_then(|name| renames.get(name)) {
                *slot = Some(canonical.clone());
            }
        }
    }

    diagnostics.stats.renamed_configs += renames.len();
    DedupReport { renames }
}
