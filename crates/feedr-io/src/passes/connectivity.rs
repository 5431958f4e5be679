//! Connectivity synthesis from the GUID parent/child hierarchy.
//!
//! The primary table only says which record hangs under which. Whether that
//! means `parent`, `from` or `to` depends on the roles of the two objects:
//!
//! | child      | parent   | result                                    |
//! |------------|----------|-------------------------------------------|
//! | attachment | node     | `child.parent = parent`                   |
//! | link       | node     | `child.from = parent`                     |
//! | attachment | link     | `child.parent = parent.to` (created)      |
//! | link       | link     | `child.from = parent.to` (created)        |
//! | node       | link     | `parent.to = child`                       |
//!
//! Where a link has no `to` yet, a node named `<parent>_<child>_node` is
//! synthesized. Anything else leaves the child unresolved.

use std::collections::{HashMap, HashSet};

use feedr_core::{
    ConversionDiagnostics, Element, NetworkObject, ObjectArena, ObjectId, Role,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectivityReport {
    pub synthesized: usize,
    pub merged: usize,
    pub unresolved: usize,
}

/// Map GUIDs to objects; the first object carrying a GUID owns it.
pub fn guid_index(
    arena: &ObjectArena,
    diagnostics: &mut ConversionDiagnostics,
) -> HashMap<String, ObjectId> {
    let mut index = HashMap::with_capacity(arena.live_count());
    for (id, obj) in arena.iter() {
        if obj.guid.is_empty() {
            continue;
        }
        if index.contains_key(&obj.guid) {
            diagnostics.add_warning_with_entity(
                "topology",
                &format!("duplicate GUID '{}' ignored", obj.guid),
                &obj.name,
            );
            continue;
        }
        index.insert(obj.guid.clone(), id);
    }
    index
}

struct Synthesizer<'a> {
    arena: &'a mut ObjectArena,
    synthetic: HashSet<ObjectId>,
    report: ConnectivityReport,
}

impl Synthesizer<'_> {
    fn mark_unresolved(
        &mut self,
        child: ObjectId,
        reason: String,
        diagnostics: &mut ConversionDiagnostics,
    ) {
        if let Some(obj) = self.arena.get_mut(child) {
            obj.unresolved = true;
            diagnostics.add_warning_with_entity("topology", &reason, &obj.name);
        }
        self.report.unresolved += 1;
    }

    /// The `to` endpoint of `link`, synthesizing one if needed. The endpoint's
    /// phases are widened to cover `child`.
    fn endpoint(&mut self, link: ObjectId, child: ObjectId) -> Option<ObjectId> {
        let (link_name, link_phases, existing) = {
            let obj = self.arena.get(link)?;
            (obj.name.clone(), obj.phases, obj.to)
        };
        let (child_name, child_phases, child_coords) = {
            let obj = self.arena.get(child)?;
            (obj.name.clone(), obj.phases, obj.coordinates)
        };

        if let Some(to) = existing {
            if let Some(node) = self.arena.get_mut(to) {
                node.phases = node.phases | child_phases;
            }
            return Some(to);
        }

        let node = NetworkObject::new(
            format!("{}_{}_node", link_name, child_name),
            Element::Node,
            link_phases | child_phases,
        )
        .with_coordinates(child_coords);
        let id = self.arena.insert(node);
        self.synthetic.insert(id);
        self.report.synthesized += 1;
        if let Some(obj) = self.arena.get_mut(link) {
            obj.to = Some(id);
        }
        Some(id)
    }

    /// Bind a real node as `link.to`, absorbing a synthesized placeholder.
    fn bind_to(&mut self, link: ObjectId, node: ObjectId, diagnostics: &mut ConversionDiagnostics) {
        let existing = self.arena.get(link).and_then(|o| o.to);
        match existing {
            None => {
                if let Some(obj) = self.arena.get_mut(link) {
                    obj.to = Some(node);
                }
            }
            Some(current) if current == node => {}
            Some(placeholder) if self.synthetic.contains(&placeholder) => {
                if let Some(removed) = self.arena.remove(placeholder) {
                    if let Some(real) = self.arena.get_mut(node) {
                        real.phases = real.phases | removed.phases;
                    }
                }
                for (_, obj) in self.arena.iter_mut() {
                    obj.redirect(placeholder, node);
                }
                self.synthetic.remove(&placeholder);
                self.report.merged += 1;
            }
            Some(current) => {
                let link_name = self.arena.name_of(link).unwrap_or_default().to_string();
                let current_name = self.arena.name_of(current).unwrap_or_default().to_string();
                if let Some(obj) = self.arena.get(node) {
                    diagnostics.add_warning_with_entity(
                        "topology",
                        &format!(
                            "'{}' already feeds '{}'; keeping the first binding",
                            link_name, current_name
                        ),
                        &obj.name,
                    );
                }
            }
        }
    }
}

/// Assign `from`/`to`/`parent` for every object from its parent GUID.
pub fn synthesize_connectivity(
    arena: &mut ObjectArena,
    diagnostics: &mut ConversionDiagnostics,
) -> ConnectivityReport {
    let index = guid_index(arena, diagnostics);
    let order = arena.ids();
    let mut pass = Synthesizer {
        arena,
        synthetic: HashSet::new(),
        report: ConnectivityReport::default(),
    };

    for child in order {
        let Some(obj) = pass.arena.get(child) else {
            continue;
        };
        if obj.parent_guid.is_empty() {
            continue;
        }
        let child_role = obj.role();
        let parent_guid = obj.parent_guid.clone();

        let parent = match index.get(&parent_guid) {
            Some(&parent) if parent == child => {
                pass.mark_unresolved(child, "object is its own parent".into(), diagnostics);
                continue;
            }
            Some(&parent) if pass.arena.contains(parent) => parent,
            _ => {
                pass.mark_unresolved(
                    child,
                    format!("parent GUID '{}' not found", parent_guid),
                    diagnostics,
                );
                continue;
            }
        };
        let Some(parent_obj) = pass.arena.get(parent) else {
            continue;
        };
        let parent_role = parent_obj.role();

        match (child_role, parent_role) {
            (Role::Parentable, Role::Nodable) => {
                if let Some(obj) = pass.arena.get_mut(child) {
                    obj.parent = Some(parent);
                }
            }
            (Role::FromTo, Role::Nodable) => {
                if let Some(obj) = pass.arena.get_mut(child) {
                    obj.from = Some(parent);
                }
            }
            (Role::Parentable, Role::FromTo) => {
                if let Some(node) = pass.endpoint(parent, child) {
                    if let Some(obj) = pass.arena.get_mut(child) {
                        obj.parent = Some(node);
                    }
                }
            }
            (Role::FromTo, Role::FromTo) => {
                if let Some(node) = pass.endpoint(parent, child) {
                    if let Some(obj) = pass.arena.get_mut(child) {
                        obj.from = Some(node);
                    }
                }
            }
            (Role::Nodable, Role::FromTo) => pass.bind_to(parent, child, diagnostics),
            (_, _) => {
                let (child_kind, parent_kind) = (
                    pass.arena.get(child).map(|o| o.element.kind_name()).unwrap_or_default(),
                    pass.arena.get(parent).map(|o| o.element.kind_name()).unwrap_or_default(),
                );
                pass.mark_unresolved(
                    child,
                    format!("{} cannot hang under {}", child_kind, parent_kind),
                    diagnostics,
                );
            }
        }
    }

    let report = pass.report;
    diagnostics.stats.synthesized_nodes += report.synthesized - report.merged;
    tracing::debug!(
        synthesized = report.synthesized,
        merged = report.merged,
        unresolved = report.unresolved,
        "connectivity synthesized"
    );
    report
}
