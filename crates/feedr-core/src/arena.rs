//! Object arena shared by every conversion pass.
//!
//! Objects live in slots addressed by stable [`ObjectId`]s. Removing an
//! object leaves an empty slot so ids held elsewhere never shift; names of
//! removed objects stay reserved so a later object can never reuse one.

use std::collections::HashSet;

use crate::model::NetworkObject;
use crate::ObjectId;

/// Replace characters that downstream solvers reject in object names.
pub fn sanitize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct ObjectArena {
    slots: Vec<Option<NetworkObject>>,
    names: HashSet<String>,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            names: HashSet::with_capacity(capacity),
        }
    }

    /// Pick a name that no object has used yet.
    ///
    /// Tries `candidate`, then `fallback` (typically the GUID), then
    /// `candidate` with a numeric suffix.
    pub fn unique_name(&mut self, candidate: &str, fallback: &str) -> String {
        let candidate = sanitize_name(candidate);
        let fallback = sanitize_name(fallback);
        let base = if candidate.is_empty() {
            if fallback.is_empty() {
                "object".to_string()
            } else {
                fallback.clone()
            }
        } else {
            candidate
        };

        let chosen = if !self.names.contains(&base) {
            base
        } else if !fallback.is_empty() && !self.names.contains(&fallback) {
            fallback
        } else {
            let mut n = 1usize;
            loop {
                let attempt = format!("{}_{}", base, n);
                if !self.names.contains(&attempt) {
                    break attempt;
                }
                n += 1;
            }
        };
        self.names.insert(chosen.clone());
        chosen
    }

    /// Insert an object, renaming it if its name is empty or already taken.
    pub fn insert(&mut self, mut object: NetworkObject) -> ObjectId {
        let name = self.unique_name(&object.name, &object.guid);
        if name != object.name {
            object.rename(name);
        }
        let id = ObjectId::new(self.slots.len());
        self.slots.push(Some(object));
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&NetworkObject> {
        self.slots.get(id.value()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut NetworkObject> {
        self.slots.get_mut(id.value()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Take an object out, leaving its slot empty.
    pub fn remove(&mut self, id: ObjectId) -> Option<NetworkObject> {
        self.slots.get_mut(id.value()).and_then(Option::take)
    }

    /// Number of slots ever allocated (live or removed).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Ids of live objects in insertion order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &NetworkObject)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|obj| (ObjectId::new(i), obj)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut NetworkObject)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|obj| (ObjectId::new(i), obj)))
    }

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.iter().find(|(_, obj)| obj.name == name).map(|(id, _)| id)
    }

    pub fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.get(id).map(|obj| obj.name.as_str())
    }
}
