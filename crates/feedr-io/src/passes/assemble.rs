//! Output assembly.
//!
//! Flattens the arena into the final keyed model: surviving objects first,
//! in arena order, followed by every configuration they reach.
//!
//! An object survives only if it is structurally whole (links have two
//! distinct ends, attachments a parent), carries a nominal voltage unless it
//! is a link, and references nothing that was dropped. Sourceless islands
//! left by GUID cycles or dangling chains never receive a voltage, so they
//! fall out here.

use std::collections::{BTreeMap, HashMap, HashSet};

use feedr_core::{
    ConfigBody, ConfigObject, ConversionDiagnostics, Element, ObjectArena, ObjectId, PhaseSet,
    Point, Role, Volts,
};
use serde::Serialize;

/// One emitted network object with its references resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectRecord {
    pub name: String,
    #[serde(flatten)]
    pub element: Element,
    pub phases: PhaseSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_voltage: Option<Volts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Object(ObjectRecord),
    Config(ConfigObject),
}

impl ModelEntry {
    pub fn name(&self) -> &str {
        match self {
            ModelEntry::Object(obj) => &obj.name,
            ModelEntry::Config(config) => &config.name,
        }
    }

    /// Kind tag as it appears in the serialized `object` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelEntry::Object(obj) => obj.element.kind_name(),
            ModelEntry::Config(config) => config.kind().as_str(),
        }
    }
}

/// The assembled feeder, keyed by emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeederModel {
    pub entries: BTreeMap<u64, ModelEntry>,
}

impl FeederModel {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.entries.values().filter_map(|e| match e {
            ModelEntry::Object(obj) => Some(obj),
            ModelEntry::Config(_) => None,
        })
    }

    pub fn configs(&self) -> impl Iterator<Item = &ConfigObject> {
        self.entries.values().filter_map(|e| match e {
            ModelEntry::Config(config) => Some(config),
            ModelEntry::Object(_) => None,
        })
    }

    pub fn get_object(&self, name: &str) -> Option<&ObjectRecord> {
        self.objects().find(|obj| obj.name == name)
    }

    pub fn get_config(&self, name: &str) -> Option<&ConfigObject> {
        self.configs().find(|config| config.name == name)
    }

    /// Entry counts per kind tag, sorted by tag.
    pub fn count_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.kind()).or_insert(0) += 1;
        }
        counts
    }

    fn push(&mut self, entry: ModelEntry) {
        let key = self.entries.len() as u64;
        self.entries.insert(key, entry);
    }
}

fn structurally_complete(arena: &ObjectArena, id: ObjectId) -> Result<(), &'static str> {
    let Some(obj) = arena.get(id) else {
        return Err("missing");
    };
    if obj.unresolved {
        return Err("parent could not be resolved");
    }
    match obj.role() {
        Role::FromTo if obj.from.is_none() || obj.to.is_none() => Err("link lacks an endpoint"),
        Role::FromTo if obj.from == obj.to => Err("link connects an object to itself"),
        Role::Parentable if obj.parent.is_none() => Err("attachment has no parent"),
        Role::Nodable | Role::Parentable if obj.nominal_voltage.is_none() => {
            Err("no source feeds this object")
        }
        _ => Ok(()),
    }
}

/// Objects that survive assembly, as a slot-indexed mask.
fn surviving(arena: &ObjectArena, diagnostics: &mut ConversionDiagnostics) -> Vec<bool> {
    let mut alive = vec![false; arena.slot_count()];
    for id in arena.ids() {
        match structurally_complete(arena, id) {
            Ok(()) => alive[id.value()] = true,
            Err(reason) => {
                if let Some(name) = arena.name_of(id) {
                    diagnostics.add_error_with_entity("topology", &format!("dropped: {}", reason), name);
                }
            }
        }
    }

    loop {
        let mut changed = false;
        for (id, obj) in arena.iter() {
            if !alive[id.value()] {
                continue;
            }
            if obj.references().any(|r| !alive[r.value()]) {
                alive[id.value()] = false;
                changed = true;
                diagnostics.add_error_with_entity(
                    "topology",
                    "dropped: references a dropped object",
                    &obj.name,
                );
            }
        }
        if !changed {
            break;
        }
    }
    alive
}

/// Configs reachable from the surviving objects, following line configuration references.
fn reachable_configs(arena: &ObjectArena, alive: &[bool]) -> HashSet<String> {
    let pool: HashMap<&str, &ConfigObject> = arena
        .iter()
        .flat_map(|(_, obj)| obj.configs.iter())
        .map(|c| (c.name.as_str(), c))
        .collect();

    let mut reached = HashSet::new();
    let mut stack: Vec<&str> = arena
        .iter()
        .filter(|(id, _)| alive[id.value()])
        .filter_map(|(_, obj)| obj.element.configuration())
        .collect();
    while let Some(name) = stack.pop() {
        if !reached.insert(name.to_string()) {
            continue;
        }
        if let Some(config) = pool.get(name) {
            stack.extend(config.body.references());
        }
    }
    reached
}

/// Flatten the arena into a [`FeederModel`], dropping incomplete objects.
pub fn assemble(arena: &mut ObjectArena, diagnostics: &mut ConversionDiagnostics) -> FeederModel {
    let alive = surviving(arena, diagnostics);
    let reached = reachable_configs(arena, &alive);
    let name_of = |id: Option<ObjectId>| id.and_then(|id| arena.name_of(id)).map(str::to_string);

    let mut model = FeederModel::default();
    for (id, obj) in arena.iter() {
        if !alive[id.value()] {
            continue;
        }
        model.push(ModelEntry::Object(ObjectRecord {
            name: obj.name.clone(),
            element: obj.element.clone(),
            phases: obj.phases,
            from: name_of(obj.from),
            to: name_of(obj.to),
            parent: name_of(obj.parent),
            nominal_voltage: obj.nominal_voltage,
            coordinates: obj.coordinates,
        }));
    }
    let object_count = model.len();

    let mut emitted = HashSet::new();
    for (_, obj) in arena.iter() {
        for config in &obj.configs {
            if reached.contains(&config.name) && emitted.insert(config.name.clone()) {
                model.push(ModelEntry::Config(config.clone()));
            }
        }
    }
    let missing = reached.len() - emitted.len();
    if missing > 0 {
        diagnostics.add_warning("lookup", &format!("{} referenced configurations not found", missing));
    }

    let dropped: Vec<ObjectId> = arena.ids().into_iter().filter(|id| !alive[id.value()]).collect();
    for id in &dropped {
        arena.remove(*id);
    }

    diagnostics.stats.dropped_objects += dropped.len();
    diagnostics.stats.objects = object_count;
    diagnostics.stats.configs = model.len() - object_count;
    tracing::debug!(
        objects = object_count,
        configs = model.len() - object_count,
        dropped = dropped.len(),
        "model assembled"
    );
    model
}

/// True when every configuration a line configuration names is present in the model.
pub fn references_resolve(model: &FeederModel) -> bool {
    let names: HashSet<&str> = model.entries.values().map(ModelEntry::name).collect();
    model.objects().all(|o| o.element.configuration().map_or(true, |c| names.contains(c)))
        && model.configs().all(|c| match &c.body {
            ConfigBody::LineConfiguration(lc) => lc.references().all(|r| names.contains(r)),
            _ => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedr_core::{
        ConnectionType, Feet, Line, LineConfiguration, LineSpacing, Load, LoadClass, LoadSite,
        NetworkObject, PhaseDemand,
    };

    fn line(name: &str, config: &str) -> NetworkObject {
        NetworkObject::new(
            name,
            Element::OverheadLine(Line {
                length: Feet(10.0),
                connection: ConnectionType::Wye,
                configuration: Some(config.into()),
            }),
            PhaseSet::ABC,
        )
    }

    fn consumer(name: &str) -> NetworkObject {
        energized(NetworkObject::new(
            name,
            Element::Load(Load {
                class: LoadClass::Residential,
                site: LoadSite::Attached,
                demand: PhaseDemand::default(),
                customers: 1,
            }),
            PhaseSet::ABC,
        ))
    }

    fn energized(mut obj: NetworkObject) -> NetworkObject {
        obj.nominal_voltage = Some(Volts(7200.0));
        obj
    }

    fn bus(name: &str, element: Element) -> NetworkObject {
        energized(NetworkObject::new(name, element, PhaseSet::ABC))
    }

    #[test]
    fn incomplete_objects_drop_transitively() {
        let mut arena = ObjectArena::new();
        let src = arena.insert(bus("src", Element::Source));
        let dangling = {
            let mut l = line("l1", "l1_config");
            l.from = Some(src);
            arena.insert(l)
        };
        let mut child = consumer("c1");
        child.parent = Some(dangling);
        arena.insert(child);
        let mut diag = ConversionDiagnostics::new();

        let model = assemble(&mut arena, &mut diag);
        assert_eq!(model.len(), 1);
        assert!(model.get_object("src").is_some());
        assert_eq!(diag.stats.dropped_objects, 2);
        assert_eq!(diag.error_count(), 2);
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn shared_configs_survive_their_owner() {
        let mut arena = ObjectArena::new();
        let src = arena.insert(bus("src", Element::Source));
        let n1 = arena.insert(bus("n1", Element::Node));

        // owner of the canonical configs, but missing its `to`
        let mut owner = line("l0", "l0_config");
        owner.from = Some(src);
        owner.configs.push(ConfigObject::new(
            "l0_spacing",
            ConfigBody::LineSpacing(LineSpacing::default()),
        ));
        owner.configs.push(ConfigObject::new(
            "l0_config",
            ConfigBody::LineConfiguration(LineConfiguration {
                spacing: Some("l0_spacing".into()),
                ..LineConfiguration::default()
            }),
        ));
        owner.configs.push(ConfigObject::new(
            "l0_unused",
            ConfigBody::LineSpacing(LineSpacing::default()),
        ));
        arena.insert(owner);

        let mut user = line("l1", "l0_config");
        user.from = Some(src);
        user.to = Some(n1);
        arena.insert(user);

        let model = assemble(&mut arena, &mut ConversionDiagnostics::new());
        let names: Vec<&str> = model.entries.values().map(ModelEntry::name).collect();
        assert_eq!(names, vec!["src", "n1", "l1", "l0_spacing", "l0_config"]);
        assert!(references_resolve(&model));
        assert_eq!(model.count_by_kind()["line_spacing"], 1);
    }

    #[test]
    fn records_carry_reference_names() {
        let mut arena = ObjectArena::new();
        let src = arena.insert(bus("src", Element::Source));
        let mut c = consumer("c1");
        c.parent = Some(src);
        arena.insert(c);

        let model = assemble(&mut arena, &mut ConversionDiagnostics::new());
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["1"]["name"], "c1");
        assert_eq!(json["1"]["object"], "load");
        assert_eq!(json["1"]["parent"], "src");
        assert_eq!(json["1"]["phases"], "ABC");
        assert!(json["0"].get("parent").is_none());
    }

    #[test]
    fn self_loops_are_dropped() {
        let mut arena = ObjectArena::new();
        arena.insert(bus("src", Element::Source));
        let n1 = arena.insert(bus("n1", Element::Node));
        let mut looped = line("l1", "l1_config");
        looped.from = Some(n1);
        looped.to = Some(n1);
        arena.insert(looped);
        let mut diag = ConversionDiagnostics::new();

        let model = assemble(&mut arena, &mut diag);
        assert!(model.get_object("l1").is_none());
        assert!(model.get_object("n1").is_some());
        let errors: Vec<_> = diag.issues_by_category("topology").collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entity.as_deref(), Some("l1"));
        assert!(errors[0].message.contains("itself"));
    }

    #[test]
    fn unenergized_islands_are_dropped() {
        let mut arena = ObjectArena::new();
        arena.insert(bus("src", Element::Source));
        let a = arena.insert(NetworkObject::new("a", Element::Node, PhaseSet::ABC));
        let b = arena.insert(NetworkObject::new("b", Element::Node, PhaseSet::ABC));
        let mut bridge = line("l1", "l1_config");
        bridge.from = Some(a);
        bridge.to = Some(b);
        arena.insert(bridge);
        let mut hanger = consumer("c1");
        hanger.parent = Some(b);
        arena.insert(hanger);
        let mut diag = ConversionDiagnostics::new();

        let model = assemble(&mut arena, &mut diag);
        let names: Vec<&str> = model.entries.values().map(ModelEntry::name).collect();
        assert_eq!(names, vec!["src"]);
        assert_eq!(diag.stats.dropped_objects, 4);
        assert!(model
            .objects()
            .filter(|o| !o.element.is_link())
            .all(|o| o.nominal_voltage.is_some()));
    }
}
