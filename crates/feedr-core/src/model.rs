//! Network objects: the translated units of a feeder model.

use serde::Serialize;

use crate::configuration::{ConfigBody, ConfigObject, LineConfiguration};
use crate::phase::{Phase, PhaseSet};
use crate::units::{Amperes, Feet, Kilovars, Kilowatts, Volts};
use crate::ObjectId;

/// Canvas position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// How an object takes part in the reconstructed topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Links two endpoints through `from`/`to`.
    FromTo,
    /// An endpoint other objects hang off.
    Nodable,
    /// Hosted at a single point through `parent`.
    Parentable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Wye,
    Delta,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub length: Feet,
    pub connection: ConnectionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacitorControl {
    Manual,
    Volt,
    Var,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capacitor {
    pub capacitor_a: Kilovars,
    pub capacitor_b: Kilovars,
    pub capacitor_c: Kilovars,
    pub rated_voltage: Volts,
    pub control: CapacitorControl,
    pub connection: ConnectionType,
}

impl Capacitor {
    /// Zero the banks on primary phases outside `phases`.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        for (phase, bank) in [
            (Phase::A, &mut self.capacitor_a),
            (Phase::B, &mut self.capacitor_b),
            (Phase::C, &mut self.capacitor_c),
        ] {
            if !phases.contains(phase) {
                *bank = Kilovars(0.0);
            }
        }
    }
}

/// Link whose parameters live entirely in a configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Configured {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub status: SwitchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fuse {
    pub current_limit: Amperes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recloser {
    pub current_limit: Amperes,
    pub max_tries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Motor {
    pub horsepower: f64,
    pub rated_voltage: Volts,
    pub power_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneratorType {
    Synchronous,
    Induction,
    Inverter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generator {
    pub rated_power: Kilowatts,
    pub rated_reactive_power: Kilovars,
    pub rated_voltage: Volts,
    pub generator_type: GeneratorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadClass {
    Residential,
    Commercial,
    Industrial,
    Agricultural,
}

/// Where a load sits in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSite {
    /// A bus that carries demand itself (a node with declared power).
    Bus,
    /// A consumer hung off a node.
    Attached,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerDemand {
    pub kw: Kilowatts,
    pub kvar: Kilovars,
}

impl PowerDemand {
    pub fn new(kw: f64, kvar: f64) -> Self {
        Self {
            kw: Kilowatts(kw),
            kvar: Kilovars(kvar),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.kw.value() == 0.0 && self.kvar.value() == 0.0
    }
}

impl std::ops::Add for PowerDemand {
    type Output = PowerDemand;
    fn add(self, rhs: Self) -> Self::Output {
        PowerDemand {
            kw: self.kw + rhs.kw,
            kvar: self.kvar + rhs.kvar,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseDemand {
    pub a: PowerDemand,
    pub b: PowerDemand,
    pub c: PowerDemand,
}

impl PhaseDemand {
    pub fn get(&self, phase: Phase) -> PowerDemand {
        match phase {
            Phase::A => self.a,
            Phase::B => self.b,
            Phase::C => self.c,
            Phase::N | Phase::S => PowerDemand::default(),
        }
    }

    pub fn get_mut(&mut self, phase: Phase) -> Option<&mut PowerDemand> {
        match phase {
            Phase::A => Some(&mut self.a),
            Phase::B => Some(&mut self.b),
            Phase::C => Some(&mut self.c),
            Phase::N | Phase::S => None,
        }
    }

    /// Zero the demand on primary phases outside `phases`.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        for phase in Phase::PRIMARY {
            if phases.contains(phase) {
                continue;
            }
            if let Some(demand) = self.get_mut(phase) {
                *demand = PowerDemand::default();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    pub class: LoadClass,
    pub site: LoadSite,
    pub demand: PhaseDemand,
    pub customers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriplexLoad {
    pub class: LoadClass,
    pub power_12: PowerDemand,
}

/// Kind tag plus kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum Element {
    OverheadLine(Line),
    UndergroundLine(Line),
    Capacitor(Capacitor),
    Regulator(Configured),
    Transformer(Configured),
    Switch(Switch),
    Fuse(Fuse),
    Recloser(Recloser),
    Node,
    Source,
    Motor(Motor),
    Generator(Generator),
    Load(Load),
    TriplexNode,
    TriplexLoad(TriplexLoad),
}

impl Element {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::OverheadLine(_) => "overhead_line",
            Element::UndergroundLine(_) => "underground_line",
            Element::Capacitor(_) => "capacitor",
            Element::Regulator(_) => "regulator",
            Element::Transformer(_) => "transformer",
            Element::Switch(_) => "switch",
            Element::Fuse(_) => "fuse",
            Element::Recloser(_) => "recloser",
            Element::Node => "node",
            Element::Source => "source",
            Element::Motor(_) => "motor",
            Element::Generator(_) => "generator",
            Element::Load(_) => "load",
            Element::TriplexNode => "triplex_node",
            Element::TriplexLoad(_) => "triplex_load",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Element::OverheadLine(_)
            | Element::UndergroundLine(_)
            | Element::Regulator(_)
            | Element::Transformer(_)
            | Element::Switch(_)
            | Element::Fuse(_)
            | Element::Recloser(_) => Role::FromTo,
            Element::Node | Element::Source | Element::TriplexNode => Role::Nodable,
            Element::Load(load) if load.site == LoadSite::Bus => Role::Nodable,
            Element::Load(_)
            | Element::Capacitor(_)
            | Element::Motor(_)
            | Element::Generator(_)
            | Element::TriplexLoad(_) => Role::Parentable,
        }
    }

    pub fn is_link(&self) -> bool {
        self.role() == Role::FromTo
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Element::OverheadLine(_) | Element::UndergroundLine(_))
    }

    /// Drop per-phase quantities carried on phases outside `phases`.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        match self {
            Element::Load(load) => load.demand.retain_phases(phases),
            Element::Capacitor(capacitor) => capacitor.retain_phases(phases),
            _ => {}
        }
    }

    /// Name of the configuration this object points at, if it has one.
    pub fn configuration(&self) -> Option<&str> {
        match self {
            Element::OverheadLine(line) | Element::UndergroundLine(line) => {
                line.configuration.as_deref()
            }
            Element::Regulator(c) | Element::Transformer(c) => c.configuration.as_deref(),
            _ => None,
        }
    }

    pub fn configuration_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Element::OverheadLine(line) | Element::UndergroundLine(line) => {
                Some(&mut line.configuration)
            }
            Element::Regulator(c) | Element::Transformer(c) => Some(&mut c.configuration),
            _ => None,
        }
    }
}

/// One translated unit of the feeder.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkObject {
    pub name: String,
    pub guid: String,
    pub parent_guid: String,
    pub element: Element,
    pub phases: PhaseSet,
    /// `None` when the source coordinates could not be read.
    pub coordinates: Option<Point>,
    pub from: Option<ObjectId>,
    pub to: Option<ObjectId>,
    pub parent: Option<ObjectId>,
    pub nominal_voltage: Option<Volts>,
    pub configs: Vec<ConfigObject>,
    /// Set when the parent relation could not be classified.
    pub unresolved: bool,
    /// 1-based primary-table line this object came from.
    pub line: Option<usize>,
}

impl NetworkObject {
    pub fn new(name: impl Into<String>, element: Element, phases: PhaseSet) -> Self {
        Self {
            name: name.into(),
            guid: String::new(),
            parent_guid: String::new(),
            element,
            phases,
            coordinates: None,
            from: None,
            to: None,
            parent: None,
            nominal_voltage: None,
            configs: Vec::new(),
            unresolved: false,
            line: None,
        }
    }

    pub fn with_guids(mut self, guid: impl Into<String>, parent_guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self.parent_guid = parent_guid.into();
        self
    }

    pub fn with_coordinates(mut self, coordinates: Option<Point>) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn role(&self) -> Role {
        self.element.role()
    }

    /// The object this one hangs off: `parent` for attachments, `from` for links.
    pub fn upstream(&self) -> Option<ObjectId> {
        self.parent.or(self.from)
    }

    /// Every arena reference this object holds.
    pub fn references(&self) -> impl Iterator<Item = ObjectId> {
        [self.from, self.to, self.parent].into_iter().flatten()
    }

    /// Replace every reference to `old` with `new`.
    pub fn redirect(&mut self, old: ObjectId, new: ObjectId) {
        for slot in [&mut self.from, &mut self.to, &mut self.parent] {
            if *slot == Some(old) {
                *slot = Some(new);
            }
        }
    }

    /// Rename the object, carrying along embedded configs named `<old>_...`.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        let old_prefix = format!("{}_", self.name);
        let rebase = |name: &str| {
            name.strip_prefix(old_prefix.as_str())
                .map(|rest| format!("{}_{}", new_name, rest))
        };
        for config in &mut self.configs {
            if let Some(renamed) = rebase(&config.name) {
                config.name = renamed;
            }
            if let ConfigBody::LineConfiguration(lc) = &mut config.body {
                lc.rewrite_references(&rebase);
            }
        }
        if let Some(slot) = self.element.configuration_mut() {
            if let Some(renamed) = slot.as_deref().and_then(&rebase) {
                *slot = Some(renamed);
            }
        }
        self.name = new_name;
    }

    pub fn embedded(&self, name: &str) -> Option<&ConfigObject> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// The line configuration this line points at, when it is embedded here.
    pub fn line_configuration_mut(&mut self) -> Option<&mut LineConfiguration> {
        let target = self.element.configuration()?.to_string();
        self.configs
            .iter_mut()
            .find(|c| c.name == target)
            .and_then(|c| match &mut c.body {
                ConfigBody::LineConfiguration(lc) => Some(lc),
                _ => None,
            })
    }
}
