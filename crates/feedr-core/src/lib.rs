//! # feedr-core: Feeder Model Core
//!
//! Data structures shared by every stage of a feeder conversion.
//!
//! ## Design Philosophy
//!
//! A distribution feeder is modeled as a set of [`NetworkObject`]s held in an
//! [`ObjectArena`]:
//! - **Links** (lines, transformers, regulators, switches, fuses, reclosers)
//!   connect two endpoints through `from`/`to`
//! - **Nodes** (buses, sources, bus-hosting loads) are the endpoints
//! - **Attachments** (consumer loads, capacitors, motors, generators) hang off
//!   one node through `parent`
//!
//! Topology is expressed with stable [`ObjectId`] handles into the arena rather
//! than names, so passes can rename, merge and drop objects without chasing
//! string references. Electrical parameters of lines, transformers and
//! regulators live in named [`ConfigObject`]s so identical ones can be shared.
//!
//! ## Quick Start
//!
//! ```rust
//! use feedr_core::*;
//!
//! let mut arena = ObjectArena::new();
//! let source = arena.insert(NetworkObject::new("sub", Element::Source, PhaseSet::ABC));
//! let mut meter = NetworkObject::new(
//!     "meter",
//!     Element::Load(Load {
//!         class: LoadClass::Residential,
//!         site: LoadSite::Attached,
//!         demand: PhaseDemand::default(),
//!         customers: 1,
//!     }),
//!     PhaseSet::parse("A").unwrap(),
//! );
//! meter.parent = Some(source);
//! let meter = arena.insert(meter);
//!
//! assert_eq!(arena.get(meter).unwrap().upstream(), Some(source));
//! ```
//!
//! ## Modules
//!
//! - [`arena`] - object storage with unique naming
//! - [`model`] - [`NetworkObject`] and its [`Element`] kinds
//! - [`configuration`] - line, transformer and regulator configurations
//! - [`phase`] - [`PhaseSet`] bit sets
//! - [`units`] - unit newtypes ([`Volts`], [`Feet`], ...)
//! - [`diagnostics`] - warnings and counters collected during conversion
//! - [`graph_utils`] - connected components over the arena
//! - [`error`] - [`FeedrError`]

pub mod arena;
pub mod configuration;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod model;
pub mod phase;
pub mod units;

use serde::Serialize;

pub use arena::{sanitize_name, ObjectArena};
pub use configuration::{
    ConfigBody, ConfigKind, ConfigObject, ControlLevel, Impedance, InstallType,
    LineConfiguration, LineSpacing, OverheadConductor, RegulatorConfiguration, RegulatorControl,
    TransformerConfiguration, TransformerConnection, UndergroundConductor,
};
pub use diagnostics::{ConversionDiagnostics, ConversionStats, DiagnosticIssue, Severity};
pub use error::{FeedrError, FeedrResult};
pub use graph_utils::{source_components, ComponentSummary};
pub use model::{
    Capacitor, CapacitorControl, ConnectionType, Configured, Element, Fuse, Generator,
    GeneratorType, Line, Load, LoadClass, LoadSite, Motor, NetworkObject, PhaseDemand, Point,
    PowerDemand, Recloser, Role, Switch, SwitchStatus, TriplexLoad,
};
pub use phase::{Phase, PhaseSet};
pub use units::{Amperes, Feet, KilovoltAmperes, Kilovars, Kilovolts, Kilowatts, Volts};

/// Handle of an object in an [`ObjectArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(usize);

impl ObjectId {
    #[inline]
    pub fn new(value: usize) -> Self {
        ObjectId(value)
    }

    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}
