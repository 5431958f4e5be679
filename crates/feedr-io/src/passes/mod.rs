//! Whole-model passes run after translation, in pipeline order.

pub mod assemble;
pub mod connectivity;
pub mod dedup;
pub mod phases;
pub mod secondary;
pub mod voltage;

pub use assemble::{assemble, FeederModel, ModelEntry, ObjectRecord};
pub use connectivity::{synthesize_connectivity, ConnectivityReport};
pub use dedup::{deduplicate_configs, DedupReport, UnionFind};
pub use phases::{reconcile_phases, PhaseReport};
pub use secondary::{expand_secondaries, ExpansionReport};
pub use voltage::{propagate_voltage, VoltageReport};
