use feedr_core::{
    Element, Kilovolts, Load, LoadClass, LoadSite, NetworkObject, Phase, PhaseDemand, PhaseSet,
    PowerDemand,
};

use super::fields;
use super::RowReader;
use super::devices::DEFAULT_PRIMARY_KV;

/// A node row with any of these power cells nonzero becomes a bus-hosting load.
pub const NODE_PROMOTION_FIELDS: [usize; 6] = [
    fields::node::KW_A,
    fields::node::KW_A + 1,
    fields::node::KW_A + 2,
    fields::node::KVAR_A,
    fields::node::KVAR_A + 1,
    fields::node::KVAR_A + 2,
];

/// Class used when a consumer class code is missing or unknown.
pub const DEFAULT_CONSUMER_CLASS: LoadClass = LoadClass::Residential;

/// Buses are wye-connected with a neutral.
fn bus_phases(phases: PhaseSet) -> PhaseSet {
    let mut phases = phases;
    phases.insert(Phase::N);
    phases
}

fn consumer_class(row: &mut RowReader<'_>, index: usize) -> LoadClass {
    match row.text(index) {
        "1" => LoadClass::Residential,
        "2" => LoadClass::Commercial,
        "3" => LoadClass::Industrial,
        "4" => LoadClass::Agricultural,
        "" => DEFAULT_CONSUMER_CLASS,
        other => {
            row.warn(
                "parse",
                format!("unknown consumer class '{}', using residential", other),
            );
            DEFAULT_CONSUMER_CLASS
        }
    }
}

pub(super) fn plain_node(name: &str, phases: PhaseSet) -> NetworkObject {
    NetworkObject::new(name, Element::Node, bus_phases(phases))
}

pub(super) fn node(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    use fields::node as f;

    let mut power = [0.0; 6];
    for (value, column) in power.iter_mut().zip(NODE_PROMOTION_FIELDS) {
        *value = row.number_or(column, 0.0, "node power");
    }
    if power.iter().all(|v| *v == 0.0) {
        return plain_node(name, phases);
    }

    let mut demand = PhaseDemand::default();
    for (i, phase) in Phase::PRIMARY.into_iter().enumerate() {
        if let Some(slot) = demand.get_mut(phase) {
            *slot = PowerDemand::new(power[i], power[i + 3]);
        }
    }
    let class = consumer_class(row, f::CLASS);
    NetworkObject::new(
        name,
        Element::Load(Load {
            class,
            site: LoadSite::Bus,
            demand,
            customers: 1,
        }),
        bus_phases(phases),
    )
}

pub(super) fn source(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    let kv = match row.number(fields::source::KV, "source kV") {
        Some(kv) if kv > 0.0 => kv,
        _ => {
            row.warn(
                "voltage",
                format!("source without nominal voltage, using {} kV", DEFAULT_PRIMARY_KV),
            );
            DEFAULT_PRIMARY_KV
        }
    };
    let mut object = NetworkObject::new(name, Element::Source, bus_phases(phases));
    object.nominal_voltage = Some(Kilovolts(kv).to_volts());
    object
}

pub(super) fn consumer(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    use fields::consumer as f;

    let kw = row.number_or(f::KW, 0.0, "consumer kW");
    let kvar = row.number_or(f::KVAR, 0.0, "consumer kvar");
    let class = consumer_class(row, f::CLASS);
    let customers = row.positive_or(f::CUSTOMERS, 1.0, "customer count").round() as u32;

    let served: Vec<Phase> = if phases.primary_count() == 0 {
        vec![Phase::A]
    } else {
        phases.primary_phases().collect()
    };
    let share = served.len() as f64;
    let mut demand = PhaseDemand::default();
    for phase in served {
        if let Some(slot) = demand.get_mut(phase) {
            *slot = PowerDemand::new(kw / share, kvar / share);
        }
    }

    NetworkObject::new(
        name,
        Element::Load(Load {
            class,
            site: LoadSite::Attached,
            demand,
            customers: customers.max(1),
        }),
        phases,
    )
}
