//! Secondary system expansion.
//!
//! A primary transformer that only serves residential load is replaced by
//! one center-tapped transformer per active phase, each feeding its own
//! triplex node and triplex load carrying that phase's demand.

use feedr_core::{
    ConfigBody, ConfigObject, Configured, ConversionDiagnostics, Element, KilovoltAmperes, Load,
    LoadClass, LoadSite, NetworkObject, ObjectArena, ObjectId, Phase, PhaseSet, PowerDemand,
    TransformerConfiguration, TransformerConnection, TriplexLoad, Volts,
};

/// Nominal voltage of the split-phase secondary.
pub const TRIPLEX_VOLTS: f64 = 120.0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    pub expanded: usize,
    pub created: usize,
}

/// Everything one expansion replaces.
struct Candidate {
    transformer: ObjectId,
    node: ObjectId,
    loads: Vec<ObjectId>,
    config: TransformerConfiguration,
}

fn residential(element: &Element) -> Option<&Load> {
    match element {
        Element::Load(load) if load.class == LoadClass::Residential => Some(load),
        _ => None,
    }
}

fn transformer_config(obj: &NetworkObject) -> Option<TransformerConfiguration> {
    let config = obj.embedded(obj.element.configuration()?)?;
    match &config.body {
        ConfigBody::TransformerConfiguration(tc) => Some(tc.clone()),
        _ => None,
    }
}

fn candidate(arena: &ObjectArena, id: ObjectId) -> Option<Candidate> {
    let xfmr = arena.get(id)?;
    if !matches!(xfmr.element, Element::Transformer(_)) || xfmr.from.is_none() {
        return None;
    }
    let config = transformer_config(xfmr)?;
    if config.connect_type == TransformerConnection::SinglePhaseCenterTapped {
        return None;
    }
    let node_id = xfmr.to?;
    let node = arena.get(node_id)?;
    let node_is_bus_load = match &node.element {
        Element::Node => false,
        Element::Load(load) if load.site == LoadSite::Bus && load.class == LoadClass::Residential => {
            true
        }
        _ => return None,
    };

    let mut loads = Vec::new();
    for (other_id, other) in arena.iter() {
        if other_id == id || other_id == node_id {
            continue;
        }
        if other.to == Some(node_id) || other.from == Some(node_id) {
            return None;
        }
        if other.parent == Some(node_id) {
            match &other.element {
                Element::Load(load)
                    if load.site == LoadSite::Attached && load.class == LoadClass::Residential =>
                {
                    loads.push(other_id)
                }
                _ => return None,
            }
        }
    }
    if loads.is_empty() && !node_is_bus_load {
        return None;
    }
    Some(Candidate {
        transformer: id,
        node: node_id,
        loads,
        config,
    })
}

fn phase_demand(arena: &ObjectArena, ids: impl Iterator<Item = ObjectId>, phase: Phase) -> PowerDemand {
    ids.filter_map(|id| arena.get(id))
        .filter_map(|obj| residential(&obj.element))
        .fold(PowerDemand::default(), |acc, load| acc + load.demand.get(phase))
}

fn expand(arena: &mut ObjectArena, c: Candidate) -> usize {
    let Some(xfmr) = arena.get(c.transformer) else {
        return 0;
    };
    let (xfmr_name, xfmr_phases, from) = (xfmr.name.clone(), xfmr.phases, xfmr.from);
    let Some(node) = arena.get(c.node) else {
        return 0;
    };
    let (node_name, coordinates) = (node.name.clone(), node.coordinates);

    let mut phases: Vec<Phase> = xfmr_phases.primary_phases().collect();
    if phases.is_empty() {
        phases.push(Phase::A);
    }
    let active = phases.len() as f64;
    let demand_sources: Vec<ObjectId> = std::iter::once(c.node).chain(c.loads.iter().copied()).collect();

    let mut created = Vec::new();
    for phase in phases {
        let mut triplex = PhaseSet::single(phase);
        triplex.insert(Phase::S);

        let rating = match c.config.phase_rating(phase) {
            kva if kva.is_positive() => kva,
            _ => c.config.power_rating / active,
        };
        let zero = KilovoltAmperes(0.0);
        let config = TransformerConfiguration {
            connect_type: TransformerConnection::SinglePhaseCenterTapped,
            power_rating: rating,
            power_a_rating: if phase == Phase::A { rating } else { zero },
            power_b_rating: if phase == Phase::B { rating } else { zero },
            power_c_rating: if phase == Phase::C { rating } else { zero },
            secondary_voltage: Volts(TRIPLEX_VOLTS),
            ..c.config.clone()
        };

        let xf_name = format!("{}_{}", xfmr_name, phase.letter());
        let config_name = format!("{}_config", xf_name);
        let mut new_xf = NetworkObject::new(
            xf_name,
            Element::Transformer(Configured {
                configuration: Some(config_name.clone()),
            }),
            triplex,
        )
        .with_coordinates(coordinates);
        new_xf.configs.push(ConfigObject::new(
            config_name,
            ConfigBody::TransformerConfiguration(config),
        ));
        new_xf.from = from;

        let mut tn = NetworkObject::new(
            format!("{}_{}", node_name, phase.letter()),
            Element::TriplexNode,
            triplex,
        )
        .with_coordinates(coordinates);
        tn.nominal_voltage = Some(Volts(TRIPLEX_VOLTS));
        let tn_id = arena.insert(tn);
        new_xf.to = Some(tn_id);

        let mut tl = NetworkObject::new(
            format!("{}_{}_load", node_name, phase.letter()),
            Element::TriplexLoad(TriplexLoad {
                class: LoadClass::Residential,
                power_12: phase_demand(arena, demand_sources.iter().copied(), phase),
            }),
            triplex,
        )
        .with_coordinates(coordinates);
        tl.parent = Some(tn_id);
        tl.nominal_voltage = Some(Volts(TRIPLEX_VOLTS));

        created.push(arena.insert(new_xf));
        created.push(tn_id);
        created.push(arena.insert(tl));
    }

    arena.remove(c.transformer);
    arena.remove(c.node);
    for load in c.loads {
        arena.remove(load);
    }
    created.len()
}

/// Replace residential-only transformers with per-phase triplex equipment.
///
/// Running it again on its own output finds nothing to do.
pub fn expand_secondaries(
    arena: &mut ObjectArena,
    diagnostics: &mut ConversionDiagnostics,
) -> ExpansionReport {
    let mut report = ExpansionReport::default();
    for id in arena.ids() {
        if let Some(c) = candidate(arena, id) {
            report.created += expand(arena, c);
            report.expanded += 1;
        }
    }
    diagnostics.stats.expanded_transformers += report.expanded;
    tracing::debug!(
        expanded = report.expanded,
        created = report.created,
        "secondary systems expanded"
    );
    report
}
