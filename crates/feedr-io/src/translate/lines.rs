use feedr_core::{
    ConfigBody, ConfigObject, ConnectionType, Element, Feet, Line, LineConfiguration, NetworkObject,
    Phase, PhaseSet,
};

use super::fields::line as f;
use super::{RowReader, TranslateContext};
use crate::geometry;

/// Length used when the record gives none.
pub const DEFAULT_LINE_LENGTH_FT: f64 = 1.0;

pub(crate) fn connection_from_code(row: &mut RowReader<'_>, index: usize) -> ConnectionType {
    match row.text(index) {
        "" | "0" => ConnectionType::Wye,
        "1" => ConnectionType::Delta,
        "2" => ConnectionType::Neutral,
        other => {
            row.warn(
                "parse",
                format!("unknown connection code '{}', using wye", other),
            );
            ConnectionType::Wye
        }
    }
}

pub(super) fn overhead_line(
    row: &mut RowReader<'_>,
    ctx: &TranslateContext<'_>,
    name: &str,
    phases: PhaseSet,
) -> NetworkObject {
    build(row, ctx, name, phases, false)
}

pub(super) fn underground_line(
    row: &mut RowReader<'_>,
    ctx: &TranslateContext<'_>,
    name: &str,
    phases: PhaseSet,
) -> NetworkObject {
    build(row, ctx, name, phases, true)
}

fn build(
    row: &mut RowReader<'_>,
    ctx: &TranslateContext<'_>,
    name: &str,
    mut phases: PhaseSet,
    underground: bool,
) -> NetworkObject {
    let connection = connection_from_code(row, f::LOAD_MIX);
    let length = row.positive_or(f::LENGTH, DEFAULT_LINE_LENGTH_FT, "line length");

    let neutral = row.name_at(f::CONDUCTOR_N);
    if neutral.is_some() && connection != ConnectionType::Delta {
        phases.insert(Phase::N);
    } else {
        phases.remove(Phase::N);
    }

    let construction = match row.name_at(f::CONSTRUCTION) {
        Some(spec_name) => match ctx.lookup.get(spec_name) {
            Some(spec) => Some(spec.as_construction()),
            None => {
                row.warn(
                    "lookup",
                    format!("construction '{}' not in secondary table", spec_name),
                );
                None
            }
        },
        None => None,
    };

    let mut configs = Vec::new();
    let mut line_config = LineConfiguration::default();

    let conductor_columns = Phase::PRIMARY
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p, f::CONDUCTOR_A + i))
        .chain(std::iter::once((Phase::N, f::CONDUCTOR_N)));

    for (phase, column) in conductor_columns {
        if !phases.contains(phase) {
            continue;
        }
        let spec = match row.name_at(column) {
            Some(spec_name) => {
                let found = ctx.lookup.get(spec_name);
                if found.is_none() {
                    row.warn(
                        "lookup",
                        format!("conductor '{}' not in secondary table", spec_name),
                    );
                }
                found
            }
            None => None,
        };
        let body = if underground {
            let cable = spec.map(|s| s.as_cable());
            ConfigBody::UndergroundLineConductor(geometry::underground_conductor(cable.as_ref()))
        } else {
            let conductor = spec.map(|s| s.as_conductor());
            ConfigBody::OverheadLineConductor(geometry::overhead_conductor(
                conductor.as_ref(),
                phase == Phase::N,
            ))
        };
        let conductor_name = format!("{}_cond_{}", name, phase.letter());
        if let Some(slot) = line_config.conductor_mut(phase) {
            *slot = Some(conductor_name.clone());
        }
        configs.push(ConfigObject::new(conductor_name, body));
    }

    let spacing_name = format!("{}_spacing", name);
    configs.push(ConfigObject::new(
        spacing_name.clone(),
        ConfigBody::LineSpacing(geometry::conductor_spacing(construction.as_ref(), phases)),
    ));
    line_config.spacing = Some(spacing_name);

    let config_name = format!("{}_config", name);
    configs.push(ConfigObject::new(
        config_name.clone(),
        ConfigBody::LineConfiguration(line_config),
    ));

    let line = Line {
        length: Feet(length),
        connection,
        configuration: Some(config_name),
    };
    let element = if underground {
        Element::UndergroundLine(line)
    } else {
        Element::OverheadLine(line)
    };
    let mut object = NetworkObject::new(name, element, phases);
    object.configs = configs;
    object
}
