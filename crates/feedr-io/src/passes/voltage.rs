//! Nominal voltage propagation.
//!
//! Voltages start at the sources and relax outwards along `parent`/`from`
//! until a full pass maps nothing new. Transformers hand their secondary
//! rating downstream instead of the voltage they receive.

use feedr_core::{ConfigBody, ConversionDiagnostics, Element, ObjectArena, ObjectId, Volts};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoltageReport {
    /// Relaxation passes run, including the final one that changed nothing.
    pub passes: usize,
    /// Objects with a voltage at the fixed point.
    pub mapped: usize,
}

fn secondary_voltage(arena: &ObjectArena, id: ObjectId) -> Option<Volts> {
    let obj = arena.get(id)?;
    let config = obj.embedded(obj.element.configuration()?)?;
    match &config.body {
        ConfigBody::TransformerConfiguration(tc) if tc.secondary_voltage.is_positive() => {
            Some(tc.secondary_voltage)
        }
        _ => None,
    }
}

pub fn propagate_voltage(
    arena: &mut ObjectArena,
    diagnostics: &mut ConversionDiagnostics,
) -> VoltageReport {
    let mut voltages: Vec<Option<Volts>> = vec![None; arena.slot_count()];
    for (id, obj) in arena.iter() {
        if matches!(obj.element, Element::Source) {
            voltages[id.value()] = obj.nominal_voltage;
        }
    }

    let ids = arena.ids();
    let mut passes = 0;
    loop {
        passes += 1;
        let mut added = 0;
        for &id in &ids {
            if voltages[id.value()].is_some() {
                continue;
            }
            let Some(obj) = arena.get(id) else {
                continue;
            };
            let Some(upstream) = obj.upstream().and_then(|u| voltages[u.value()]) else {
                continue;
            };
            let voltage = match obj.element {
                Element::Transformer(_) => secondary_voltage(arena, id).unwrap_or(upstream),
                _ => upstream,
            };
            voltages[id.value()] = Some(voltage);
            added += 1;
            if let Some(to) = obj.to {
                if voltages[to.value()].is_none() {
                    voltages[to.value()] = Some(voltage);
                    added += 1;
                }
            }
        }
        if added == 0 {
            break;
        }
    }

    let mut rescaled = 0;
    let mut unreached = 0;
    for (id, obj) in arena.iter_mut() {
        let Some(voltage) = voltages[id.value()] else {
            unreached += 1;
            diagnostics.add_warning_with_entity(
                "voltage",
                "no source reaches this object",
                &obj.name,
            );
            continue;
        };
        if let Element::Regulator(_) = obj.element {
            let target = obj.element.configuration().map(str::to_string);
            for config in obj.configs.iter_mut() {
                if Some(&config.name) != target.as_ref() {
                    continue;
                }
                if let ConfigBody::RegulatorConfiguration(rc) = &mut config.body {
                    if rc.rescale_band(voltage) {
                        rescaled += 1;
                    }
                }
            }
        }
        if !obj.element.is_link() {
            obj.nominal_voltage = Some(voltage);
        }
    }

    let mapped = voltages.iter().filter(|v| v.is_some()).count();
    tracing::debug!(passes, mapped, rescaled, unreached, "voltage propagated");
    VoltageReport { passes, mapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedr_core::{
        ConfigObject, Configured, ControlLevel, Impedance, InstallType, KilovoltAmperes,
        NetworkObject, PhaseSet, RegulatorConfiguration, RegulatorControl, Switch, SwitchStatus,
        TransformerConfiguration, TransformerConnection,
    };

    fn source(arena: &mut ObjectArena, volts: f64) -> ObjectId {
        let mut src = NetworkObject::new("src", Element::Source, PhaseSet::ABC);
        src.nominal_voltage = Some(Volts(volts));
        arena.insert(src)
    }

    fn link(arena: &mut ObjectArena, name: &str, element: Element, from: ObjectId) -> (ObjectId, ObjectId) {
        let node = arena.insert(NetworkObject::new(format!("{}_to", name), Element::Node, PhaseSet::ABC));
        let mut obj = NetworkObject::new(name, element, PhaseSet::ABC);
        obj.from = Some(from);
        obj.to = Some(node);
        (arena.insert(obj), node)
    }

    fn transformer(secondary: f64) -> NetworkObject {
        let mut obj = NetworkObject::new(
            "t1",
            Element::Transformer(Configured {
                configuration: Some("t1_config".into()),
            }),
            PhaseSet::ABC,
        );
        obj.configs.push(ConfigObject::new(
            "t1_config",
            ConfigBody::TransformerConfiguration(TransformerConfiguration {
                connect_type: TransformerConnection::WyeWye,
                install_type: InstallType::Padmount,
                power_rating: KilovoltAmperes(75.0),
                power_a_rating: KilovoltAmperes(25.0),
                power_b_rating: KilovoltAmperes(25.0),
                power_c_rating: KilovoltAmperes(25.0),
                primary_voltage: Volts(7200.0),
                secondary_voltage: Volts(secondary),
                impedance: Impedance {
                    resistance: 0.01,
                    reactance: 0.04,
                },
                shunt_impedance: None,
            }),
        ));
        obj
    }

    fn closed_switch() -> Element {
        Element::Switch(Switch {
            status: SwitchStatus::Closed,
        })
    }

    #[test]
    fn transformer_steps_voltage_down() {
        let mut arena = ObjectArena::new();
        let src = source(&mut arena, 7200.0);
        let (_, hv) = link(&mut arena, "sw1", closed_switch(), src);
        let lv = arena.insert(NetworkObject::new("lv", Element::Node, PhaseSet::ABC));
        let mut xf = transformer(277.0);
        xf.from = Some(hv);
        xf.to = Some(lv);
        arena.insert(xf);

        let mut diag = ConversionDiagnostics::new();
        let report = propagate_voltage(&mut arena, &mut diag);
        assert_eq!(arena.get(hv).unwrap().nominal_voltage, Some(Volts(7200.0)));
        assert_eq!(arena.get(lv).unwrap().nominal_voltage, Some(Volts(277.0)));
        assert_eq!(report.mapped, arena.live_count());
        assert!(!diag.has_issues());
    }

    #[test]
    fn unreached_objects_are_warned() {
        let mut arena = ObjectArena::new();
        source(&mut arena, 7200.0);
        let island = arena.insert(NetworkObject::new("island", Element::Node, PhaseSet::ABC));
        let mut diag = ConversionDiagnostics::new();

        let report = propagate_voltage(&mut arena, &mut diag);
        assert_eq!(report.mapped, 1);
        assert_eq!(report.passes, 1);
        assert!(arena.get(island).unwrap().nominal_voltage.is_none());
        assert_eq!(diag.issues_by_category("voltage").count(), 1);
    }

    #[test]
    fn passes_bounded_by_chain_depth() {
        let mut arena = ObjectArena::new();
        let mut upstream = source(&mut arena, 7200.0);
        let depth = 5;
        for i in 0..depth {
            let (_, node) = link(&mut arena, &format!("sw{}", i), closed_switch(), upstream);
            upstream = node;
        }
        let mut diag = ConversionDiagnostics::new();
        let report = propagate_voltage(&mut arena, &mut diag);
        assert!(report.passes <= depth + 1);
        assert!(report.mapped <= arena.live_count());
        assert_eq!(report.mapped, arena.live_count());
    }

    #[test]
    fn regulator_band_follows_mapped_voltage() {
        let mut arena = ObjectArena::new();
        let src = source(&mut arena, 7200.0);
        let mut reg = NetworkObject::new(
            "r1",
            Element::Regulator(Configured {
                configuration: Some("r1_config".into()),
            }),
            PhaseSet::ABC,
        );
        reg.configs.push(ConfigObject::new(
            "r1_config",
            ConfigBody::RegulatorConfiguration(RegulatorConfiguration {
                connect_type: TransformerConnection::WyeWye,
                band_center: Volts(122.0),
                band_width: Volts(2.0),
                voltage_base: Volts(120.0),
                time_delay: 30.0,
                dwell_time: 5.0,
                raise_taps: 16,
                lower_taps: 16,
                regulation: 0.1,
                control: RegulatorControl::OutputVoltage,
                control_level: ControlLevel::Individual,
                compensator_r_setting: [0.0; 3],
                compensator_x_setting: [0.0; 3],
                pt_phase: PhaseSet::ABC,
                ct_phase: PhaseSet::ABC,
                power_transducer_ratio: 60.0,
                current_transducer_ratio: 700.0,
            }),
        ));
        reg.from = Some(src);
        let r = arena.insert(reg);

        propagate_voltage(&mut arena, &mut ConversionDiagnostics::new());
        let obj = arena.get(r).unwrap();
        assert!(obj.nominal_voltage.is_none());
        match &obj.embedded("r1_config").unwrap().body {
            ConfigBody::RegulatorConfiguration(rc) => {
                assert!((rc.band_center.value() - 7320.0).abs() < 1e-9);
                assert_eq!(rc.voltage_base, Volts(7200.0));
            }
            other => panic!("unexpected body {:?}", other),
        }
    }
}
