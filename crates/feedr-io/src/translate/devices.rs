use feedr_core::{
    Amperes, Capacitor, CapacitorControl, ConfigBody, ConfigObject, Configured, ControlLevel,
    Element, Fuse, Generator, GeneratorType, InstallType, KilovoltAmperes, Kilovars, Kilovolts,
    Kilowatts, Motor, NetworkObject, Phase, PhaseSet, Recloser, RegulatorConfiguration,
    RegulatorControl, Switch, SwitchStatus, TransformerConfiguration, TransformerConnection, Volts,
};

use super::fields;
use super::lines::connection_from_code;
use super::{RowReader, TranslateContext};
use crate::geometry;
use crate::lookup::{RegulatorSpec, TransformerSpec};

/// Primary line-to-neutral voltage assumed when a rating is missing.
pub const DEFAULT_PRIMARY_KV: f64 = 7.2;
/// Regulator band settings in the table are on a 120 V base.
pub const BAND_BASE_VOLTS: f64 = 120.0;
pub const DEFAULT_BAND_CENTER: f64 = 120.0;
pub const DEFAULT_BAND_WIDTH: f64 = 2.0;
pub const DEFAULT_PHASE_KVA: f64 = 25.0;
pub const DEFAULT_SECONDARY_VOLTS: f64 = 120.0;
pub const DEFAULT_FUSE_LIMIT: f64 = 9999.0;
pub const RECLOSER_MAX_TRIES: u32 = 3;
pub const DEFAULT_POWER_FACTOR: f64 = 0.85;

fn kv_or_default(row: &mut RowReader<'_>, index: usize, what: &str) -> Volts {
    Kilovolts(row.positive_or(index, DEFAULT_PRIMARY_KV, what)).to_volts()
}

// ============================================================================
// Regulator
// ============================================================================

pub(super) fn regulator(
    row: &mut RowReader<'_>,
    ctx: &TranslateContext<'_>,
    name: &str,
    phases: PhaseSet,
) -> NetworkObject {
    use fields::regulator as f;

    let spec = match row.name_at(f::SPEC) {
        Some(spec_name) => match ctx.lookup.get(spec_name) {
            Some(found) => Some(found.as_regulator()),
            None => {
                row.warn(
                    "lookup",
                    format!("regulator '{}' not in secondary table", spec_name),
                );
                None
            }
        },
        None => None,
    };
    let RegulatorSpec {
        range,
        step,
        rated_current,
        pt_ratio,
    } = spec.unwrap_or_default();

    let range = range
        .filter(|r| *r > 0.0)
        .unwrap_or(geometry::DEFAULT_REGULATION_RANGE_PERCENT);
    let step = match step {
        Some(s) if s > 0.0 => s,
        Some(s) => {
            row.warn(
                "numeric",
                format!(
                    "non-positive tap step {}, using {} %",
                    s,
                    geometry::DEFAULT_TAP_STEP_PERCENT
                ),
            );
            geometry::DEFAULT_TAP_STEP_PERCENT
        }
        None => {
            if spec.is_some() {
                row.warn(
                    "numeric",
                    format!(
                        "missing tap step, using {} %",
                        geometry::DEFAULT_TAP_STEP_PERCENT
                    ),
                );
            }
            geometry::DEFAULT_TAP_STEP_PERCENT
        }
    };
    let taps = geometry::tap_count(range, step);

    let control_phase = PhaseSet::parse(row.text(f::CONTROL_PHASE))
        .map(PhaseSet::primary)
        .filter(|set| set.primary_count() == 1);
    let (control_level, band_phase) = match control_phase {
        Some(set) => (
            ControlLevel::Bank,
            set.primary_phases().next().unwrap_or(Phase::A),
        ),
        None => (
            ControlLevel::Individual,
            phases.primary_phases().next().unwrap_or(Phase::A),
        ),
    };
    let offset = band_phase.primary_index().unwrap_or(0);
    let band_center = row.positive_or(f::BAND_CENTER_A + offset, DEFAULT_BAND_CENTER, "band center");
    let band_width = row.positive_or(f::BAND_WIDTH_A + offset, DEFAULT_BAND_WIDTH, "band width");

    let mut compensator_r = [0.0; 3];
    let mut compensator_x = [0.0; 3];
    for i in 0..3 {
        compensator_r[i] = row.number_or(f::COMPENSATOR_R_A + i, 0.0, "compensator R");
        compensator_x[i] = row.number_or(f::COMPENSATOR_X_A + i, 0.0, "compensator X");
    }
    let control = if compensator_r.iter().chain(&compensator_x).any(|v| *v != 0.0) {
        RegulatorControl::LineDropComp
    } else {
        RegulatorControl::OutputVoltage
    };

    let config = RegulatorConfiguration {
        connect_type: TransformerConnection::WyeWye,
        band_center: Volts(band_center),
        band_width: Volts(band_width),
        voltage_base: Volts(BAND_BASE_VOLTS),
        time_delay: 30.0,
        dwell_time: 5.0,
        raise_taps: taps,
        lower_taps: taps,
        regulation: range / 100.0,
        control,
        control_level,
        compensator_r_setting: compensator_r,
        compensator_x_setting: compensator_x,
        pt_phase: phases.primary(),
        ct_phase: phases.primary(),
        power_transducer_ratio: pt_ratio.filter(|v| *v > 0.0).unwrap_or(60.0),
        current_transducer_ratio: rated_current.filter(|v| *v > 0.0).unwrap_or(700.0),
    };

    let config_name = format!("{}_config", name);
    let mut object = NetworkObject::new(
        name,
        Element::Regulator(Configured {
            configuration: Some(config_name.clone()),
        }),
        phases,
    );
    object.configs.push(ConfigObject::new(
        config_name,
        ConfigBody::RegulatorConfiguration(config),
    ));
    object
}

// ============================================================================
// Transformer
// ============================================================================

pub(super) fn transformer(
    row: &mut RowReader<'_>,
    ctx: &TranslateContext<'_>,
    name: &str,
    phases: PhaseSet,
) -> NetworkObject {
    use fields::transformer as f;

    let spec = match row.name_at(f::SPEC) {
        Some(spec_name) => match ctx.lookup.get(spec_name) {
            Some(found) => Some(found.as_transformer()),
            None => {
                row.warn(
                    "lookup",
                    format!("transformer '{}' not in secondary table", spec_name),
                );
                None
            }
        },
        None => None,
    };
    let TransformerSpec {
        percent_impedance,
        x_over_r,
        no_load_loss,
        rated_kva,
    } = spec.unwrap_or_default();

    let active = phases.primary_count().max(1);
    let split_rating = rated_kva
        .filter(|kva| *kva > 0.0)
        .map(|kva| kva / active as f64)
        .unwrap_or(DEFAULT_PHASE_KVA);
    let mut ratings = [KilovoltAmperes(0.0); 3];
    for phase in phases.primary_phases() {
        let i = phase.primary_index().unwrap_or(0);
        ratings[i] = KilovoltAmperes(row.positive_or(f::KVA_A + i, split_rating, "phase kVA"));
    }
    if phases.primary_count() == 0 {
        ratings[0] = KilovoltAmperes(split_rating);
    }

    let primary_voltage = match row.number(f::PRIMARY_KV, "primary kV") {
        Some(kv) if kv > 0.0 => Kilovolts(kv).to_volts(),
        _ => {
            row.warn(
                "numeric",
                format!("missing primary voltage, using {} kV", DEFAULT_PRIMARY_KV),
            );
            Kilovolts(DEFAULT_PRIMARY_KV).to_volts()
        }
    };
    let secondary_voltage = match row.number(f::SECONDARY_KV, "secondary kV") {
        Some(kv) if kv > 0.0 => Kilovolts(kv).to_volts(),
        _ => {
            row.warn(
                "numeric",
                format!("missing secondary voltage, using {} V", DEFAULT_SECONDARY_VOLTS),
            );
            Volts(DEFAULT_SECONDARY_VOLTS)
        }
    };

    let single = phases.primary_count() <= 1;
    let config = TransformerConfiguration {
        connect_type: if single {
            TransformerConnection::SinglePhase
        } else {
            TransformerConnection::WyeWye
        },
        install_type: if single {
            InstallType::Poletop
        } else {
            InstallType::Padmount
        },
        power_rating: ratings.iter().copied().sum(),
        power_a_rating: ratings[0],
        power_b_rating: ratings[1],
        power_c_rating: ratings[2],
        primary_voltage,
        secondary_voltage,
        impedance: geometry::transformer_impedance(percent_impedance, x_over_r),
        shunt_impedance: geometry::shunt_impedance(no_load_loss),
    };

    let config_name = format!("{}_config", name);
    let mut object = NetworkObject::new(
        name,
        Element::Transformer(Configured {
            configuration: Some(config_name.clone()),
        }),
        phases,
    );
    object.configs.push(ConfigObject::new(
        config_name,
        ConfigBody::TransformerConfiguration(config),
    ));
    object
}

// ============================================================================
// Simple devices
// ============================================================================

pub(super) fn capacitor(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    use fields::capacitor as f;

    let mut kvar = [Kilovars(0.0); 3];
    for phase in phases.primary_phases() {
        let i = phase.primary_index().unwrap_or(0);
        kvar[i] = Kilovars(row.number_or(f::KVAR_A + i, 0.0, "capacitor kvar"));
    }
    let control = match row.text(f::CONTROL) {
        "" | "0" => CapacitorControl::Manual,
        "1" => CapacitorControl::Volt,
        "2" => CapacitorControl::Var,
        "3" => CapacitorControl::Current,
        other => {
            row.warn(
                "parse",
                format!("unknown capacitor control '{}', using manual", other),
            );
            CapacitorControl::Manual
        }
    };
    let rated_voltage = kv_or_default(row, f::RATED_KV, "capacitor kV");
    let connection = connection_from_code(row, f::CONNECTION);

    NetworkObject::new(
        name,
        Element::Capacitor(Capacitor {
            capacitor_a: kvar[0],
            capacitor_b: kvar[1],
            capacitor_c: kvar[2],
            rated_voltage,
            control,
            connection,
        }),
        phases,
    )
}

pub(super) fn switch(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    let state = row.text(fields::switch::STATE);
    let status = if state.eq_ignore_ascii_case("c")
        || state == "1"
        || state.eq_ignore_ascii_case("closed")
    {
        SwitchStatus::Closed
    } else {
        SwitchStatus::Open
    };
    NetworkObject::new(name, Element::Switch(Switch { status }), phases)
}

pub(super) fn overcurrent(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    use fields::overcurrent as f;

    let device = row.text(f::DEVICE);
    let current_limit = Amperes(row.positive_or(f::CURRENT_LIMIT, DEFAULT_FUSE_LIMIT, "current limit"));
    let element = if device.eq_ignore_ascii_case("r") || device == "1" {
        Element::Recloser(Recloser {
            current_limit,
            max_tries: RECLOSER_MAX_TRIES,
        })
    } else {
        Element::Fuse(Fuse { current_limit })
    };
    NetworkObject::new(name, element, phases)
}

pub(super) fn motor(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    use fields::motor as f;

    let horsepower = row.number_or(f::HORSEPOWER, 0.0, "horsepower");
    let rated_voltage = kv_or_default(row, f::RATED_KV, "motor kV");
    let power_factor = match row.number(f::POWER_FACTOR, "power factor") {
        Some(pf) if pf > 0.0 && pf <= 1.0 => pf,
        Some(pf) => {
            row.warn(
                "numeric",
                format!("power factor {} out of range, using {}", pf, DEFAULT_POWER_FACTOR),
            );
            DEFAULT_POWER_FACTOR
        }
        None => DEFAULT_POWER_FACTOR,
    };
    NetworkObject::new(
        name,
        Element::Motor(Motor {
            horsepower,
            rated_voltage,
            power_factor,
        }),
        phases,
    )
}

pub(super) fn generator(row: &mut RowReader<'_>, name: &str, phases: PhaseSet) -> NetworkObject {
    use fields::generator as f;

    let rated_power = Kilowatts(row.number_or(f::KW, 0.0, "generator kW"));
    let rated_reactive_power = Kilovars(row.number_or(f::KVAR, 0.0, "generator kvar"));
    let rated_voltage = kv_or_default(row, f::RATED_KV, "generator kV");
    let generator_type = match row.text(f::TYPE) {
        "" | "0" => GeneratorType::Synchronous,
        "1" => GeneratorType::Induction,
        "2" => GeneratorType::Inverter,
        other => {
            row.warn(
                "parse",
                format!("unknown generator type '{}', using synchronous", other),
            );
            GeneratorType::Synchronous
        }
    };
    NetworkObject::new(
        name,
        Element::Generator(Generator {
            rated_power,
            rated_reactive_power,
            rated_voltage,
            generator_type,
        }),
        phases,
    )
}
