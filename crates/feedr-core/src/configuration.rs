//! Configuration sub-objects.
//!
//! Lines, transformers and regulators carry their electrical parameters in
//! named [`ConfigObject`]s rather than inline. Until the model is flattened a
//! config is embedded in exactly one [`crate::NetworkObject`]; owners (and line
//! configurations, for their conductors and spacing) refer to configs by name.

use serde::Serialize;

use crate::phase::{Phase, PhaseSet};
use crate::units::{Amperes, Feet, KilovoltAmperes, Volts};

/// A named configuration sub-object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigObject {
    pub name: String,
    #[serde(flatten)]
    pub body: ConfigBody,
}

impl ConfigObject {
    pub fn new(name: impl Into<String>, body: ConfigBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    pub fn kind(&self) -> ConfigKind {
        self.body.kind()
    }
}

/// Kind tag of a [`ConfigObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKind {
    OverheadLineConductor,
    UndergroundLineConductor,
    LineSpacing,
    LineConfiguration,
    TransformerConfiguration,
    RegulatorConfiguration,
}

impl ConfigKind {
    /// Kinds ordered so that anything referenced comes before its referrers.
    pub const DEPENDENCY_ORDER: [ConfigKind; 6] = [
        ConfigKind::OverheadLineConductor,
        ConfigKind::UndergroundLineConductor,
        ConfigKind::LineSpacing,
        ConfigKind::LineConfiguration,
        ConfigKind::TransformerConfiguration,
        ConfigKind::RegulatorConfiguration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKind::OverheadLineConductor => "overhead_line_conductor",
            ConfigKind::UndergroundLineConductor => "underground_line_conductor",
            ConfigKind::LineSpacing => "line_spacing",
            ConfigKind::LineConfiguration => "line_configuration",
            ConfigKind::TransformerConfiguration => "transformer_configuration",
            ConfigKind::RegulatorConfiguration => "regulator_configuration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum ConfigBody {
    LineConfiguration(LineConfiguration),
    LineSpacing(LineSpacing),
    OverheadLineConductor(OverheadConductor),
    UndergroundLineConductor(UndergroundConductor),
    TransformerConfiguration(TransformerConfiguration),
    RegulatorConfiguration(RegulatorConfiguration),
}

impl ConfigBody {
    pub fn kind(&self) -> ConfigKind {
        match self {
            ConfigBody::LineConfiguration(_) => ConfigKind::LineConfiguration,
            ConfigBody::LineSpacing(_) => ConfigKind::LineSpacing,
            ConfigBody::OverheadLineConductor(_) => ConfigKind::OverheadLineConductor,
            ConfigBody::UndergroundLineConductor(_) => ConfigKind::UndergroundLineConductor,
            ConfigBody::TransformerConfiguration(_) => ConfigKind::TransformerConfiguration,
            ConfigBody::RegulatorConfiguration(_) => ConfigKind::RegulatorConfiguration,
        }
    }

    /// Clear settings that belong to phases outside `phases`.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        match self {
            ConfigBody::LineConfiguration(lc) => lc.retain_phases(phases),
            ConfigBody::LineSpacing(spacing) => spacing.retain_phases(phases),
            ConfigBody::TransformerConfiguration(tc) => tc.retain_phases(phases),
            ConfigBody::RegulatorConfiguration(rc) => {
                rc.pt_phase = rc.pt_phase & phases.primary();
                rc.ct_phase = rc.ct_phase & phases.primary();
            }
            ConfigBody::OverheadLineConductor(_) | ConfigBody::UndergroundLineConductor(_) => {}
        }
    }

    /// Names of other configs this body refers to.
    pub fn references(&self) -> Vec<&str> {
        match self {
            ConfigBody::LineConfiguration(lc) => lc.references().collect(),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Lines
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor_c: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor_n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<String>,
}

impl LineConfiguration {
    pub fn conductor_mut(&mut self, phase: Phase) -> Option<&mut Option<String>> {
        match phase {
            Phase::A => Some(&mut self.conductor_a),
            Phase::B => Some(&mut self.conductor_b),
            Phase::C => Some(&mut self.conductor_c),
            Phase::N => Some(&mut self.conductor_n),
            Phase::S => None,
        }
    }

    pub fn has_neutral(&self) -> bool {
        self.conductor_n.is_some()
    }

    /// Clear conductor entries for phases (neutral included) outside `phases`.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        for phase in [Phase::A, Phase::B, Phase::C, Phase::N] {
            if !phases.contains(phase) {
                if let Some(slot) = self.conductor_mut(phase) {
                    *slot = None;
                }
            }
        }
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        [
            &self.conductor_a,
            &self.conductor_b,
            &self.conductor_c,
            &self.conductor_n,
            &self.spacing,
        ]
        .into_iter()
        .filter_map(|slot| slot.as_deref())
    }

    /// Apply `rename` to every reference that it maps.
    pub fn rewrite_references(&mut self, rename: impl Fn(&str) -> Option<String>) {
        for slot in [
            &mut self.conductor_a,
            &mut self.conductor_b,
            &mut self.conductor_c,
            &mut self.conductor_n,
            &mut self.spacing,
        ] {
            if let Some(current) = slot.as_deref() {
                if let Some(replacement) = rename(current) {
                    *slot = Some(replacement);
                }
            }
        }
    }
}

/// Pairwise conductor distances. Pairs involving an absent phase are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineSpacing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_ab: Option<Feet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_ac: Option<Feet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_bc: Option<Feet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_an: Option<Feet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_bn: Option<Feet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_cn: Option<Feet>,
}

impl LineSpacing {
    /// Clear every distance whose pair involves a phase outside `phases`.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        for (p, q, distance) in [
            (Phase::A, Phase::B, &mut self.distance_ab),
            (Phase::A, Phase::C, &mut self.distance_ac),
            (Phase::B, Phase::C, &mut self.distance_bc),
            (Phase::A, Phase::N, &mut self.distance_an),
            (Phase::B, Phase::N, &mut self.distance_bn),
            (Phase::C, Phase::N, &mut self.distance_cn),
        ] {
            if !(phases.contains(p) && phases.contains(q)) {
                *distance = None;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverheadConductor {
    pub geometric_mean_radius: Feet,
    /// Ohms per mile
    pub resistance: f64,
    /// Inches
    pub diameter: f64,
    pub rating: Amperes,
}

/// Concentric-neutral cable. Diameters in inches, resistances in ohms per mile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndergroundConductor {
    pub outer_diameter: f64,
    pub conductor_gmr: Feet,
    pub conductor_diameter: f64,
    pub conductor_resistance: f64,
    pub neutral_gmr: Feet,
    pub neutral_diameter: f64,
    pub neutral_resistance: f64,
    pub neutral_strands: u32,
    pub rating: Amperes,
}

// ============================================================================
// Transformers & regulators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformerConnection {
    WyeWye,
    SinglePhase,
    SinglePhaseCenterTapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallType {
    Poletop,
    Padmount,
}

/// Series or shunt impedance in per-unit on the transformer base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Impedance {
    pub resistance: f64,
    pub reactance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformerConfiguration {
    pub connect_type: TransformerConnection,
    pub install_type: InstallType,
    pub power_rating: KilovoltAmperes,
    pub power_a_rating: KilovoltAmperes,
    pub power_b_rating: KilovoltAmperes,
    pub power_c_rating: KilovoltAmperes,
    pub primary_voltage: Volts,
    pub secondary_voltage: Volts,
    pub impedance: Impedance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shunt_impedance: Option<Impedance>,
}

impl TransformerConfiguration {
    pub fn phase_rating(&self, phase: Phase) -> KilovoltAmperes {
        match phase {
            Phase::A => self.power_a_rating,
            Phase::B => self.power_b_rating,
            Phase::C => self.power_c_rating,
            Phase::N | Phase::S => KilovoltAmperes(0.0),
        }
    }

    /// Zero the ratings of primary phases outside `phases` and re-total.
    pub fn retain_phases(&mut self, phases: PhaseSet) {
        let mut changed = false;
        for (phase, rating) in [
            (Phase::A, &mut self.power_a_rating),
            (Phase::B, &mut self.power_b_rating),
            (Phase::C, &mut self.power_c_rating),
        ] {
            if !phases.contains(phase) && rating.value() != 0.0 {
                *rating = KilovoltAmperes(0.0);
                changed = true;
            }
        }
        if changed {
            self.power_rating = self.power_a_rating + self.power_b_rating + self.power_c_rating;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulatorControl {
    OutputVoltage,
    LineDropComp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlLevel {
    Individual,
    Bank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegulatorConfiguration {
    pub connect_type: TransformerConnection,
    pub band_center: Volts,
    pub band_width: Volts,
    /// Voltage the band settings are currently expressed on.
    pub voltage_base: Volts,
    /// Seconds
    pub time_delay: f64,
    /// Seconds
    pub dwell_time: f64,
    pub raise_taps: u32,
    pub lower_taps: u32,
    /// Per-unit regulation range
    pub regulation: f64,
    pub control: RegulatorControl,
    pub control_level: ControlLevel,
    pub compensator_r_setting: [f64; 3],
    pub compensator_x_setting: [f64; 3],
    pub pt_phase: PhaseSet,
    pub ct_phase: PhaseSet,
    pub power_transducer_ratio: f64,
    pub current_transducer_ratio: f64,
}

impl RegulatorConfiguration {
    /// Re-express band center and width on `voltage`.
    ///
    /// Returns `false` when the band is already on that base (or the target is
    /// not a usable voltage), so repeated calls are no-ops.
    pub fn rescale_band(&mut self, voltage: Volts) -> bool {
        if !voltage.is_positive() || !self.voltage_base.is_positive() {
            return false;
        }
        if (voltage.value() - self.voltage_base.value()).abs() < 1e-9 {
            return false;
        }
        let factor = voltage / self.voltage_base;
        self.band_center = self.band_center * factor;
        self.band_width = self.band_width * factor;
        self.voltage_base = voltage;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regulator() -> RegulatorConfiguration {
        RegulatorConfiguration {
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
        }
    }

    #[test]
    fn rescale_band_is_applied_once() {
        let mut config = regulator();
        assert!(config.rescale_band(Volts(7200.0)));
        assert!((config.band_center.value() - 7320.0).abs() < 1e-9);
        assert!((config.band_width.value() - 120.0).abs() < 1e-9);
        assert!(!config.rescale_band(Volts(7200.0)));
        assert!((config.band_center.value() - 7320.0).abs() < 1e-9);
    }

    #[test]
    fn line_configuration_rewrites_and_retains() {
        let mut lc = LineConfiguration {
            conductor_a: Some("c1".into()),
            conductor_b: Some("c2".into()),
            conductor_c: Some("c1".into()),
            conductor_n: None,
            spacing: Some("s1".into()),
        };
        lc.rewrite_references(|name| (name == "c1").then(|| "c0".to_string()));
        assert_eq!(lc.conductor_a.as_deref(), Some("c0"));
        assert_eq!(lc.conductor_c.as_deref(), Some("c0"));
        assert_eq!(lc.conductor_b.as_deref(), Some("c2"));

        lc.retain_phases(PhaseSet::parse("B").unwrap());
        assert!(lc.conductor_a.is_none());
        assert_eq!(lc.references().collect::<Vec<_>>(), vec!["c2", "s1"]);
    }

    #[test]
    fn narrowing_clears_per_phase_settings() {
        let mut spacing = ConfigBody::LineSpacing(LineSpacing {
            distance_ab: Some(Feet(2.5)),
            distance_ac: Some(Feet(4.5)),
            distance_bc: Some(Feet(7.0)),
            distance_an: Some(Feet(5.0)),
            distance_bn: Some(Feet(5.0)),
            distance_cn: Some(Feet(5.0)),
        });
        spacing.retain_phases(PhaseSet::parse("ACN").unwrap());
        match spacing {
            ConfigBody::LineSpacing(s) => {
                assert_eq!(s.distance_ac, Some(Feet(4.5)));
                assert_eq!(s.distance_cn, Some(Feet(5.0)));
                assert!(s.distance_ab.is_none() && s.distance_bc.is_none() && s.distance_bn.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut reg = ConfigBody::RegulatorConfiguration(regulator());
        reg.retain_phases(PhaseSet::parse("BN").unwrap());
        match reg {
            ConfigBody::RegulatorConfiguration(rc) => {
                assert_eq!(rc.pt_phase.to_string(), "B");
                assert_eq!(rc.ct_phase.to_string(), "B");
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut tc = TransformerConfiguration {
            connect_type: TransformerConnection::WyeWye,
            install_type: InstallType::Padmount,
            power_rating: KilovoltAmperes(75.0),
            power_a_rating: KilovoltAmperes(25.0),
            power_b_rating: KilovoltAmperes(25.0),
            power_c_rating: KilovoltAmperes(25.0),
            primary_voltage: Volts(7200.0),
            secondary_voltage: Volts(240.0),
            impedance: Impedance {
                resistance: 0.01,
                reactance: 0.04,
            },
            shunt_impedance: None,
        };
        tc.retain_phases(PhaseSet::parse("AN").unwrap());
        assert_eq!(tc.power_a_rating, KilovoltAmperes(25.0));
        assert_eq!(tc.power_b_rating, KilovoltAmperes(0.0));
        assert_eq!(tc.power_rating, KilovoltAmperes(25.0));
    }

    #[test]
    fn config_serializes_with_object_tag() {
        let config = ConfigObject::new(
            "spacing_1",
            ConfigBody::LineSpacing(LineSpacing {
                distance_ab: Some(Feet(2.5)),
                ..LineSpacing::default()
            }),
        );
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"object\":\"line_spacing\""));
        assert!(json.contains("\"name\":\"spacing_1\""));
        assert!(!json.contains("distance_bc"));
    }
}
