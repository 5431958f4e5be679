//! Geometry and electrical parameter derivation.
//!
//! Pure functions used by the translator: the canvas transform, conductor
//! spacing, default conductor constants, transformer impedance and regulator
//! tap counts. Defaults apply per value, so a lookup row with one bad cell
//! still contributes its other cells.

use feedr_core::{
    Amperes, Feet, Impedance, LineSpacing, OverheadConductor, Phase, PhaseSet, Point,
    UndergroundConductor,
};

use crate::lookup::{CableSpec, ConductorSpec, ConstructionSpec};

// ============================================================================
// Canvas
// ============================================================================

/// Affine map from raw table coordinates onto a `width` x `height` canvas.
///
/// Computed once from every parseable coordinate pair. The y axis is flipped:
/// the smallest y lands at `height`, the largest at 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    width: f64,
    height: f64,
    rescale: bool,
}

impl CanvasTransform {
    pub fn fit<I>(points: I, width: f64, height: f64) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            width,
            height,
            rescale: true,
        }
    }

    /// A transform that returns raw coordinates unchanged.
    pub fn identity() -> Self {
        Self {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
            width: 0.0,
            height: 0.0,
            rescale: false,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point {
        if !self.rescale {
            return Point { x, y };
        }
        let span_x = self.max_x - self.min_x;
        let span_y = self.max_y - self.min_y;
        let cx = if span_x.is_finite() && span_x > 0.0 {
            (x - self.min_x) / span_x * self.width
        } else {
            self.width / 2.0
        };
        let cy = if span_y.is_finite() && span_y > 0.0 {
            self.height - (y - self.min_y) / span_y * self.height
        } else {
            self.height / 2.0
        };
        Point { x: cx, y: cy }
    }
}

// ============================================================================
// Spacing
// ============================================================================

/// Reference 4-wire crossarm (ft), positions of A, B, C, N.
pub const REFERENCE_GEOMETRY: [(f64, f64); 4] = [(0.0, 28.0), (2.5, 28.0), (7.0, 28.0), (4.0, 24.0)];

const SPACING_PAIRS: [(Phase, Phase); 6] = [
    (Phase::A, Phase::B),
    (Phase::A, Phase::C),
    (Phase::B, Phase::C),
    (Phase::A, Phase::N),
    (Phase::B, Phase::N),
    (Phase::C, Phase::N),
];

fn slot(phase: Phase) -> usize {
    match phase {
        Phase::A => 0,
        Phase::B => 1,
        Phase::C => 2,
        Phase::N | Phase::S => 3,
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Distances between each pair of conductors present in `phases`.
///
/// A pair falls back to the reference geometry when the construction row is
/// missing, lacks either position, or yields a non-positive distance.
pub fn conductor_spacing(construction: Option<&ConstructionSpec>, phases: PhaseSet) -> LineSpacing {
    let mut spacing = LineSpacing::default();
    for (p, q) in SPACING_PAIRS {
        if !phases.contains(p) || !phases.contains(q) {
            continue;
        }
        let measured = construction
            .and_then(|c| c.positions[slot(p)].zip(c.positions[slot(q)]))
            .map(|(a, b)| distance(a, b))
            .filter(|d| d.is_finite() && *d > 0.0);
        let d = measured
            .unwrap_or_else(|| distance(REFERENCE_GEOMETRY[slot(p)], REFERENCE_GEOMETRY[slot(q)]));
        let value = Some(Feet(d));
        match (p, q) {
            (Phase::A, Phase::B) => spacing.distance_ab = value,
            (Phase::A, Phase::C) => spacing.distance_ac = value,
            (Phase::B, Phase::C) => spacing.distance_bc = value,
            (Phase::A, Phase::N) => spacing.distance_an = value,
            (Phase::B, Phase::N) => spacing.distance_bn = value,
            _ => spacing.distance_cn = value,
        }
    }
    spacing
}

// ============================================================================
// Conductors
// ============================================================================

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// 336,400 26/7 ACSR phase conductor.
pub const OVERHEAD_PHASE_DEFAULT: ConductorSpec = ConductorSpec {
    resistance: Some(0.306),
    gmr: Some(0.0244),
    diameter: Some(0.721),
    ampacity: Some(530.0),
};

/// 4/0 6/1 ACSR neutral conductor.
pub const OVERHEAD_NEUTRAL_DEFAULT: ConductorSpec = ConductorSpec {
    resistance: Some(0.592),
    gmr: Some(0.00814),
    diameter: Some(0.563),
    ampacity: Some(340.0),
};

pub fn overhead_conductor(spec: Option<&ConductorSpec>, neutral: bool) -> OverheadConductor {
    let fallback = if neutral {
        OVERHEAD_NEUTRAL_DEFAULT
    } else {
        OVERHEAD_PHASE_DEFAULT
    };
    let spec = spec.copied().unwrap_or_default();
    let pick = |value: Option<f64>, default: Option<f64>| {
        positive(value).or(default).unwrap_or_default()
    };
    OverheadConductor {
        geometric_mean_radius: Feet(pick(spec.gmr, fallback.gmr)),
        resistance: pick(spec.resistance, fallback.resistance),
        diameter: pick(spec.diameter, fallback.diameter),
        rating: Amperes(pick(spec.ampacity, fallback.ampacity)),
    }
}

/// 250 kcmil AA, 1/3 concentric neutral (IEEE 13-bus underground cable).
pub fn underground_default() -> UndergroundConductor {
    UndergroundConductor {
        outer_diameter: 1.29,
        conductor_gmr: Feet(0.0171),
        conductor_diameter: 0.567,
        conductor_resistance: 0.41,
        neutral_gmr: Feet(0.00208),
        neutral_diameter: 0.0641,
        neutral_resistance: 14.8722,
        neutral_strands: 13,
        rating: Amperes(260.0),
    }
}

pub fn underground_conductor(spec: Option<&CableSpec>) -> UndergroundConductor {
    let d = underground_default();
    let Some(cable) = spec else {
        return d;
    };
    let or = |value: Option<f64>, default: f64| positive(value).unwrap_or(default);
    UndergroundConductor {
        outer_diameter: or(cable.outer_diameter, d.outer_diameter),
        conductor_gmr: Feet(or(cable.conductor.gmr, d.conductor_gmr.value())),
        conductor_diameter: or(cable.conductor.diameter, d.conductor_diameter),
        conductor_resistance: or(cable.conductor.resistance, d.conductor_resistance),
        neutral_gmr: Feet(or(cable.neutral_gmr, d.neutral_gmr.value())),
        neutral_diameter: or(cable.neutral_diameter, d.neutral_diameter),
        neutral_resistance: or(cable.neutral_resistance, d.neutral_resistance),
        neutral_strands: positive(cable.neutral_strands)
            .map(|n| n.round() as u32)
            .unwrap_or(d.neutral_strands),
        rating: Amperes(or(cable.conductor.ampacity, d.rating.value())),
    }
}

// ============================================================================
// Transformers & regulators
// ============================================================================

pub const DEFAULT_PERCENT_IMPEDANCE: f64 = 2.0;
pub const DEFAULT_X_OVER_R: f64 = 4.0;
/// Smallest per-unit resistance or reactance handed downstream.
pub const MIN_IMPEDANCE_PU: f64 = 1e-5;

/// Series impedance in per-unit from percent impedance and X/R ratio.
pub fn transformer_impedance(percent_z: Option<f64>, x_over_r: Option<f64>) -> Impedance {
    let z = positive(percent_z).unwrap_or(DEFAULT_PERCENT_IMPEDANCE) / 100.0;
    let xr = positive(x_over_r).unwrap_or(DEFAULT_X_OVER_R);
    let r = z / (1.0 + xr * xr).sqrt();
    let x = r * xr;
    Impedance {
        resistance: r.max(MIN_IMPEDANCE_PU),
        reactance: x.max(MIN_IMPEDANCE_PU),
    }
}

/// Magnetizing branch from no-load loss (percent). Absent when the loss is not positive.
pub fn shunt_impedance(no_load_loss: Option<f64>) -> Option<Impedance> {
    positive(no_load_loss).map(|loss| Impedance {
        resistance: 100.0 / loss,
        reactance: 0.0,
    })
}

pub const DEFAULT_REGULATION_RANGE_PERCENT: f64 = 10.0;
pub const DEFAULT_TAP_STEP_PERCENT: f64 = 0.625;

/// Taps per direction; never zero.
pub fn tap_count(range_percent: f64, step_percent: f64) -> u32 {
    if !(step_percent.is_finite() && step_percent > 0.0) {
        return 1;
    }
    let taps = (range_percent / step_percent).ceil();
    if taps.is_finite() && taps >= 1.0 {
        taps as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn canvas_maps_corners_with_flip() {
        let t = CanvasTransform::fit([(10.0, 20.0), (30.0, 60.0), (15.0, 25.0)], 1000.0, 500.0);
        assert_eq!(t.apply(10.0, 20.0), Point { x: 0.0, y: 500.0 });
        assert_eq!(t.apply(30.0, 60.0), Point { x: 1000.0, y: 0.0 });
    }

    #[test]
    fn degenerate_span_maps_to_midpoint() {
        let t = CanvasTransform::fit([(5.0, 5.0)], 1000.0, 800.0);
        assert_eq!(t.apply(5.0, 5.0), Point { x: 500.0, y: 400.0 });
        let raw = CanvasTransform::identity();
        assert_eq!(raw.apply(3.0, -4.0), Point { x: 3.0, y: -4.0 });
    }

    #[test]
    fn reference_spacing_distances() {
        let abcn = PhaseSet::parse("ABCN").unwrap();
        let s = conductor_spacing(None, abcn);
        assert!(close(s.distance_ab.unwrap().value(), 2.5));
        assert!(close(s.distance_ac.unwrap().value(), 7.0));
        assert!(close(s.distance_bc.unwrap().value(), 4.5));
        assert!(close(s.distance_an.unwrap().value(), 5.656854));
        assert!(close(s.distance_bn.unwrap().value(), 4.272002));
        assert!(close(s.distance_cn.unwrap().value(), 5.0));
    }

    #[test]
    fn construction_overrides_per_pair() {
        let construction = ConstructionSpec {
            positions: [Some((0.0, 30.0)), Some((0.0, 30.0)), Some((3.0, 34.0)), None],
        };
        let s = conductor_spacing(Some(&construction), PhaseSet::ABC);
        // A and B coincide: reference distance used
        assert!(close(s.distance_ab.unwrap().value(), 2.5));
        assert!(close(s.distance_ac.unwrap().value(), 5.0));
        assert!(s.distance_an.is_none());
    }

    #[test]
    fn conductor_defaults_fill_gaps() {
        let partial = ConductorSpec {
            resistance: Some(0.5),
            gmr: Some(-1.0),
            ..ConductorSpec::default()
        };
        let c = overhead_conductor(Some(&partial), false);
        assert_eq!(c.resistance, 0.5);
        assert_eq!(c.geometric_mean_radius, Feet(0.0244));
        assert_eq!(c.rating, Amperes(530.0));
        assert_eq!(overhead_conductor(None, true).resistance, 0.592);
        assert_eq!(underground_conductor(None).neutral_strands, 13);
    }

    #[test]
    fn impedance_split_and_floor() {
        let z = transformer_impedance(Some(2.0), Some(4.0));
        assert!(close(z.resistance, 0.02 / 17f64.sqrt()));
        assert!(close(z.reactance, 4.0 * 0.02 / 17f64.sqrt()));

        let tiny = transformer_impedance(Some(1e-6), Some(1.0));
        assert_eq!(tiny.resistance, MIN_IMPEDANCE_PU);
        assert_eq!(tiny.reactance, MIN_IMPEDANCE_PU);

        assert_eq!(transformer_impedance(None, None), transformer_impedance(Some(2.0), Some(4.0)));
    }

    #[test]
    fn shunt_only_with_positive_loss() {
        assert!(shunt_impedance(None).is_none());
        assert!(shunt_impedance(Some(0.0)).is_none());
        assert_eq!(shunt_impedance(Some(0.5)).unwrap().resistance, 200.0);
    }

    #[test]
    fn taps_round_up_and_floor_at_one() {
        assert_eq!(tap_count(10.0, 0.625), 16);
        assert_eq!(tap_count(10.0, 3.0), 4);
        assert_eq!(tap_count(0.0, 0.625), 1);
        assert_eq!(tap_count(10.0, 0.0), 1);
    }
}
