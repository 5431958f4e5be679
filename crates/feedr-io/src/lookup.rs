//! Hardware lookup index over the secondary equipment table.
//!
//! Every secondary row is keyed by its name (field 0). What the remaining
//! columns mean depends on who asks: a line reads a conductor or construction
//! row, a transformer reads impedance data, a regulator reads tap data. The
//! typed views below interpret a row on demand; unparseable cells come back
//! as `None` and the caller substitutes its default.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use feedr_core::{DiagnosticIssue, FeedrResult, Severity};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use crate::tables::{parse_secondary, SourceRecord};

/// Conductor constants: resistance (Ω/mile), GMR (ft), diameter (in), ampacity (A).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConductorSpec {
    pub resistance: Option<f64>,
    pub gmr: Option<f64>,
    pub diameter: Option<f64>,
    pub ampacity: Option<f64>,
}

/// Concentric-neutral cable constants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CableSpec {
    pub conductor: ConductorSpec,
    pub outer_diameter: Option<f64>,
    pub neutral_resistance: Option<f64>,
    pub neutral_gmr: Option<f64>,
    pub neutral_diameter: Option<f64>,
    pub neutral_strands: Option<f64>,
}

/// Physical conductor positions (ft) for A, B, C and N.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstructionSpec {
    pub positions: [Option<(f64, f64)>; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformerSpec {
    pub percent_impedance: Option<f64>,
    pub x_over_r: Option<f64>,
    /// Percent of rating
    pub no_load_loss: Option<f64>,
    pub rated_kva: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegulatorSpec {
    /// Percent
    pub range: Option<f64>,
    /// Percent per tap
    pub step: Option<f64>,
    pub rated_current: Option<f64>,
    pub pt_ratio: Option<f64>,
}

/// One secondary-table row.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareSpec {
    record: SourceRecord,
}

impl HardwareSpec {
    pub fn name(&self) -> &str {
        self.record.field(0)
    }

    pub fn line(&self) -> usize {
        self.record.line()
    }

    fn number(&self, index: usize) -> Option<f64> {
        self.record
            .field(index)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    pub fn as_conductor(&self) -> ConductorSpec {
        ConductorSpec {
            resistance: self.number(1),
            gmr: self.number(2),
            diameter: self.number(3),
            ampacity: self.number(4),
        }
    }

    pub fn as_cable(&self) -> CableSpec {
        CableSpec {
            conductor: self.as_conductor(),
            outer_diameter: self.number(5),
            neutral_resistance: self.number(6),
            neutral_gmr: self.number(7),
            neutral_diameter: self.number(8),
            neutral_strands: self.number(9),
        }
    }

    pub fn as_construction(&self) -> ConstructionSpec {
        let mut positions = [None; 4];
        for (slot, position) in positions.iter_mut().enumerate() {
            let x = self.number(1 + slot * 2);
            let y = self.number(2 + slot * 2);
            *position = x.zip(y);
        }
        ConstructionSpec { positions }
    }

    pub fn as_transformer(&self) -> TransformerSpec {
        TransformerSpec {
            percent_impedance: self.number(1),
            x_over_r: self.number(2),
            no_load_loss: self.number(3),
            rated_kva: self.number(4),
        }
    }

    pub fn as_regulator(&self) -> RegulatorSpec {
        RegulatorSpec {
            range: self.number(1),
            step: self.number(2),
            rated_current: self.number(3),
            pt_ratio: self.number(4),
        }
    }
}

/// Name-keyed index of the secondary table.
#[derive(Debug, Clone, Default)]
pub struct HardwareLookup {
    specs: HashMap<String, HardwareSpec>,
    issues: Vec<DiagnosticIssue>,
}

static SHARED: Lazy<Mutex<HashMap<[u8; 32], Arc<HardwareLookup>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl HardwareLookup {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index a secondary table. The first row with a given name wins.
    pub fn parse(text: &str) -> FeedrResult<Self> {
        let rows = parse_secondary(text)?;
        let mut lookup = HardwareLookup::empty();
        for record in rows {
            let spec = HardwareSpec { record };
            let name = spec.name().to_string();
            if name.is_empty() {
                lookup.issues.push(
                    DiagnosticIssue::new(Severity::Warning, "lookup", "secondary row without a name")
                        .with_line(spec.line()),
                );
                continue;
            }
            if lookup.specs.contains_key(&name) {
                lookup.issues.push(
                    DiagnosticIssue::new(
                        Severity::Warning,
                        "lookup",
                        "duplicate secondary row ignored",
                    )
                    .with_line(spec.line())
                    .with_entity(name),
                );
                continue;
            }
            lookup.specs.insert(name, spec);
        }
        tracing::debug!(entries = lookup.specs.len(), "indexed secondary table");
        Ok(lookup)
    }

    /// Parse `text`, reusing an index already built from identical text.
    pub fn shared(text: &str) -> FeedrResult<Arc<Self>> {
        let digest: [u8; 32] = Sha256::digest(text.as_bytes()).into();
        if let Some(hit) = Self::cached(&digest) {
            return Ok(hit);
        }
        let lookup = Arc::new(Self::parse(text)?);
        if let Ok(mut cache) = SHARED.lock() {
            cache.entry(digest).or_insert_with(|| Arc::clone(&lookup));
        }
        Ok(lookup)
    }

    fn cached(digest: &[u8; 32]) -> Option<Arc<Self>> {
        SHARED.lock().ok()?.get(digest).cloned()
    }

    pub fn get(&self, name: &str) -> Option<&HardwareSpec> {
        self.specs.get(name.trim())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Problems found while indexing.
    pub fn issues(&self) -> &[DiagnosticIssue] {
        &self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
336ACSR,0.306,0.0244,0.721,530
CONST1,0,28,2.5,28,7,28,4,24
XF25,2.1,3.5,0.4,25
REG1,10,0.625,219,60
336ACSR,9,9,9,9
";

    #[test]
    fn typed_views_read_columns() {
        let lookup = HardwareLookup::parse(TABLE).unwrap();
        assert_eq!(lookup.len(), 4);

        let cond = lookup.get("336ACSR").unwrap().as_conductor();
        assert_eq!(cond.resistance, Some(0.306));
        assert_eq!(cond.ampacity, Some(530.0));

        let construction = lookup.get("CONST1").unwrap().as_construction();
        assert_eq!(construction.positions[3], Some((4.0, 24.0)));

        let xfmr = lookup.get(" XF25 ").unwrap().as_transformer();
        assert_eq!(xfmr.rated_kva, Some(25.0));

        let reg = lookup.get("REG1").unwrap().as_regulator();
        assert_eq!(reg.step, Some(0.625));
    }

    #[test]
    fn first_duplicate_wins_with_warning() {
        let lookup = HardwareLookup::parse(TABLE).unwrap();
        assert_eq!(
            lookup.get("336ACSR").unwrap().as_conductor().resistance,
            Some(0.306)
        );
        assert_eq!(lookup.issues().len(), 1);
        assert_eq!(lookup.issues()[0].line, Some(5));
    }

    #[test]
    fn non_numeric_cells_are_none() {
        let lookup = HardwareLookup::parse("C2,abc,,0.5\n").unwrap();
        let cond = lookup.get("C2").unwrap().as_conductor();
        assert_eq!(cond.resistance, None);
        assert_eq!(cond.gmr, None);
        assert_eq!(cond.diameter, Some(0.5));
        assert_eq!(cond.ampacity, None);
    }

    #[test]
    fn shared_reuses_identical_text() {
        let text = "SHARED_TEST_ROW,1,2,3\n";
        let a = HardwareLookup::shared(text).unwrap();
        let b = HardwareLookup::shared(text).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
