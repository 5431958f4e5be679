//! Per-record translation from primary-table rows to network objects.
//!
//! Each row is dispatched on its [`HardwareType`] to one builder. Builders
//! read cells through a [`RowReader`], which records a [`RowWarning`] instead
//! of failing whenever a cell is malformed and a default is substituted. A row
//! that needed any such repair comes back as `Err((object, warnings))`: the
//! object is still usable, the warnings say what was guessed.

mod buses;
mod devices;
pub mod fields;
mod lines;

use feedr_core::{
    sanitize_name, ConversionDiagnostics, DiagnosticIssue, NetworkObject, ObjectArena, PhaseSet,
    Severity,
};

use crate::geometry::CanvasTransform;
use crate::lookup::HardwareLookup;
use crate::tables::SourceRecord;

/// Primary-table hardware type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareType {
    OverheadLine,
    Capacitor,
    UndergroundLine,
    Regulator,
    Transformer,
    Switch,
    Node,
    Source,
    OvercurrentDevice,
    Motor,
    Generator,
    Consumer,
    /// Any code outside the table above, kept verbatim for the warning.
    Unknown(String),
}

impl HardwareType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => HardwareType::OverheadLine,
            "2" => HardwareType::Capacitor,
            "3" => HardwareType::UndergroundLine,
            "4" => HardwareType::Regulator,
            "5" => HardwareType::Transformer,
            "6" => HardwareType::Switch,
            "8" => HardwareType::Node,
            "9" => HardwareType::Source,
            "10" => HardwareType::OvercurrentDevice,
            "11" => HardwareType::Motor,
            "12" => HardwareType::Generator,
            "13" => HardwareType::Consumer,
            other => HardwareType::Unknown(other.to_string()),
        }
    }
}

/// A repair made while translating one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWarning {
    pub category: &'static str,
    pub message: String,
}

impl RowWarning {
    pub fn new(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

pub type Translation = Result<NetworkObject, (NetworkObject, Vec<RowWarning>)>;

/// Read-only inputs shared by every row.
#[derive(Debug, Clone, Copy)]
pub struct TranslateContext<'a> {
    pub lookup: &'a HardwareLookup,
    pub canvas: &'a CanvasTransform,
}

/// Cell accessor that collects warnings as defaults are substituted.
pub(crate) struct RowReader<'r> {
    record: &'r SourceRecord,
    warnings: Vec<RowWarning>,
}

impl<'r> RowReader<'r> {
    fn new(record: &'r SourceRecord) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn text(&self, index: usize) -> &'r str {
        self.record.field(index)
    }

    /// Cell text, or `None` when empty.
    pub(crate) fn name_at(&self, index: usize) -> Option<&'r str> {
        Some(self.text(index)).filter(|s| !s.is_empty())
    }

    pub(crate) fn warn(&mut self, category: &'static str, message: impl Into<String>) {
        self.warnings.push(RowWarning::new(category, message));
    }

    /// Numeric cell. Empty cells are `None` silently; unparseable cells warn.
    pub(crate) fn number(&mut self, index: usize, what: &str) -> Option<f64> {
        let raw = self.text(index);
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.warn("parse", format!("non-numeric {} '{}'", what, raw));
                None
            }
        }
    }

    pub(crate) fn number_or(&mut self, index: usize, default: f64, what: &str) -> f64 {
        self.number(index, what).unwrap_or(default)
    }

    /// Strictly positive numeric cell; anything else falls back to `default`,
    /// with a warning unless the cell was empty.
    pub(crate) fn positive_or(&mut self, index: usize, default: f64, what: &str) -> f64 {
        match self.number(index, what) {
            Some(v) if v > 0.0 => v,
            Some(v) => {
                self.warn(
                    "numeric",
                    format!("non-positive {} {}, using {}", what, v, default),
                );
                default
            }
            None => default,
        }
    }

    fn finish(self, object: NetworkObject) -> Translation {
        if self.warnings.is_empty() {
            Ok(object)
        } else {
            Err((object, self.warnings))
        }
    }
}

fn strip_braces(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim()
        .to_string()
}

/// Raw (x, y) of a record when both cells parse.
pub fn raw_coordinates(record: &SourceRecord) -> Option<(f64, f64)> {
    let x = record.field(fields::X).parse::<f64>().ok()?;
    let y = record.field(fields::Y).parse::<f64>().ok()?;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

/// Translate one primary-table row.
pub fn translate(record: &SourceRecord, ctx: &TranslateContext<'_>) -> Translation {
    let mut row = RowReader::new(record);
    let name = sanitize_name(row.text(fields::NAME));

    let phases = match PhaseSet::parse(row.text(fields::PHASE)) {
        Some(set) if !set.is_empty() => set,
        _ => {
            let raw = row.text(fields::PHASE);
            row.warn("parse", format!("unrecognized phase code '{}', using ABC", raw));
            PhaseSet::ABC
        }
    };

    let kind = HardwareType::from_code(row.text(fields::TYPE_CODE));
    let mut object = match &kind {
        HardwareType::OverheadLine => lines::overhead_line(&mut row, ctx, &name, phases),
        HardwareType::UndergroundLine => lines::underground_line(&mut row, ctx, &name, phases),
        HardwareType::Regulator => devices::regulator(&mut row, ctx, &name, phases),
        HardwareType::Transformer => devices::transformer(&mut row, ctx, &name, phases),
        HardwareType::Capacitor => devices::capacitor(&mut row, &name, phases),
        HardwareType::Switch => devices::switch(&mut row, &name, phases),
        HardwareType::OvercurrentDevice => devices::overcurrent(&mut row, &name, phases),
        HardwareType::Motor => devices::motor(&mut row, &name, phases),
        HardwareType::Generator => devices::generator(&mut row, &name, phases),
        HardwareType::Node => buses::node(&mut row, &name, phases),
        HardwareType::Source => buses::source(&mut row, &name, phases),
        HardwareType::Consumer => buses::consumer(&mut row, &name, phases),
        HardwareType::Unknown(code) => {
            row.warn(
                "parse",
                format!("unknown hardware type code '{}', translated as node", code),
            );
            buses::plain_node(&name, phases)
        }
    };

    object.guid = strip_braces(row.text(fields::GUID));
    object.parent_guid = strip_braces(row.text(fields::PARENT_GUID));
    object.line = Some(record.line());
    object.coordinates = match raw_coordinates(record) {
        Some((x, y)) => Some(ctx.canvas.apply(x, y)),
        None => {
            let (x, y) = (row.text(fields::X), row.text(fields::Y));
            row.warn(
                "parse",
                format!("unreadable coordinates ('{}', '{}')", x, y),
            );
            None
        }
    };

    row.finish(object)
}

/// Translate every record into a fresh arena, collecting row warnings.
pub fn translate_records(
    records: &[SourceRecord],
    ctx: &TranslateContext<'_>,
    diagnostics: &mut ConversionDiagnostics,
) -> ObjectArena {
    let mut arena = ObjectArena::with_capacity(records.len());
    let mut repaired = 0usize;
    for record in records {
        let (object, warnings) = match translate(record, ctx) {
            Ok(object) => (object, Vec::new()),
            Err(partial) => partial,
        };
        let id = arena.insert(object);
        if warnings.is_empty() {
            continue;
        }
        repaired += 1;
        let name = arena.name_of(id).unwrap_or_default().to_string();
        for warning in warnings {
            diagnostics.stats.defaulted_values += 1;
            diagnostics.add(
                DiagnosticIssue::new(Severity::Warning, warning.category, warning.message)
                    .with_line(record.line())
                    .with_entity(name.clone()),
            );
        }
    }
    diagnostics.stats.records = records.len();
    tracing::debug!(
        records = records.len(),
        repaired,
        "translated primary table"
    );
    arena
}

#[cfg(test)]
mod tests;
