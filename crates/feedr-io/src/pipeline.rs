//! End-to-end conversion: tables in, assembled model and diagnostics out.

use std::path::Path;

use anyhow::Context;
use feedr_core::{graph_utils::source_components, ConversionDiagnostics, FeedrResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geometry::CanvasTransform;
use crate::lookup::HardwareLookup;
use crate::passes::{
    assemble, deduplicate_configs, expand_secondaries, propagate_voltage, reconcile_phases,
    synthesize_connectivity, FeederModel,
};
use crate::tables::parse_primary;
use crate::translate::{raw_coordinates, translate_records, TranslateContext};

fn default_rescale() -> bool {
    true
}

fn default_canvas() -> f64 {
    1000.0
}

/// Knobs for a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Fit raw coordinates onto the canvas; `false` keeps them as read.
    #[serde(default = "default_rescale")]
    pub rescale: bool,
    #[serde(default = "default_canvas")]
    pub canvas_width: f64,
    #[serde(default = "default_canvas")]
    pub canvas_height: f64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            rescale: default_rescale(),
            canvas_width: default_canvas(),
            canvas_height: default_canvas(),
        }
    }
}

/// One connected island of the assembled model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInfo {
    pub members: usize,
    pub sources: Vec<String>,
}

/// Result of a conversion: the model plus everything noticed along the way.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub model: FeederModel,
    pub diagnostics: ConversionDiagnostics,
    pub components: Vec<ComponentInfo>,
}

/// Convert with default options.
pub fn convert(primary: &str, secondary: &str) -> FeedrResult<ConversionResult> {
    convert_with_options(primary, secondary, &ConvertOptions::default())
}

pub fn convert_with_options(
    primary: &str,
    secondary: &str,
    options: &ConvertOptions,
) -> FeedrResult<ConversionResult> {
    let lookup = HardwareLookup::shared(secondary)?;
    convert_with_lookup(primary, &lookup, options)
}

/// Convert a primary table against an already indexed secondary table.
pub fn convert_with_lookup(
    primary: &str,
    lookup: &HardwareLookup,
    options: &ConvertOptions,
) -> FeedrResult<ConversionResult> {
    let records = parse_primary(primary)?;
    let mut diagnostics = ConversionDiagnostics::new();
    for issue in lookup.issues() {
        diagnostics.add(issue.clone());
    }

    let canvas = if options.rescale {
        CanvasTransform::fit(
            records.iter().filter_map(raw_coordinates),
            options.canvas_width,
            options.canvas_height,
        )
    } else {
        CanvasTransform::identity()
    };
    let ctx = TranslateContext {
        lookup,
        canvas: &canvas,
    };

    let mut arena = translate_records(&records, &ctx, &mut diagnostics);
    let connectivity = synthesize_connectivity(&mut arena, &mut diagnostics);
    debug!(
        synthesized = connectivity.synthesized,
        unresolved = connectivity.unresolved,
        "connectivity built"
    );
    reconcile_phases(&mut arena, &mut diagnostics);
    let voltage = propagate_voltage(&mut arena, &mut diagnostics);
    expand_secondaries(&mut arena, &mut diagnostics);
    deduplicate_configs(&mut arena, &mut diagnostics);
    let model = assemble(&mut arena, &mut diagnostics);

    let mut components = Vec::new();
    for component in source_components(&arena) {
        components.push(ComponentInfo {
            members: component.members.len(),
            sources: component
                .sources
                .iter()
                .filter_map(|id| arena.name_of(*id))
                .map(str::to_string)
                .collect(),
        });
        if component.has_single_source() {
            continue;
        }
        let message = format!(
            "component {} of {} objects has {} sources",
            component.component_id,
            component.members.len(),
            component.sources.len()
        );
        warn!("{}", message);
        diagnostics.add_warning("voltage", &message);
    }

    info!(
        records = diagnostics.stats.records,
        objects = diagnostics.stats.objects,
        configs = diagnostics.stats.configs,
        voltage_passes = voltage.passes,
        warnings = diagnostics.warning_count(),
        errors = diagnostics.error_count(),
        "conversion finished"
    );
    Ok(ConversionResult {
        model,
        diagnostics,
        components,
    })
}

/// Read both tables from disk and convert them.
pub fn convert_files(
    primary: &Path,
    secondary: &Path,
    options: &ConvertOptions,
) -> anyhow::Result<ConversionResult> {
    let primary_text = std::fs::read_to_string(primary)
        .with_context(|| format!("reading primary table '{}'", primary.display()))?;
    let secondary_text = std::fs::read_to_string(secondary)
        .with_context(|| format!("reading secondary table '{}'", secondary.display()))?;
    convert_with_options(&primary_text, &secondary_text, options)
        .with_context(|| format!("converting '{}'", primary.display()))
}
