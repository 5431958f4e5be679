//! Phase reconciliation.
//!
//! A link can only carry phases present at both of its endpoints, and an
//! attachment only phases present at its host. Sets are only ever narrowed,
//! and whatever an object carried on a removed phase (demand, capacitor
//! banks, transformer ratings, conductors, spacings, regulator sensing) is
//! cleared with it.

use feedr_core::{ConversionDiagnostics, ObjectArena, Phase, PhaseSet, Role};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub narrowed: usize,
    pub emptied: usize,
}

pub fn reconcile_phases(
    arena: &mut ObjectArena,
    diagnostics: &mut ConversionDiagnostics,
) -> PhaseReport {
    let mut report = PhaseReport::default();

    for id in arena.ids() {
        let Some(obj) = arena.get(id) else {
            continue;
        };
        let neighbors: Vec<_> = match obj.role() {
            Role::FromTo => [obj.from, obj.to].into_iter().flatten().collect(),
            Role::Parentable => obj.parent.into_iter().collect(),
            Role::Nodable => continue,
        };
        let before = obj.phases;
        let mut phases = neighbors
            .iter()
            .filter_map(|n| arena.get(*n))
            .fold(before, |acc, n| acc & n.phases);

        let Some(obj) = arena.get_mut(id) else {
            continue;
        };
        if obj.element.is_line() {
            let has_neutral = obj
                .line_configuration_mut()
                .map(|lc| lc.has_neutral())
                .unwrap_or(false);
            if !has_neutral {
                phases.remove(Phase::N);
            }
        }

        if phases != before {
            report.narrowed += 1;
            obj.element.retain_phases(phases);
            for config in &mut obj.configs {
                config.body.retain_phases(phases);
            }
        }
        obj.phases = phases;
        if phases.primary() == PhaseSet::EMPTY && !before.primary().is_empty() {
            report.emptied += 1;
            diagnostics.add_warning_with_entity(
                "phase",
                &format!("no phases left after reconciling {}", before),
                &obj.name,
            );
        }
    }

    tracing::debug!(
        narrowed = report.narrowed,
        emptied = report.emptied,
        "phases reconciled"
    );
    report
}
