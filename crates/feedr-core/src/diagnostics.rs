//! Diagnostics collected while converting a feeder.
//!
//! Conversion never aborts on a bad row or an unconnectable object. Instead
//! every recovered problem lands here as a [`DiagnosticIssue`]:
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping issues (`parse`, `numeric`, `topology`, `phase`, `voltage`, `lookup`)
//! - Optional entity references (object names)
//! - Optional line numbers into the primary table
//!
//! # Example
//!
//! ```
//! use feedr_core::diagnostics::ConversionDiagnostics;
//!
//! let mut diag = ConversionDiagnostics::new();
//! diag.add_warning_with_entity("parse", "non-numeric x coordinate", "OH_1042");
//! diag.add_error_with_entity("topology", "dropped: link lacks an endpoint", "OH_1042");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but conversion continued (e.g., defaulted value)
    Warning,
    /// Object could not be kept (e.g., unresolved topology)
    Error,
}

/// A single diagnostic issue encountered during conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g., "parse", "topology")
    pub category: String,
    pub message: String,
    /// 1-based line in the primary table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Object name the issue refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            entity: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }

        Ok(())
    }
}

/// Counters describing what a conversion did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionStats {
    pub records: usize,
    pub objects: usize,
    pub configs: usize,
    pub synthesized_nodes: usize,
    pub dropped_objects: usize,
    pub expanded_transformers: usize,
    pub renamed_configs: usize,
    pub defaulted_values: usize,
}

/// Complete diagnostics for a conversion: counters plus issues.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionDiagnostics {
    pub stats: ConversionStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl ConversionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw issue directly
    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    // =========================================================================
    // Warning Methods
    // =========================================================================

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    // =========================================================================
    // Error Methods
    // =========================================================================

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();
        let issue_summary = match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        };

        format!(
            "{} records, {} objects, {} configs, {} synthesized, {} dropped | {}",
            self.stats.records,
            self.stats.objects,
            self.stats.configs,
            self.stats.synthesized_nodes,
            self.stats.dropped_objects,
            issue_summary
        )
    }
}

impl std::fmt::Display for ConversionDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Conversion: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
