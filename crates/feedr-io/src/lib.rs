//! # feedr-io: Windmil feeder conversion
//!
//! Reads a Windmil primary (`.std`) and secondary (`.seq`) table pair and
//! produces a GridLAB-D style distribution model: network objects wired
//! through `from`/`to`/`parent` references plus the named configurations
//! they use.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feedr_io::{convert_files, ConvertOptions};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let result = convert_files(
//!         Path::new("feeder.std"),
//!         Path::new("feeder.seq"),
//!         &ConvertOptions::default(),
//!     )?;
//!     println!("{} entries", result.model.len());
//!     if result.diagnostics.has_errors() {
//!         eprintln!("{}", result.diagnostics);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Tables** ([`tables`], [`lookup`]) - CSV rows; the secondary table is indexed by name
//! 2. **Translation** ([`translate`]) - one network object per primary row
//! 3. **Connectivity** ([`passes::connectivity`]) - GUID links become arena references
//! 4. **Phases and voltage** ([`passes::phases`], [`passes::voltage`])
//! 5. **Secondary expansion** ([`passes::secondary`]) - residential transformers go triplex
//! 6. **Deduplication** ([`passes::dedup`]) - identical configurations collapse
//! 7. **Assembly** ([`passes::assemble`]) - the keyed [`FeederModel`]
//!
//! Only empty or non-tabular input is fatal. Everything else is repaired and
//! reported through [`feedr_core::ConversionDiagnostics`].

pub mod geometry;
pub mod lookup;
pub mod passes;
pub mod pipeline;
pub mod tables;
pub mod translate;

pub use geometry::CanvasTransform;
pub use lookup::{HardwareLookup, HardwareSpec};
pub use passes::{FeederModel, ModelEntry, ObjectRecord};
pub use pipeline::{
    convert, convert_files, convert_with_lookup, convert_with_options, ComponentInfo,
    ConversionResult, ConvertOptions,
};
pub use tables::SourceRecord;
pub use translate::{translate, translate_records, HardwareType, RowWarning, TranslateContext};
