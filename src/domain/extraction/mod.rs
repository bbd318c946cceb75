//! Structured-extraction protocol.
//!
//! Turns loosely templated oracle text into records that always satisfy their
//! schema. Scanning lives in [`sections`], field declarations in [`schema`],
//! and population plus the degradation audit trail in [`record`].
//!
//! Callers only ever see [`extract`] and the typed accessors on
//! [`ExtractedRecord`]; header quirks never leak past this module.

pub mod record;
pub mod schema;
pub mod sections;

pub use record::{
    extract, extract_from, parse_number, split_inline, Degradation, DegradationKind,
    ExtractedRecord, ExtractionReport, FieldValue,
};
pub use schema::{FieldKind, FieldSpec, RecordSchema, Source};
pub use sections::{labeled_value, normalize_name, strip_list_marker, Section, SectionMap};
