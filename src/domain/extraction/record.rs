//! Populated records and the audit trail of what had to be filled in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::schema::{FieldKind, FieldSpec, RecordSchema, Source};
use super::sections::{SectionMap, strip_list_marker};

/// How a field deviated from what the oracle actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationKind {
    /// Nothing usable was found; the fallback was substituted.
    Defaulted,
    /// Filler entries were synthesized to reach a minimum count.
    Padded,
    /// Extra entries beyond the maximum were dropped.
    Truncated,
    /// A number was outside its range and was clamped.
    Clamped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub field: String,
    pub kind: DegradationKind,
}

/// Per-record log of defaulted, padded, truncated or clamped fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    #[serde(default)]
    pub degradations: Vec<Degradation>,
}

impl ExtractionReport {
    pub fn note(&mut self, field: impl Into<String>, kind: DegradationKind) {
        self.degradations.push(Degradation {
            field: field.into(),
            kind,
        });
    }

    /// True when any value is filler rather than oracle output.
    pub fn is_degraded(&self) -> bool {
        self.degradations
            .iter()
            .any(|d| matches!(d.kind, DegradationKind::Defaulted | DegradationKind::Padded))
    }

    /// Names of fields holding filler.
    pub fn degraded_fields(&self) -> Vec<String> {
        self.degradations
            .iter()
            .filter(|d| matches!(d.kind, DegradationKind::Defaulted | DegradationKind::Padded))
            .map(|d| d.field.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

/// Output of [`extract`]: every required field of the schema is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub schema: &'static str,
    values: BTreeMap<&'static str, FieldValue>,
    pub report: ExtractionReport,
}

impl ExtractedRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text value, or empty when the field is absent or not text.
    pub fn text(&self, name: &str) -> String {
        self.optional_text(name).unwrap_or_default()
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> f64 {
        match self.values.get(name) {
            Some(FieldValue::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        match self.values.get(name) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether the named field was substituted or padded.
    pub fn is_filler(&self, name: &str) -> bool {
        self.report.degradations.iter().any(|d| {
            d.field == name
                && matches!(d.kind, DegradationKind::Defaulted | DegradationKind::Padded)
        })
    }
}

/// Populates a record from oracle text. Total and deterministic.
pub fn extract(text: &str, schema: &RecordSchema) -> ExtractedRecord {
    extract_from(&SectionMap::parse(text), schema)
}

/// Same as [`extract`] over an already scanned section map.
pub fn extract_from(map: &SectionMap, schema: &RecordSchema) -> ExtractedRecord {
    let mut record = ExtractedRecord {
        schema: schema.name,
        values: BTreeMap::new(),
        report: ExtractionReport::default(),
    };

    for spec in schema.fields {
        if let Some(value) = resolve(map, spec, &mut record.report) {
            record.values.insert(spec.name, value);
        }
    }

    record
}

fn resolve(map: &SectionMap, spec: &FieldSpec, report: &mut ExtractionReport) -> Option<FieldValue> {
    match spec.kind {
        FieldKind::Text { fallback } => match raw_text(map, spec.source) {
            Some(text) => Some(FieldValue::Text(text)),
            None if spec.required => {
                report.note(spec.name, DegradationKind::Defaulted);
                Some(FieldValue::Text(fallback.to_string()))
            }
            None => None,
        },
        FieldKind::Number { min, max, default } => {
            let parsed = raw_text(map, spec.source).and_then(|t| parse_number(&t));
            match parsed {
                Some(n) => {
                    let clamped = n.clamp(min, max);
                    if clamped != n {
                        report.note(spec.name, DegradationKind::Clamped);
                    }
                    Some(FieldValue::Number(clamped))
                }
                None if spec.required => {
                    report.note(spec.name, DegradationKind::Defaulted);
                    Some(FieldValue::Number(default.clamp(min, max)))
                }
                None => None,
            }
        }
        FieldKind::List {
            min_items,
            max_items,
            filler,
        } => {
            let found = raw_list(map, spec.source);
            if found.is_none() && !spec.required {
                return None;
            }
            let mut items = found.unwrap_or_default();
            if items.len() < min_items {
                report.note(spec.name, DegradationKind::Padded);
                items.resize(min_items, filler.to_string());
            }
            if items.len() > max_items {
                report.note(spec.name, DegradationKind::Truncated);
                items.truncate(max_items);
            }
            Some(FieldValue::List(items))
        }
    }
}

fn raw_text(map: &SectionMap, source: Source) -> Option<String> {
    let text = match source {
        Source::Section(name) => map.get(name).map(|s| s.text()),
        Source::FirstLine(name) => map.get(name).and_then(|s| s.first_line()),
        Source::Label(label) => map.labeled(label),
        Source::LabelIn { section, label } => map.get(section).and_then(|s| s.labeled(label)),
        Source::SectionOrLabel(name) => map
            .get(name)
            .map(|s| s.text())
            .filter(|t| !t.is_empty())
            .or_else(|| map.labeled(name)),
    }?;
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn raw_list(map: &SectionMap, source: Source) -> Option<Vec<String>> {
    let section = match source {
        Source::Section(name) | Source::SectionOrLabel(name) => map.get(name),
        _ => None,
    };
    if let Some(section) = section {
        let items = section.items();
        if !items.is_empty() {
            return Some(items);
        }
        let lines: Vec<String> = section
            .text()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| strip_list_marker(l).unwrap_or(l).to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if !lines.is_empty() {
            return Some(lines);
        }
    }
    let inline = match source {
        Source::Label(label) | Source::SectionOrLabel(label) => map.labeled(label),
        Source::LabelIn { section, label } => map.get(section).and_then(|s| s.labeled(label)),
        Source::FirstLine(name) => map.get(name).and_then(|s| s.first_line()),
        Source::Section(_) => None,
    }?;
    let items = split_inline(&inline);
    (!items.is_empty()).then_some(items)
}

/// Splits `a, b; c` into trimmed, non-empty entries.
pub fn split_inline(text: &str) -> Vec<String> {
    text.split([',', ';'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads the first numeric token: digits and `.` separators, other characters
/// stripped. `"8/10"` is 8, `"Score: 7.5"` is 7.5, `"none"` is `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let token: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .filter(|c| *c != ',')
        .collect();
    let token = token.trim_end_matches('.');
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}
