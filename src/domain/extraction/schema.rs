//! Declarative record schemas for the extraction protocol.

/// Where a field's raw text comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// Whole body of the named section.
    Section(&'static str),
    /// First meaningful line of the named section.
    FirstLine(&'static str),
    /// A `Label: value` line anywhere in the text.
    Label(&'static str),
    /// A `Label: value` line inside the named section.
    LabelIn {
        section: &'static str,
        label: &'static str,
    },
    /// A section body if present, otherwise a labeled line.
    SectionOrLabel(&'static str),
}

/// Shape of the value and what to substitute when it cannot be read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text {
        fallback: &'static str,
    },
    Number {
        min: f64,
        max: f64,
        default: f64,
    },
    List {
        min_items: usize,
        max_items: usize,
        filler: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub source: Source,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    /// Required text field with a literal fallback.
    pub const fn text(name: &'static str, source: Source, fallback: &'static str) -> Self {
        Self {
            name,
            source,
            kind: FieldKind::Text { fallback },
            required: true,
        }
    }

    /// Text field that is simply absent when not found.
    pub const fn optional_text(name: &'static str, source: Source) -> Self {
        Self {
            name,
            source,
            kind: FieldKind::Text { fallback: "" },
            required: false,
        }
    }

    /// Required number clamped to `[min, max]`.
    pub const fn number(
        name: &'static str,
        source: Source,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            source,
            kind: FieldKind::Number { min, max, default },
            required: true,
        }
    }

    /// Required list padded with `filler` up to `min_items`.
    pub const fn list(
        name: &'static str,
        source: Source,
        min_items: usize,
        filler: &'static str,
    ) -> Self {
        Self {
            name,
            source,
            kind: FieldKind::List {
                min_items,
                max_items: usize::MAX,
                filler,
            },
            required: true,
        }
    }

    /// Required list bounded to `[min_items, max_items]`.
    pub const fn bounded_list(
        name: &'static str,
        source: Source,
        min_items: usize,
        max_items: usize,
        filler: &'static str,
    ) -> Self {
        Self {
            name,
            source,
            kind: FieldKind::List {
                min_items,
                max_items,
                filler,
            },
            required: true,
        }
    }
}

/// A named, ordered set of field specs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}
