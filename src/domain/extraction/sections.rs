//! Line tokenizer and section extractor for oracle text.
//!
//! A section starts at a markdown header line (`#`, `##`, `###`, ...) and
//! runs until the next header of equal or higher level. Every header opens
//! its own entry, so a `### Milestone 1` nested under `## Milestones` is
//! reachable both directly and through its parent's body.

/// Responses longer than this are cut before scanning.
pub const MAX_RESPONSE_CHARS: usize = 100_000;

/// One classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Header { level: usize, title: &'a str },
    Item(&'a str),
    Text(&'a str),
    Blank,
}

impl<'a> Line<'a> {
    pub fn classify(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Line::Blank;
        }
        if let Some((level, title)) = header(trimmed) {
            return Line::Header { level, title };
        }
        match strip_list_marker(trimmed) {
            Some(item) => Line::Item(item),
            None => Line::Text(trimmed),
        }
    }
}

fn header(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &line[level..];
    // "#hashtag" is text, "# Title" is a header.
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((level, rest.trim()))
}

/// Strips a bullet (`-`, `*`, `+`, `•`) or decimal (`1.`, `2)`) marker.
pub fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim_start();
    for bullet in ['-', '*', '+', '•'] {
        if let Some(rest) = line.strip_prefix(bullet) {
            if rest.starts_with(char::is_whitespace) {
                return Some(rest.trim());
            }
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        for marker in ['.', ')'] {
            if let Some(after) = rest.strip_prefix(marker) {
                if after.is_empty() || after.starts_with(char::is_whitespace) {
                    return Some(after.trim());
                }
            }
        }
    }
    None
}

/// Lowercases, drops emphasis and numbering, and collapses whitespace.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect();
    let cleaned = cleaned.trim().trim_end_matches(':').trim();
    let cleaned = strip_list_marker(cleaned).unwrap_or(cleaned);
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reads `Label: value` from a single line, ignoring list markers and emphasis.
pub fn labeled_value(line: &str, label: &str) -> Option<String> {
    let line = line.trim();
    let line = strip_list_marker(line).unwrap_or(line);
    let plain: String = line.chars().filter(|c| *c != '*').collect();
    let (key, value) = plain.split_once(':')?;
    if normalize_name(key) == normalize_name(label) {
        Some(value.trim().to_string())
    } else {
        None
    }
}

/// A header and the raw lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub level: usize,
    pub lines: Vec<String>,
}

impl Section {
    /// Normalized title used for lookups.
    pub fn name(&self) -> String {
        normalize_name(&self.title)
    }

    /// Non-blank lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// List items in order, markers stripped.
    pub fn items(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|l| match Line::classify(l) {
                Line::Item(item) if !item.is_empty() => Some(item.to_string()),
                _ => None,
            })
            .collect()
    }

    /// First non-blank, non-header line with any list marker removed.
    pub fn first_line(&self) -> Option<String> {
        self.lines.iter().find_map(|l| match Line::classify(l) {
            Line::Item(s) | Line::Text(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        })
    }

    pub fn labeled(&self, label: &str) -> Option<String> {
        self.lines.iter().find_map(|l| labeled_value(l, label))
    }

    /// Re-scans this section's body, exposing nested headers as sections.
    pub fn subsections(&self) -> SectionMap {
        SectionMap::parse(&self.lines.join("\n"))
    }
}

/// Ordered mapping from section name to accumulated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl SectionMap {
    pub fn parse(text: &str) -> Self {
        let text = sanitize(text);
        let mut map = SectionMap::default();
        // Indices of sections still accepting lines, outermost first.
        let mut open: Vec<usize> = Vec::new();

        for raw in text.lines() {
            if let Line::Header { level, title } = Line::classify(raw) {
                while let Some(&idx) = open.last() {
                    if map.sections[idx].level >= level {
                        open.pop();
                    } else {
                        break;
                    }
                }
                for &idx in &open {
                    map.sections[idx].lines.push(raw.to_string());
                }
                map.sections.push(Section {
                    title: title.to_string(),
                    level,
                    lines: Vec::new(),
                });
                open.push(map.sections.len() - 1);
                continue;
            }

            if open.is_empty() {
                map.preamble.push(raw.to_string());
            }
            for &idx in &open {
                map.sections[idx].lines.push(raw.to_string());
            }
        }

        map
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Text before the first header.
    pub fn preamble(&self) -> Section {
        Section {
            title: String::new(),
            level: 0,
            lines: self.preamble.clone(),
        }
    }

    /// Finds a section by exact normalized name, falling back to prefix match.
    pub fn get(&self, name: &str) -> Option<&Section> {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return None;
        }
        self.sections
            .iter()
            .find(|s| s.name() == wanted)
            .or_else(|| self.sections.iter().find(|s| s.name().starts_with(&wanted)))
    }

    /// Finds `Label: value` anywhere in the text.
    pub fn labeled(&self, label: &str) -> Option<String> {
        self.preamble
            .iter()
            .find_map(|l| labeled_value(l, label))
            .or_else(|| self.sections.iter().find_map(|s| s.labeled(label)))
    }
}

/// Drops control characters other than line breaks and tabs, and caps length.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .take(MAX_RESPONSE_CHARS)
        .collect()
}
