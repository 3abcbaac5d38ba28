//! Header metadata extraction.
//!
//! Parses the leading header block of a document (title line, author and
//! revision lines, attribute lines) into a normalized [`AttributeDictionary`]
//! and returns the remaining body text untouched. Extraction is pure and
//! never fails: anything that is not a recognized attribute becomes body.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::section::DocumentFormat;

/// A normalized attribute value: scalar string or list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Scalar(String),
    List(Vec<String>),
}

impl AttrValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AttrValue::Scalar(value) => Some(value.as_str()),
            AttrValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::Scalar(_) => None,
            AttrValue::List(values) => Some(values.as_slice()),
        }
    }
}

/// A single document author, split from a `Name <email>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middlename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
}

impl Author {
    /// Parses one author entry of the form `Name <email>`; the email part is
    /// optional. Returns `None` for blank entries.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        let (name, email) = match (entry.find('<'), entry.rfind('>')) {
            (Some(open), Some(close)) if close > open => {
                let email = entry[open + 1..close].trim().to_string();
                let name = entry[..open].trim().to_string();
                (name, Some(email).filter(|e| !e.is_empty()))
            }
            _ => (entry.to_string(), None),
        };

        if name.is_empty() {
            return None;
        }

        let parts: Vec<&str> = name.split_whitespace().collect();
        let firstname = parts.first().map(|s| s.to_string());
        let lastname = if parts.len() > 1 {
            parts.last().map(|s| s.to_string())
        } else {
            None
        };
        let middlename = if parts.len() > 2 {
            Some(parts[1..parts.len() - 1].join(" "))
        } else {
            None
        };

        Some(Self {
            name,
            email,
            firstname,
            middlename,
            lastname,
        })
    }
}

/// Parses a comma-separated author line into individual authors.
pub fn parse_author_line(line: &str) -> Vec<Author> {
    line.split(',').filter_map(Author::parse).collect()
}

/// Ordered dictionary of normalized document attributes.
///
/// Alias resolution folds equivalent source keys into canonical ones:
/// `description`/`abstract` become `summary`, `keywords`/`tags`/`subject`
/// become the `t` topic list, `revnumber`/`revision` become `version`,
/// `date` becomes `revdate`. Unknown keys pass through unchanged so they can
/// be rendered as custom tags. Authors are kept separately because they carry
/// structure beyond a plain string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeDictionary {
    #[serde(flatten)]
    entries: IndexMap<String, AttrValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authors: Vec<Author>,
}

impl AttributeDictionary {
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(AttrValue::as_scalar)
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).and_then(AttrValue::as_list)
    }

    pub fn title(&self) -> Option<&str> {
        self.scalar("title")
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.authors.is_empty()
    }

    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .insert(key.to_string(), AttrValue::Scalar(value.into()));
    }

    pub fn push_authors(&mut self, authors: Vec<Author>) {
        self.authors.extend(authors);
    }

    fn extend_list(&mut self, key: &str, values: Vec<String>) {
        match self.entries.get_mut(key) {
            Some(AttrValue::List(existing)) => existing.extend(values),
            Some(AttrValue::Scalar(old)) => {
                let mut merged = vec![old.clone()];
                merged.extend(values);
                self.entries.insert(key.to_string(), AttrValue::List(merged));
            }
            None => {
                self.entries.insert(key.to_string(), AttrValue::List(values));
            }
        }
    }

    /// Inserts a raw `key: value` pair, applying alias normalization.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "summary" | "description" | "abstract" => self.set_scalar("summary", value),
            "keywords" | "tags" | "subject" => {
                let topics: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                if !topics.is_empty() {
                    self.extend_list("t", topics);
                }
            }
            "author" | "authors" => self.push_authors(parse_author_line(value)),
            "version" | "revnumber" | "revision" => self.set_scalar("version", value),
            "date" | "revdate" => self.set_scalar("revdate", value),
            _ => match self.entries.get(&key) {
                Some(_) => self.extend_list(&key, vec![value.to_string()]),
                None => self.set_scalar(&key, value),
            },
        }
    }
}

/// Result of splitting a document into header metadata and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub attributes: AttributeDictionary,
    pub body: String,
}

/// Splits a raw document into its normalized attributes and body.
///
/// The header block is the title line, optional AsciiDoc author and revision
/// lines, and the contiguous run of attribute lines that follows. Scanning
/// stops at the first line that is neither a recognized attribute nor blank;
/// everything from that line on is body text.
pub fn extract(text: &str, format: DocumentFormat) -> ExtractedDocument {
    let lines: Vec<&str> = text.lines().collect();
    let mut attributes = AttributeDictionary::default();
    let mut i = 0;

    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }

    if let Some(title) = lines.get(i).and_then(|line| parse_title(line, format)) {
        attributes.set_scalar("title", title);
        i += 1;

        if format == DocumentFormat::AsciiDoc {
            if lines.get(i).is_some_and(|line| is_author_line(line)) {
                attributes.push_authors(parse_author_line(lines[i]));
                i += 1;
            }
            if let Some(rev) = lines.get(i).and_then(|line| parse_revision_line(line)) {
                attributes.set_scalar("version", rev.version);
                if let Some(date) = rev.date {
                    attributes.set_scalar("revdate", date);
                }
                if let Some(remark) = rev.remark {
                    attributes.set_scalar("remark", remark);
                }
                i += 1;
            }
        }
    }

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        match parse_attribute_line(line) {
            Some((key, value)) => {
                attributes.insert_raw(&key, &value);
                i += 1;
            }
            None => break,
        }
    }

    let body = lines[i..].join("\n");
    ExtractedDocument { attributes, body }
}

fn parse_title(line: &str, format: DocumentFormat) -> Option<String> {
    let marker = format.marker();
    let trimmed = line.trim_end();
    let depth = trimmed.chars().take_while(|c| *c == marker).count();
    if depth != 1 {
        return None;
    }
    let rest = &trimmed[1..];
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

fn is_author_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && !line.starts_with(':')
        && line.contains('<')
        && line.contains('@')
        && line.contains('>')
}

struct RevisionLine {
    version: String,
    date: Option<String>,
    remark: Option<String>,
}

/// Parses an AsciiDoc revision line: `vX.Y, date: remark` (date and remark
/// optional, positional).
fn parse_revision_line(line: &str) -> Option<RevisionLine> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^v(\d[\w.\-]*)\s*(?:,\s*([^:]+?)\s*)?(?::\s*(.*))?$").expect("static regex")
    });
    let caps = re.captures(line.trim())?;
    Some(RevisionLine {
        version: caps.get(1)?.as_str().to_string(),
        date: caps.get(2).map(|m| m.as_str().to_string()),
        remark: caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|r| !r.is_empty()),
    })
}

/// Recognizes `:key: value` (AsciiDoc) and `key: value` attribute lines.
fn parse_attribute_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim_end();
    if let Some(rest) = trimmed.strip_prefix(':') {
        let close = rest.find(':')?;
        let key = &rest[..close];
        if is_attribute_key(key) {
            return Some((key.to_string(), rest[close + 1..].trim().to_string()));
        }
        return None;
    }

    let colon = trimmed.find(':')?;
    let key = &trimmed[..colon];
    let value = trimmed[colon + 1..].trim();
    if is_attribute_key(key) && !value.is_empty() {
        Some((key.to_string(), value.to_string()))
    } else {
        None
    }
}

fn is_attribute_key(key: &str) -> bool {
    !key.is_empty()
        && key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
