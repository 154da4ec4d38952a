//! Section maps and the numbered-section parser.
//!
//! A policy document is a run of plain-text lines. A line consisting solely
//! of a dotted section number (`4`, `4.2`, `4.2.1`) opens a section; the
//! non-blank lines that follow it, up to the next section number, form that
//! section's body. Anything before the first section number is front matter
//! and is dropped.

use std::{cmp::Ordering, collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeMap};

static SECTION_NUMBER_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").unwrap());

/// Returns true if the whole (already trimmed) line is a section number.
pub fn is_section_number(line: &str) -> bool { SECTION_NUMBER_RE.is_match(line) }

// ─── SectionMap ──────────────────────────────────────────────────────────────

/// An ordered mapping of section label → trimmed section body.
///
/// Iteration follows first-insertion order. Re-inserting an existing label
/// replaces its body but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
  entries: Vec<(String, String)>,
  index:   HashMap<String, usize>,
}

impl SectionMap {
  pub fn new() -> Self { Self::default() }

  /// Insert `body` under `label`, returning the body it replaced, if any.
  pub fn insert(
    &mut self,
    label: impl Into<String>,
    body: impl Into<String>,
  ) -> Option<String> {
    let label = label.into();
    let body = body.into();
    match self.index.get(&label) {
      Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, body)),
      None => {
        self.index.insert(label.clone(), self.entries.len());
        self.entries.push((label, body));
        None
      }
    }
  }

  pub fn get(&self, label: &str) -> Option<&str> {
    self.index.get(label).map(|&i| self.entries[i].1.as_str())
  }

  pub fn contains(&self, label: &str) -> bool { self.index.contains_key(label) }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// `(label, body)` pairs in insertion order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(l, b)| (l.as_str(), b.as_str()))
  }

  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(l, _)| l.as_str())
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SectionMap {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Self::new();
    for (label, body) in iter {
      map.insert(label, body);
    }
    map
  }
}

impl Serialize for SectionMap {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (label, body) in &self.entries {
      map.serialize_entry(label, body)?;
    }
    map.end()
  }
}

// ─── Parser ──────────────────────────────────────────────────────────────────

enum ParseState {
  NoOpenSection,
  Accumulating { label: String, buffer: Vec<String> },
}

impl ParseState {
  fn feed(self, line: &str, out: &mut SectionMap) -> Self {
    if is_section_number(line) {
      self.finish(out);
      return Self::Accumulating { label: line.to_owned(), buffer: Vec::new() };
    }

    match self {
      Self::Accumulating { label, mut buffer } => {
        if !line.is_empty() {
          buffer.push(line.to_owned());
        }
        Self::Accumulating { label, buffer }
      }
      // Front matter (title lines, blank lines) before the first section.
      Self::NoOpenSection => Self::NoOpenSection,
    }
  }

  /// Commit the open section, if it collected any body lines.
  fn finish(self, out: &mut SectionMap) {
    if let Self::Accumulating { label, buffer } = self
      && !buffer.is_empty()
    {
      out.insert(label, buffer.join("\n").trim());
    }
  }
}

/// Split `lines` into numbered sections.
///
/// Each line is trimmed before it is examined. A section number with no
/// body lines yields no entry. A section number that appears twice is opened
/// twice and the later body wins.
pub fn parse<I, S>(lines: I) -> SectionMap
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut sections = SectionMap::new();
  let state = lines
    .into_iter()
    .fold(ParseState::NoOpenSection, |state, line| {
      state.feed(line.as_ref().trim(), &mut sections)
    });
  state.finish(&mut sections);
  sections
}

// ─── Label ordering ──────────────────────────────────────────────────────────

/// Order section labels by their numeric components, so `"2" < "10"` and
/// `"1.2" < "1.10" < "2"`.
///
/// Digit runs compare by magnitude at any length, leading zeros aside; equal
/// magnitudes fall back to the raw text so `"01" < "1"`. Components that are
/// not all digits sort after numeric ones, in string order. Distinct labels
/// never compare equal.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
  let mut left = a.split('.');
  let mut right = b.split('.');
  loop {
    let ord = match (left.next(), right.next()) {
      (None, None) => return Ordering::Equal,
      (None, Some(_)) => return Ordering::Less,
      (Some(_), None) => return Ordering::Greater,
      (Some(x), Some(y)) => compare_components(x, y),
    };
    if ord != Ordering::Equal {
      return ord;
    }
  }
}

fn compare_components(x: &str, y: &str) -> Ordering {
  let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
  match (numeric(x), numeric(y)) {
    (true, true) => {
      let (mx, my) = (x.trim_start_matches('0'), y.trim_start_matches('0'));
      mx.len()
        .cmp(&my.len())
        .then_with(|| mx.cmp(my))
        .then_with(|| x.cmp(y))
    }
    (true, false) => Ordering::Less,
    (false, true) => Ordering::Greater,
    (false, false) => x.cmp(y),
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
