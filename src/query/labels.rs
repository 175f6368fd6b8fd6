/// Label sets identifying a single time series.
///
/// Rendering follows the familiar exposition style:
/// - `up{instance="a:9100", job="node"}` when the set has a metric name;
/// - `{job="node"}` without one;
/// - `up` when the name is the only label, `{}` for an empty set;
/// - `{"http.method"="GET"}` for label names that are not identifiers.
///
/// Labels are kept ordered by name, so two equal sets always render the same
/// string regardless of the order the server sent them in.
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::LabelParseError;

/// Reserved label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// An unordered mapping from label name to label value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// An empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Value of the label `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The metric name, if the set carries a non-empty one.
    #[must_use]
    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME_LABEL).filter(|n| !n.is_empty())
    }

    /// Number of labels, the metric name included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate labels ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The name rendered bare in front of the braces, if it can be.
    fn bare_name(&self) -> Option<&str> {
        self.metric_name().filter(|n| is_metric_name(n))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = self.bare_name();
        let mut labels = self
            .iter()
            .filter(|(k, _)| bare.is_none() || *k != METRIC_NAME_LABEL)
            .peekable();

        if let Some(name) = bare {
            f.write_str(name)?;
            if labels.peek().is_none() {
                return Ok(());
            }
        }

        f.write_char('{')?;
        for (i, (name, value)) in labels.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if is_label_name(name) {
                f.write_str(name)?;
            } else {
                write_quoted(f, name)?;
            }
            f.write_char('=')?;
            write_quoted(f, value)?;
        }
        f.write_char('}')
    }
}

/// Write `s` double-quoted, with the same escapes as label values.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl FromStr for LabelSet {
    type Err = LabelParseError;

    /// Parse the rendering produced by `Display` back into a label set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s).parse()
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`; any other name is rendered quoted.
fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(is_label_char)
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn err(&self, reason: &'static str) -> LabelParseError {
        LabelParseError {
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, want: char, reason: &'static str) -> Result<(), LabelParseError> {
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            Ok(())
        } else {
            Err(self.err(reason))
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn parse(mut self) -> Result<LabelSet, LabelParseError> {
        let mut set = LabelSet::new();

        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
        if !name.is_empty() {
            if !is_metric_name(name) {
                self.pos = 0;
                return Err(self.err("metric name must not start with a digit"));
            }
            set.insert(METRIC_NAME_LABEL, name);
            if self.peek().is_none() {
                return Ok(set);
            }
        }

        self.expect('{', "expected '{'")?;
        self.skip_spaces();
        if self.peek() == Some('}') {
            self.bump();
            return self.finish(set);
        }

        loop {
            self.skip_spaces();
            let key = if self.peek() == Some('"') {
                self.quoted()?
            } else {
                let key = self.take_while(is_label_char);
                if key.is_empty() {
                    return Err(self.err("expected a label name"));
                }
                key.to_owned()
            };
            self.skip_spaces();
            self.expect('=', "expected '='")?;
            self.skip_spaces();
            let value = self.quoted()?;
            if set.insert(key, value).is_some() {
                return Err(self.err("duplicate label name"));
            }
            self.skip_spaces();
            match self.bump() {
                Some(',') => {}
                Some('}') => return self.finish(set),
                _ => return Err(self.err("expected ',' or '}'")),
            }
        }
    }

    fn quoted(&mut self) -> Result<String, LabelParseError> {
        self.expect('"', "expected '\"'")?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('n') => value.push('\n'),
                    _ => return Err(self.err("invalid escape sequence")),
                },
                Some(c) => value.push(c),
                None => return Err(self.err("unterminated label value")),
            }
        }
    }

    fn finish(&self, set: LabelSet) -> Result<LabelSet, LabelParseError> {
        if self.pos == self.input.len() {
            Ok(set)
        } else {
            Err(self.err("trailing characters after '}'"))
        }
    }
}
