//! Path-based selection of fields and sub-frames.
//!
//! A field's path is its ancestors' names and its own joined with `.`.
//! Unnamed fields get a positional placeholder: `field<N>` when selecting
//! fields and `[N]` when selecting frames, N being the 0-based index.
//!
//! Pattern grammar, one segment per `.`-separated part:
//! - literal text matches itself
//! - `*` inside a segment matches any run of characters within it, `?` one
//!   character; a lone `*` therefore matches exactly one segment
//! - `**` as a whole segment matches any number of segments, including none
//!
//! A name containing `.` or `\` is written into paths with those characters
//! escaped by a leading `\`, so `{"a.b":{c:1}}` has path `a\.b.c` and only
//! `{a:{b:{c:1}}}` has path `a.b.c`. Patterns use the same escape: `a\.b.c`
//! selects the former.

use std::borrow::Cow;

use tracing::debug;

use crate::error::{DataFrameError, Result};
use crate::field::Field;
use crate::frame::Frame;

/// Compiled dotted-path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFilter {
    pattern: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    AnyDepth,
    Glob(Vec<char>),
}

impl SegmentFilter {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| DataFrameError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("empty pattern"));
        }

        let mut segments = Vec::new();
        for part in split_segments(pattern) {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            if part == "**" {
                // consecutive `**` segments are equivalent to one
                if segments.last() != Some(&Segment::AnyDepth) {
                    segments.push(Segment::AnyDepth);
                }
            } else if part.contains("**") {
                return Err(invalid("`**` must be a whole segment"));
            } else {
                segments.push(Segment::Glob(part.chars().collect()));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the dotted `path` matches. Escaped dots stay inside their
    /// segment.
    pub fn matches(&self, path: &str) -> bool {
        match_segments(&self.segments, &split_segments(path))
    }
}

/// Escape `name` for use as one path segment.
pub fn escape_segment(name: &str) -> Cow<'_, str> {
    if !name.contains(['.', '\\']) {
        return Cow::Borrowed(name);
    }
    let mut escaped = String::with_capacity(name.len() + 2);
    for c in name.chars() {
        if c == '.' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

// split on unescaped `.`, removing the escapes
fn split_segments(path: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next().unwrap_or('\\')),
            '.' => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn match_segments(segments: &[Segment], parts: &[String]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match parts.split_first() {
            Some((part, tail)) => glob_match(glob, part) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Single-segment wildcard match with `*` and `?`.
fn glob_match(glob: &[char], text: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let (mut g, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(g) {
            Some('*') => {
                backtrack = Some((g, t));
                g += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    g = star + 1;
                    t = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }
    glob[g..].iter().all(|&c| c == '*')
}

/// Renders the path segment used for unnamed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub prefix: String,
    pub suffix: String,
}

impl Placeholder {
    /// `field<N>`, the default for field selection.
    pub fn field() -> Self {
        Self {
            prefix: "field".to_string(),
            suffix: String::new(),
        }
    }

    /// `[N]`, the default for frame selection.
    pub fn index() -> Self {
        Self {
            prefix: "[".to_string(),
            suffix: "]".to_string(),
        }
    }

    pub fn render(&self, index: usize) -> String {
        format!("{}{index}{}", self.prefix, self.suffix)
    }
}

fn child_path(
    prefix: Option<&str>,
    field: &Field,
    index: usize,
    placeholder: &Placeholder,
) -> String {
    let name = match field.name() {
        Some(name) => escape_segment(name).into_owned(),
        None => escape_segment(&placeholder.render(index)).into_owned(),
    };
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name,
    }
}

/// Selects leaf fields whose path matches a pattern.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    filter: SegmentFilter,
    placeholder: Placeholder,
}

impl FieldSelector {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            filter: SegmentFilter::new(pattern)?,
            placeholder: Placeholder::field(),
        })
    }

    /// Override the placeholder used for unnamed fields.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn filter(&self) -> &SegmentFilter {
        &self.filter
    }

    /// Matching leaf fields in depth-first order. Nested frames are walked,
    /// never returned.
    pub fn select<'f>(&self, frame: &'f Frame) -> Result<Vec<&'f Field>> {
        let mut results = Vec::new();
        self.recurse(frame, None, &mut results)?;
        debug!(
            pattern = self.filter.pattern(),
            matched = results.len(),
            "selected fields"
        );
        Ok(results)
    }

    fn recurse<'f>(
        &self,
        frame: &'f Frame,
        prefix: Option<&str>,
        results: &mut Vec<&'f Field>,
    ) -> Result<()> {
        for (index, field) in frame.iter().enumerate() {
            let path = child_path(prefix, field, index, &self.placeholder);
            if field.is_frame() {
                if let Some(child) = field.value()?.as_frame() {
                    self.recurse(child, Some(&path), results)?;
                }
            } else if self.filter.matches(&path) {
                results.push(field);
            }
        }
        Ok(())
    }
}

/// Selects nested frames whose path matches a pattern.
#[derive(Debug, Clone)]
pub struct FrameSelector {
    filter: SegmentFilter,
    placeholder: Placeholder,
    path_field: Option<String>,
}

impl FrameSelector {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            filter: SegmentFilter::new(pattern)?,
            placeholder: Placeholder::index(),
            path_field: None,
        })
    }

    /// Record the matched path in a string field with this name, appended
    /// to each captured frame.
    pub fn with_path_field(mut self, name: impl Into<String>) -> Self {
        self.path_field = Some(name.into());
        self
    }

    /// Override the placeholder used for unnamed fields.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn filter(&self) -> &SegmentFilter {
        &self.filter
    }

    /// Copies of every matching nested frame, at any depth, in depth-first
    /// order. The source tree is left untouched.
    pub fn select(&self, frame: &Frame) -> Result<Vec<Frame>> {
        let mut results = Vec::new();
        self.recurse(frame, None, &mut results)?;
        debug!(
            pattern = self.filter.pattern(),
            matched = results.len(),
            "selected frames"
        );
        Ok(results)
    }

    fn recurse(
        &self,
        frame: &Frame,
        prefix: Option<&str>,
        results: &mut Vec<Frame>,
    ) -> Result<()> {
        for (index, field) in frame.iter().enumerate() {
            if !field.is_frame() {
                continue;
            }
            let Some(child) = field.value()?.as_frame() else {
                continue;
            };
            let path = child_path(prefix, field, index, &self.placeholder);
            if self.filter.matches(&path) {
                let mut captured = child.clone();
                if let Some(path_field) = &self.path_field {
                    captured.add(path_field.as_str(), path.as_str())?;
                }
                results.push(captured);
            }
            self.recurse(child, Some(&path), results)?;
        }
        Ok(())
    }
}
