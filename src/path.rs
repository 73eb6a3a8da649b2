//! Dotted/bracketed path access over a generic object graph.
//!
//! Paths look like `ads[1].creatives[0].type`. Reads return `None` as soon as a
//! segment is missing; writes create the missing containers, choosing an object
//! or an array from the delimiter that follows each segment (`.` or `[`).

use crate::error::{Result, VastError};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// How far past the end of an array a write may reach
const MAX_ARRAY_GROWTH: usize = 10_000;

/// The kind of container a path segment must resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn empty(self) -> Value {
        match self {
            Container::Object => Value::Object(Map::new()),
            Container::Array => Value::Array(Vec::new()),
        }
    }
}

/// One identifier or index of a path, with the container it must hold
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    token: String,
    container: Option<Container>,
}

/// Split a path into segments
///
/// A segment's container is decided by the first `.` or `[` after it; `]`
/// delimiters are skipped over while looking.
fn tokenize(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pending: Option<String> = None;
    let mut token = String::new();

    for c in path.chars() {
        match c {
            '.' | '[' | ']' => {
                if !token.is_empty() {
                    pending = Some(std::mem::take(&mut token));
                }
                let container = match c {
                    '.' => Some(Container::Object),
                    '[' => Some(Container::Array),
                    _ => None,
                };
                if let Some(container) = container {
                    if let Some(token) = pending.take() {
                        segments.push(Segment {
                            token,
                            container: Some(container),
                        });
                    }
                }
            }
            _ => {
                if let Some(token) = pending.take() {
                    segments.push(Segment {
                        token,
                        container: None,
                    });
                }
                token.push(c);
            }
        }
    }

    if !token.is_empty() {
        pending = Some(token);
    }
    if let Some(token) = pending {
        segments.push(Segment {
            token,
            container: None,
        });
    }

    segments
}

/// Path-addressed access to a nested object graph
pub trait PathAccess {
    /// The root of the graph paths are resolved against
    fn root(&self) -> &Value;

    fn root_mut(&mut self) -> &mut Value;

    /// Read the value at `path`; an empty path returns the root itself
    fn get_path(&self, path: &str) -> Option<&Value> {
        tokenize(path)
            .iter()
            .try_fold(self.root(), |value, segment| child(value, &segment.token))
    }

    /// Read the value at `path`, also resolving a trailing `length` on arrays and strings
    fn lookup_path(&self, path: &str) -> Option<Cow<'_, Value>> {
        let segments = tokenize(path);
        let mut current = self.root();

        for (index, segment) in segments.iter().enumerate() {
            match child(current, &segment.token) {
                Some(next) => current = next,
                None if segment.token == "length" && index + 1 == segments.len() => {
                    return length(current).map(|len| Cow::Owned(Value::from(len)));
                }
                None => return None,
            }
        }

        Some(Cow::Borrowed(current))
    }

    /// Write `value` at `path`, creating missing containers along the way
    fn set_path(&mut self, path: &str, value: Value) -> Result<&Value> {
        let mut segments = tokenize(path);
        let last = segments
            .pop()
            .ok_or_else(|| VastError::InvalidArgument("path must be specified.".to_string()))?;

        let mut current = self.root_mut();
        for segment in &segments {
            current = slot(current, &segment.token)?;
            if !current.is_object() && !current.is_array() {
                *current = segment.container.unwrap_or(Container::Object).empty();
            }
        }

        let target = slot(current, &last.token)?;
        *target = value;
        Ok(target)
    }

    /// Map over the array at `path`; anything else maps to an empty list
    fn map_path<T, F>(&self, path: &str, mut mapper: F) -> Vec<T>
    where
        F: FnMut(&Value, usize, &[Value]) -> T,
    {
        let Some(items) = self.get_path(path).and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| mapper(item, index, items))
            .collect()
    }

    /// Filter the array at `path`; anything else filters to an empty list
    fn filter_path<F>(&self, path: &str, mut predicate: F) -> Vec<&Value>
    where
        F: FnMut(&Value, usize, &[Value]) -> bool,
    {
        let Some(items) = self.get_path(path).and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter(|(index, item)| predicate(item, *index, items))
            .map(|(_, item)| item)
            .collect()
    }

    /// The first item of the array at `path` matching `predicate`
    fn find_path<F>(&self, path: &str, mut predicate: F) -> Option<&Value>
    where
        F: FnMut(&Value, usize, &[Value]) -> bool,
    {
        let items = self.get_path(path)?.as_array()?;

        items
            .iter()
            .enumerate()
            .find(|(index, item)| predicate(item, *index, items))
            .map(|(_, item)| item)
    }
}

impl PathAccess for Value {
    fn root(&self) -> &Value {
        self
    }

    fn root_mut(&mut self) -> &mut Value {
        self
    }
}

fn child<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => items.get(token.parse::<usize>().ok()?),
        _ => None,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::String(text) => Some(text.encode_utf16().count()),
        _ => None,
    }
}

/// The slot for `token` inside `value`, turning scalars into objects first
fn slot<'a>(value: &'a mut Value, token: &str) -> Result<&'a mut Value> {
    if !value.is_object() && !value.is_array() {
        *value = Value::Object(Map::new());
    }

    match value {
        Value::Array(items) => {
            let index: usize = token.parse().map_err(|_| {
                VastError::InvalidArgument(format!("`{}` is not an array index", token))
            })?;
            if index >= items.len() {
                let len = index
                    .checked_add(1)
                    .filter(|_| index - items.len() < MAX_ARRAY_GROWTH)
                    .ok_or_else(|| {
                        VastError::InvalidArgument(format!(
                            "index {} is too far past the end of an array of {}",
                            index,
                            items.len()
                        ))
                    })?;
                items.resize(len, Value::Null);
            }
            Ok(&mut items[index])
        }
        Value::Object(map) => Ok(map.entry(token.to_string()).or_insert(Value::Null)),
        _ => Err(VastError::InvalidArgument(format!(
            "cannot descend into `{}`",
            token
        ))),
    }
}
