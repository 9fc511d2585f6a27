//! Layered value merging
//!
//! [`extend_value`] combines a value from the current layer with the value
//! it inherits from a parent layer (a parent template, an earlier
//! configuration file). The same rules drive template inheritance and
//! settings updates:
//!
//! - No parent value: the current value wins, even when it is absent.
//! - Absent current value (missing or `null`): the inherited value is
//!   deleted.
//! - Mapping over mapping: keys are merged recursively; a key whose merge
//!   result is absent is removed.
//! - Sequence over sequence: current items first, then parent items, each
//!   value kept once.
//! - A mapping with `add` and/or `remove` over a sequence: a [`SequenceDelta`]
//!   edits the inherited sequence instead of replacing it.
//! - Anything else: the current value wins as-is.

use crate::value::{Mapping, Value};

/// Extend the current value with the parent value
///
/// `Value::Null` counts as an absent value on both sides.
///
/// # Examples
///
/// ```
/// use pandocomatic_core::{Value, extend_value};
///
/// let current = Value::Sequence(vec!["a".into(), "b".into()]);
/// let parent = Value::Sequence(vec!["b".into(), "c".into()]);
///
/// assert_eq!(
///     extend_value(Some(current), Some(parent)),
///     Some(Value::Sequence(vec!["a".into(), "b".into(), "c".into()]))
/// );
/// ```
pub fn extend_value(current: Option<Value>, parent: Option<Value>) -> Option<Value> {
    let current = current.filter(|value| !value.is_null());

    let Some(parent) = parent.filter(|value| !value.is_null()) else {
        return current;
    };

    // An absent current value deletes the inherited one
    let current = current?;

    let merged = match (current, parent) {
        (Value::Mapping(current), Value::Mapping(parent)) => {
            Value::Mapping(merge_mappings(current, parent))
        }
        (Value::Sequence(current), Value::Sequence(parent)) => {
            Value::Sequence(unique(current.into_iter().chain(parent)))
        }
        (Value::Mapping(current), Value::Sequence(parent)) => {
            match SequenceDelta::from_mapping(&current) {
                Some(delta) => Value::Sequence(delta.apply(parent)),
                None => {
                    tracing::debug!(
                        "Mapping without 'add' or 'remove' replaces an inherited sequence"
                    );
                    Value::Mapping(current)
                }
            }
        }
        (current, parent) => {
            if matches!(parent, Value::Mapping(_) | Value::Sequence(_))
                && std::mem::discriminant(&current) != std::mem::discriminant(&parent)
            {
                tracing::debug!(
                    current = current.type_name(),
                    parent = parent.type_name(),
                    "Type mismatch while merging, current value wins"
                );
            }
            current
        }
    };

    Some(merged)
}

/// Merge every key of `parent` into `current`
fn merge_mappings(mut current: Mapping, parent: Mapping) -> Mapping {
    for (key, parent_value) in parent {
        if let Some(existing) = current.get_mut(&key) {
            let taken = std::mem::take(existing);
            if let Some(merged) = extend_value(Some(taken), Some(parent_value)) {
                *existing = merged;
                continue;
            }
            current.shift_remove(&key);
        } else {
            current.insert(key, parent_value);
        }
    }
    current
}

/// Collect values, keeping the first occurrence of each
fn unique(values: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();
    for value in values {
        if !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

/// An incremental edit of an inherited sequence
///
/// Written in a configuration source as a mapping with `add` and/or
/// `remove` entries, each a single value or a sequence of values:
///
/// ```yaml
/// preprocessors:
///   remove: ./strip-comments.sh
///   add: [./number-figures.sh]
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceDelta {
    /// Values placed in front of the inherited sequence
    pub add: Vec<Value>,
    /// Values removed from the inherited sequence
    pub remove: Vec<Value>,
}

impl SequenceDelta {
    /// Key listing the values to add
    pub const ADD: &'static str = "add";
    /// Key listing the values to remove
    pub const REMOVE: &'static str = "remove";

    /// Interpret a mapping as a delta
    ///
    /// Returns `None` when the mapping has neither an `add` nor a `remove` key.
    pub fn from_mapping(mapping: &Mapping) -> Option<Self> {
        if !mapping.contains_key(Self::ADD) && !mapping.contains_key(Self::REMOVE) {
            return None;
        }

        let items = |key: &str| {
            mapping
                .get(key)
                .cloned()
                .map(Value::into_items)
                .unwrap_or_default()
        };

        Some(Self {
            add: items(Self::ADD),
            remove: items(Self::REMOVE),
        })
    }

    /// Apply this delta to an inherited sequence
    ///
    /// Removed values are dropped from `parent` first, then added values are
    /// placed in front of what remains. Each value is kept once.
    pub fn apply(self, parent: Vec<Value>) -> Vec<Value> {
        let remove = self.remove;
        let remaining = parent.into_iter().filter(|value| !remove.contains(value));
        unique(self.add.into_iter().chain(remaining))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn seq(items: &[&str]) -> Value {
        Value::Sequence(items.iter().map(|s| Value::from(*s)).collect())
    }

    fn map(entries: &[(&str, Value)]) -> Value {
        Value::Mapping(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_absent_parent_keeps_current() {
        assert_eq!(
            extend_value(Some(Value::from("x")), None),
            Some(Value::from("x"))
        );
        assert_eq!(
            extend_value(Some(Value::from("x")), Some(Value::Null)),
            Some(Value::from("x"))
        );
        assert_eq!(extend_value(None, None), None);
    }

    #[test]
    fn test_absent_current_deletes_parent() {
        for parent in [Value::from("x"), seq(&["a"]), map(&[("k", Value::Integer(1))])] {
            assert_eq!(extend_value(None, Some(parent.clone())), None);
            assert_eq!(extend_value(Some(Value::Null), Some(parent)), None);
        }
    }

    #[test]
    fn test_scalar_current_wins() {
        assert_eq!(
            extend_value(Some(Value::from("html5")), Some(Value::from("latex"))),
            Some(Value::from("html5"))
        );
        assert_eq!(
            extend_value(Some(Value::Bool(false)), Some(Value::Integer(3))),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn test_mapping_disjoint_keys_are_combined() {
        let current = map(&[("to", Value::from("html5"))]);
        let parent = map(&[("standalone", Value::Bool(true))]);

        let merged = extend_value(Some(current), Some(parent)).unwrap();

        assert_eq!(
            merged,
            map(&[
                ("to", Value::from("html5")),
                ("standalone", Value::Bool(true))
            ])
        );
    }

    #[test]
    fn test_mapping_shared_key_merges_recursively() {
        let current = map(&[("filters", seq(&["a"]))]);
        let parent = map(&[("filters", seq(&["b"]))]);

        let merged = extend_value(Some(current), Some(parent)).unwrap();

        assert_eq!(merged, map(&[("filters", seq(&["a", "b"]))]));
    }

    #[test]
    fn test_mapping_null_key_removes_inherited_key() {
        let current = map(&[("toc", Value::Null), ("to", Value::from("html"))]);
        let parent = map(&[("toc", Value::Bool(true)), ("css", Value::from("a.css"))]);

        let merged = extend_value(Some(current), Some(parent)).unwrap();

        assert_eq!(
            merged,
            map(&[("to", Value::from("html")), ("css", Value::from("a.css"))])
        );
    }

    #[test]
    fn test_mapping_over_scalar_parent_wins() {
        let current = map(&[("k", Value::Integer(1))]);
        assert_eq!(
            extend_value(Some(current.clone()), Some(Value::from("scalar"))),
            Some(current)
        );
    }

    #[test]
    fn test_scalar_over_mapping_parent_wins() {
        let parent = map(&[("k", Value::Integer(1))]);
        assert_eq!(
            extend_value(Some(Value::from("plain")), Some(parent)),
            Some(Value::from("plain"))
        );
    }

    #[test]
    fn test_sequence_concat_current_first_deduplicated() {
        assert_eq!(
            extend_value(Some(seq(&["a", "b"])), Some(seq(&["b", "c"]))),
            Some(seq(&["a", "b", "c"]))
        );
    }

    #[test]
    fn test_sequence_concat_keeps_first_occurrence() {
        assert_eq!(
            extend_value(Some(seq(&["a", "a", "b"])), Some(seq(&["c", "a"]))),
            Some(seq(&["a", "b", "c"]))
        );
    }

    #[test]
    fn test_sequence_delta_remove_and_add() {
        let delta = map(&[("remove", seq(&["x"])), ("add", seq(&["y"]))]);
        assert_eq!(
            extend_value(Some(delta), Some(seq(&["x", "z"]))),
            Some(seq(&["y", "z"]))
        );
    }

    #[test]
    fn test_sequence_delta_scalar_entries() {
        let delta = map(&[("remove", Value::from("x")), ("add", Value::from("w"))]);
        assert_eq!(
            extend_value(Some(delta), Some(seq(&["x", "z"]))),
            Some(seq(&["w", "z"]))
        );
    }

    #[test]
    fn test_sequence_delta_add_only_deduplicates() {
        let delta = map(&[("add", seq(&["z", "y"]))]);
        assert_eq!(
            extend_value(Some(delta), Some(seq(&["x", "z"]))),
            Some(seq(&["z", "y", "x"]))
        );
    }

    #[test]
    fn test_sequence_delta_remove_only() {
        let delta = map(&[("remove", seq(&["a", "c"]))]);
        assert_eq!(
            extend_value(Some(delta), Some(seq(&["a", "b", "c"]))),
            Some(seq(&["b"]))
        );
    }

    #[test]
    fn test_mapping_without_delta_keys_replaces_sequence() {
        let current = map(&[("other", Value::Integer(1))]);
        assert_eq!(
            extend_value(Some(current.clone()), Some(seq(&["a"]))),
            Some(current)
        );
    }

    #[test]
    fn test_scalar_over_sequence_wins() {
        assert_eq!(
            extend_value(Some(Value::from("only")), Some(seq(&["a", "b"]))),
            Some(Value::from("only"))
        );
    }

    #[test]
    fn test_nested_delta_inside_mapping() {
        let current = map(&[("filters", map(&[("remove", Value::from("old"))]))]);
        let parent = map(&[("filters", seq(&["old", "keep"]))]);

        assert_eq!(
            extend_value(Some(current), Some(parent)),
            Some(map(&[("filters", seq(&["keep"]))]))
        );
    }

    #[test]
    fn test_delta_from_mapping() {
        let Value::Mapping(mapping) = map(&[("add", Value::Integer(1))]) else {
            panic!("expected mapping");
        };
        let delta = SequenceDelta::from_mapping(&mapping).unwrap();
        assert_eq!(delta.add, vec![Value::Integer(1)]);
        assert!(delta.remove.is_empty());

        assert!(SequenceDelta::from_mapping(&Mapping::new()).is_none());
    }
}
