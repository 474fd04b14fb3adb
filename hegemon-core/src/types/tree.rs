//! Generic ordered tag/value trees.
//!
//! The loader boundary: the collaborator's parser turns the game's text
//! format into these trees, and manager `load_*` calls consume them. The
//! core never sees raw text beyond scalar leaves.

use crate::fixed::Fixed;
use crate::types::date::Date;
use serde::{Deserialize, Serialize};

/// A value attached to a tag: a scalar leaf or a nested tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeValue {
    Scalar(String),
    Tree(ValueTree),
}

impl TreeValue {
    pub fn scalar(text: impl Into<String>) -> Self {
        TreeValue::Scalar(text.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            TreeValue::Scalar(text) => Some(text),
            TreeValue::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ValueTree> {
        match self {
            TreeValue::Scalar(_) => None,
            TreeValue::Tree(tree) => Some(tree),
        }
    }

    pub fn as_fixed(&self) -> Option<Fixed> {
        self.as_scalar()?.parse().ok()
    }

    pub fn as_date(&self) -> Option<Date> {
        self.as_scalar()?.parse().ok()
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_scalar()?.parse().ok()
    }
}

/// An insertion-ordered list of `(tag, value)` pairs. Tags may repeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTree(pub Vec<(String, TreeValue)>);

impl ValueTree {
    pub fn new() -> Self {
        ValueTree(Vec::new())
    }

    pub fn push(&mut self, tag: impl Into<String>, value: TreeValue) -> &mut Self {
        self.0.push((tag.into(), value));
        self
    }

    pub fn push_scalar(&mut self, tag: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(tag, TreeValue::Scalar(value.into()))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &TreeValue)> {
        self.0.iter().map(|(tag, value)| (tag.as_str(), value))
    }

    /// First value for a tag, if any.
    pub fn get(&self, tag: &str) -> Option<&TreeValue> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == tag)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_entries_with_repeats() {
        let mut tree = ValueTree::new();
        tree.push_scalar("a", "1");
        tree.push_scalar("b", "2");
        tree.push_scalar("a", "3");
        let tags: Vec<&str> = tree.entries().map(|(tag, _)| tag).collect();
        assert_eq!(tags, vec!["a", "b", "a"]);
        assert_eq!(tree.get("a").and_then(TreeValue::as_scalar), Some("1"));
    }

    #[test]
    fn typed_leaf_accessors() {
        let value = TreeValue::scalar("2.5");
        assert_eq!(value.as_fixed(), Some(Fixed::from_int(2) + Fixed::HALF));
        let date = TreeValue::scalar("1836.1.1");
        assert_eq!(date.as_date(), Some(Date::from_ymd(1836, 1, 1).unwrap()));
        let nested = TreeValue::Tree(ValueTree::new());
        assert_eq!(nested.as_scalar(), None);
        assert!(nested.as_tree().is_some());
    }
}
