/// Saved parameter-tree state
///
/// The pipeline is persisted per dataset as a nested tree:
///
/// ```text
/// { children: { "scale#0": { value: true, expanded: false,
///                            children: { factor: { value: 2.0 } } },
///               "define regions#1": { value: true,
///                            children: { kind: { value: "mask" },
///                                        regiongroup: { children: {
///                                            "1.0": { value: "2.0, 5.0" } } } } },
///               "output": { value: false, children: { name: { value: "untitled" } } } } }
/// ```
///
/// Children are kept in insertion order: that order *is* the processing order.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::params::ParamValue;

/// One node of the saved tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Children::is_empty")]
    pub children: Children,
}

impl StateNode {
    pub fn with_value(value: ParamValue) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&StateNode> {
        self.children.get(name)
    }

    /// Follow a path of child names
    pub fn at(&self, path: &[&str]) -> Option<&StateNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    pub fn bool_value(&self) -> Option<bool> {
        self.value.as_ref().and_then(ParamValue::as_bool)
    }

    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            Some(ParamValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// Named child nodes in insertion order.
///
/// Equality is order-sensitive: moving a step changes the saved state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Children(IndexMap<String, StateNode>);

impl Children {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Children {
    type Target = IndexMap<String, StateNode>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Children {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl PartialEq for Children {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl FromIterator<(String, StateNode)> for Children {
    fn from_iter<I: IntoIterator<Item = (String, StateNode)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
