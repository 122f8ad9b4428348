//! Typed, defaulting access to node attributes.

use super::{AttributeValue, Node};
use log::debug;

/// Read-only view over a node's attributes.
///
/// Every accessor takes the value to use when the attribute is absent. An
/// attribute stored with a different kind than requested also yields the
/// default, so reading an attribute never fails.
pub struct NodeAttrHelper<'n> {
    node: &'n Node,
}

impl<'n> NodeAttrHelper<'n> {
    pub fn new(node: &'n Node) -> Self {
        Self { node }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.attributes.contains_key(name)
    }

    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.node.attributes.get(name) {
            Some(AttributeValue::Int(v)) => *v,
            Some(other) => self.mismatch(name, "int", other, default),
            None => default,
        }
    }

    pub fn get_ints(&self, name: &str, default: &[i64]) -> Vec<i64> {
        match self.node.attributes.get(name) {
            Some(AttributeValue::Ints(v)) => v.clone(),
            Some(other) => self.mismatch(name, "ints", other, default.to_vec()),
            None => default.to_vec(),
        }
    }

    pub fn get_float(&self, name: &str, default: f32) -> f32 {
        match self.node.attributes.get(name) {
            Some(AttributeValue::Float(v)) => *v,
            Some(other) => self.mismatch(name, "float", other, default),
            None => default,
        }
    }

    pub fn get_floats(&self, name: &str, default: &[f32]) -> Vec<f32> {
        match self.node.attributes.get(name) {
            Some(AttributeValue::Floats(v)) => v.clone(),
            Some(other) => self.mismatch(name, "floats", other, default.to_vec()),
            None => default.to_vec(),
        }
    }

    pub fn get_string(&self, name: &str, default: &str) -> String {
        match self.node.attributes.get(name) {
            Some(AttributeValue::String(v)) => v.clone(),
            Some(other) => self.mismatch(name, "string", other, default.to_string()),
            None => default.to_string(),
        }
    }

    fn mismatch<T>(&self, name: &str, wanted: &str, found: &AttributeValue, default: T) -> T {
        debug!(
            "[{}] attribute '{}' is {} but {} was requested, using default",
            self.node.op_type,
            name,
            found.kind(),
            wanted
        );
        default
    }
}
