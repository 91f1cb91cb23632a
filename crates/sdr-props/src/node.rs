//! Property nodes and the tree handle
//!
//! A [`PropNode`] serves `get`/`set` for the keys it understands. Nodes are
//! shared through [`Node`], a cheap clonable handle; a node links to its
//! children by returning [`PropValue::Node`] for an indexed key, which is
//! what makes the set of nodes a tree.
//!
//! Handles are reference counted without synchronization. One control thread
//! owns a device tree; callers that need more must serialize access
//! themselves.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::PropError;
use crate::key::PropKey;
use crate::value::{FromPropValue, PropValue};

/// A keyed, bidirectional value slot
///
/// Side effects of `set` are up to the implementor (a register write, a
/// retune); the tree itself attaches no meaning to them.
pub trait PropNode {
    /// Read the value stored under `key`
    fn get(&self, key: &PropKey) -> Result<PropValue, PropError>;

    /// Write `value` under `key`
    fn set(&self, key: &PropKey, value: PropValue) -> Result<(), PropError>;
}

/// Shared handle to a property node
#[derive(Clone)]
pub struct Node(Rc<dyn PropNode>);

impl Node {
    /// Wrap a node implementation
    pub fn new(node: impl PropNode + 'static) -> Self {
        Self(Rc::new(node))
    }

    /// Wrap an already shared node implementation
    pub fn from_rc(node: Rc<dyn PropNode>) -> Self {
        Self(node)
    }

    /// Read a value without asserting its type
    pub fn get(&self, key: impl Into<PropKey>) -> Result<PropValue, PropError> {
        self.0.get(&key.into())
    }

    /// Read a value and view it as `T`
    pub fn get_as<T: FromPropValue>(&self, key: impl Into<PropKey>) -> Result<T, PropError> {
        let key = key.into();
        self.0.get(&key)?.typed_for(&key)
    }

    /// Write a value
    pub fn set(
        &self,
        key: impl Into<PropKey>,
        value: impl Into<PropValue>,
    ) -> Result<(), PropError> {
        let key = key.into();
        let value = value.into();
        tracing::trace!("set {} = {:?}", key, value);
        self.0.set(&key, value)
    }

    /// Follow a link to a child node
    pub fn child(&self, key: impl Into<PropKey>) -> Result<Node, PropError> {
        self.get_as::<Node>(key)
    }

    /// Whether two handles refer to the same node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Node(..)")
    }
}

/// In-memory property node
///
/// Stores whatever is written to it and serves it back. Used for plain
/// namespaces (a device root listing its motherboards) and for state that
/// has no hardware side effect.
#[derive(Default)]
pub struct StoreNode {
    values: RefCell<BTreeMap<PropKey, PropValue>>,
}

impl StoreNode {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(self, key: impl Into<PropKey>, value: impl Into<PropValue>) -> Self {
        self.values.borrow_mut().insert(key.into(), value.into());
        self
    }

    /// Whether a key has been written
    pub fn contains(&self, key: &PropKey) -> bool {
        self.values.borrow().contains_key(key)
    }

    /// All keys written so far, in key order
    pub fn keys(&self) -> Vec<PropKey> {
        self.values.borrow().keys().cloned().collect()
    }
}

impl PropNode for StoreNode {
    fn get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        self.values
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| PropError::UnknownKey(key.to_string()))
    }

    fn set(&self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        self.values.borrow_mut().insert(key.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Prop;

    #[test]
    fn test_store_roundtrip() {
        let node = Node::new(StoreNode::new());
        node.set(Prop::Antenna, "TX/RX").unwrap();
        assert_eq!(node.get_as::<String>(Prop::Antenna).unwrap(), "TX/RX");
    }

    #[test]
    fn test_unknown_key() {
        let node = Node::new(StoreNode::new());
        let err = node.get(Prop::Bandwidth).unwrap_err();
        assert_eq!(err, PropError::UnknownKey("bandwidth".into()));
    }

    #[test]
    fn test_type_mismatch_names_key_and_types() {
        let node = Node::new(StoreNode::new().with(Prop::ClockRate, 100e6));
        let err = node.get_as::<String>(Prop::ClockRate).unwrap_err();
        assert_eq!(
            err,
            PropError::TypeMismatch {
                key: "clock_rate".into(),
                expected: "text",
                found: "real",
            }
        );
    }

    #[test]
    fn test_child_lookup() {
        let child = Node::new(StoreNode::new().with(Prop::Name, "dsp0"));
        let parent = Node::new(StoreNode::new().with(Prop::RxDsp.named("0"), child.clone()));

        let found = parent.child(Prop::RxDsp.named("0")).unwrap();
        assert!(found.ptr_eq(&child));
        assert_eq!(found.get_as::<String>(Prop::Name).unwrap(), "dsp0");
        assert!(parent.child(Prop::RxDsp.named("1")).is_err());
    }

    #[test]
    fn test_indexed_keys_are_distinct_slots() {
        let node = Node::new(StoreNode::new());
        node.set(Prop::Gain.named("PGA"), 10.0).unwrap();
        node.set(Prop::Gain.named("LNA"), 20.0).unwrap();
        assert_eq!(node.get_as::<f64>(Prop::Gain.named("PGA")).unwrap(), 10.0);
        assert_eq!(node.get_as::<f64>(Prop::Gain.named("LNA")).unwrap(), 20.0);
    }
}
