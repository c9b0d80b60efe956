//! Evaluation context handed to effects and conditions.
//!
//! Effects may read other effective values while computing their own. The
//! context tracks which (object, property) pairs are being evaluated; asking
//! for one that is already on the stack, or nesting deeper than the
//! configured limit, is a cyclic configuration and fails with
//! `CyclicEffect` naming the chain.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::core::{EngineError, EngineResult, ObjectId};
use crate::objects::ObjectManager;
use crate::properties::{Property, PropertyId, PropertyType, Value};

type Key = (ObjectId, PropertyId);

pub struct EffectContext<'a> {
    manager: &'a ObjectManager,
    stack: RefCell<SmallVec<[Key; 8]>>,
}

impl<'a> EffectContext<'a> {
    pub(crate) fn new(manager: &'a ObjectManager) -> Self {
        Self {
            manager,
            stack: RefCell::new(SmallVec::new()),
        }
    }

    /// Read access to the game state.
    #[must_use]
    pub fn manager(&self) -> &'a ObjectManager {
        self.manager
    }

    /// Effective value of another property.
    pub fn value(&self, object: ObjectId, property: PropertyId) -> EngineResult<Value> {
        self.manager.evaluate(self, object, property)
    }

    /// Typed effective value of another property.
    pub fn get<T: PropertyType>(&self, object: ObjectId, property: Property<T>) -> EngineResult<T> {
        let value = self.value(object, property.id())?;
        self.manager.convert(property.id(), &value)
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    pub(crate) fn enter(&self, key: Key, max_depth: usize) -> EngineResult<()> {
        let mut stack = self.stack.borrow_mut();
        if stack.contains(&key) || stack.len() >= max_depth {
            let chain = stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|(o, p)| self.manager.key_name(*o, *p))
                .collect();
            return Err(EngineError::CyclicEffect { chain });
        }
        stack.push(key);
        Ok(())
    }

    pub(crate) fn leave(&self) {
        self.stack.borrow_mut().pop();
    }
}
