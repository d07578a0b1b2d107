//! Call-stack guard and the handle given to user callbacks.
//!
//! Declarations, discovery sources and constructors may need other services
//! while they run. They receive a [`Resolver`], which looks those services up
//! in the same registry and carries the [`CallStack`] of the outer request, so
//! a category asked for again from inside its own resolution fails with
//! [`RegistryError::RecursiveLookup`] instead of looping.

use crate::registry::{Candidates, Query, Registry};
use hintreg_core::{Candidate, Category, ImplType, RegistryError};
use std::sync::Arc;

/// What is in progress on the current call chain.
#[derive(Debug, Default, Clone)]
pub struct CallStack {
    resolving: Vec<Category>,
    scanning: Vec<Category>,
    constructing: Vec<ImplType>,
}

impl CallStack {
    /// An empty call stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `category` is being resolved or scanned further up.
    pub fn is_busy(&self, category: Category) -> bool {
        self.resolving.contains(&category) || self.scanning.contains(&category)
    }

    /// Whether `implementation` is being constructed further up.
    pub fn is_constructing(&self, implementation: ImplType) -> bool {
        self.constructing.contains(&implementation)
    }

    /// Number of nested operations in progress.
    pub fn depth(&self) -> usize {
        self.resolving.len() + self.scanning.len() + self.constructing.len()
    }

    pub(crate) fn enter(&mut self, category: Category) -> Result<(), RegistryError> {
        if self.is_busy(category) {
            return Err(RegistryError::RecursiveLookup { category });
        }
        self.resolving.push(category);
        Ok(())
    }

    pub(crate) fn leave(&mut self, category: Category) {
        if let Some(pos) = self.resolving.iter().rposition(|c| *c == category) {
            self.resolving.remove(pos);
        }
    }

    pub(crate) fn begin_scan(&mut self, category: Category) -> Result<(), RegistryError> {
        if self.scanning.contains(&category) {
            return Err(RegistryError::RecursiveLookup { category });
        }
        self.scanning.push(category);
        Ok(())
    }

    pub(crate) fn end_scan(&mut self, category: Category) {
        if let Some(pos) = self.scanning.iter().rposition(|c| *c == category) {
            self.scanning.remove(pos);
        }
    }

    /// Returns `false` when `implementation` is already under construction.
    pub(crate) fn begin_construction(&mut self, implementation: ImplType) -> bool {
        if self.is_constructing(implementation) {
            return false;
        }
        self.constructing.push(implementation);
        true
    }

    pub(crate) fn end_construction(&mut self, implementation: ImplType) {
        if let Some(pos) = self.constructing.iter().rposition(|t| *t == implementation) {
            self.constructing.remove(pos);
        }
    }
}

/// Registry access for callbacks running inside a lookup.
pub struct Resolver<'a> {
    registry: &'a mut Registry,
    stack: &'a mut CallStack,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(registry: &'a mut Registry, stack: &'a mut CallStack) -> Self {
        Self { registry, stack }
    }

    /// Like [`Registry::lookup_one`], sharing the current call stack.
    pub fn lookup_one<T>(&mut self, query: Query<'_, T>) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.registry.resolve_one(&query, self.stack)
    }

    /// Like [`Registry::lookup`], sharing the current call stack.
    pub fn lookup<T>(&mut self, query: Query<'_, T>) -> Result<Candidates<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.registry.resolve_all(&query, self.stack)
    }

    /// The preferred candidate of `T` with no filter or hints.
    pub fn get<T>(&mut self) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.lookup_one(Query::new())
    }

    /// Whether this registry serves `T`.
    pub fn serves<T: ?Sized + 'static>(&self) -> bool {
        self.registry.serves(Category::of::<T>())
    }

    /// The current call stack.
    pub fn stack(&self) -> &CallStack {
        self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}
    trait Codec {}
    struct English;

    #[test]
    fn test_reentry_is_recursive() {
        let mut stack = CallStack::new();
        let greeter = Category::of::<dyn Greeter>();
        stack.enter(greeter).unwrap();
        stack.enter(Category::of::<dyn Codec>()).unwrap();

        let err = stack.enter(greeter).unwrap_err();
        assert!(err.is_recursive());

        stack.leave(greeter);
        assert!(stack.enter(greeter).is_ok());
    }

    #[test]
    fn test_scanning_blocks_resolution() {
        let mut stack = CallStack::new();
        let greeter = Category::of::<dyn Greeter>();
        stack.begin_scan(greeter).unwrap();
        assert!(stack.begin_scan(greeter).is_err());
        assert!(stack.enter(greeter).is_err());
        stack.end_scan(greeter);
        assert!(!stack.is_busy(greeter));
    }

    #[test]
    fn test_construction_guard() {
        let mut stack = CallStack::new();
        let english = ImplType::of::<English>();
        assert!(stack.begin_construction(english));
        assert!(!stack.begin_construction(english));
        assert_eq!(stack.depth(), 1);
        stack.end_construction(english);
        assert!(!stack.is_constructing(english));
    }
}
