//! Candidate resolution.

use super::{Query, Registry, query::Candidates};
use crate::resolver::CallStack;
use hintreg_core::{
    Availability, Candidate, Category, HintSet, HintValue, ImplType, NodeId, RegistryError,
    SharedError, has_compatible_hints,
};
use std::sync::Arc;

/// What a query's key asks for.
pub(crate) enum Requested<T: ?Sized> {
    /// Nothing specific.
    Any,
    /// This very instance.
    Instance(Arc<T>),
    /// One of these implementation types.
    Types(Vec<ImplType>),
}

impl Registry {
    /// The caller hints with absent keys filled from the defaults store.
    pub(crate) fn effective_hints(&self, hints: Option<&HintSet>) -> HintSet {
        let mut effective = hints.cloned().unwrap_or_default();
        if let Some(defaults) = &self.defaults {
            defaults.apply_to(&mut effective);
        }
        effective
    }

    pub(crate) fn requested<T>(&self, query: &Query<'_, T>, hints: &HintSet) -> Requested<T>
    where
        T: ?Sized + Candidate,
    {
        let Some(value) = query.key.and_then(|key| hints.get(key)) else {
            return Requested::Any;
        };
        match value {
            HintValue::Service(service) => match service.downcast::<T>() {
                Some(instance) => Requested::Instance(instance),
                None => Requested::Types(vec![service.implementation_type()]),
            },
            other if !other.implementation_types().is_empty() => {
                Requested::Types(other.implementation_types().to_vec())
            }
            _ => Requested::Any,
        }
    }

    pub(crate) fn resolve_one<T>(
        &mut self,
        query: &Query<'_, T>,
        stack: &mut CallStack,
    ) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        let category = self.served(Category::of::<T>())?;
        stack.enter(category)?;
        let result = self.resolve_one_entered(query, category, stack);
        stack.leave(category);
        result
    }

    fn resolve_one_entered<T>(
        &mut self,
        query: &Query<'_, T>,
        category: Category,
        stack: &mut CallStack,
    ) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.ensure_scanned(category, stack)?;
        let hints = self.effective_hints(query.hints);
        let requested = self.requested(query, &hints);

        let types = match requested {
            Requested::Instance(instance) => {
                tracing::trace!(category = %category, "returning requested instance");
                return Ok(instance);
            }
            Requested::Types(types) => types,
            Requested::Any => Vec::new(),
        };

        let mut cause = None;
        for id in self.ordered(category) {
            let implementation = self.records[id].candidate.implementation_type();
            if !types.is_empty() && !types.contains(&implementation) {
                continue;
            }
            if let Some(instance) = self.accept(id, category, query, &hints, &mut cause) {
                return Ok(instance);
            }
        }

        if self.factories.is_some() {
            return self.resolve_dynamic(query, category, &hints, &types, cause, stack);
        }
        Err(RegistryError::NotFound {
            category,
            implementation: types.first().copied(),
            cause,
        })
    }

    pub(crate) fn resolve_all<T>(
        &mut self,
        query: &Query<'_, T>,
        stack: &mut CallStack,
    ) -> Result<Candidates<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        let category = self.served(Category::of::<T>())?;
        stack.enter(category)?;
        let result = self.ensure_scanned(category, stack);
        stack.leave(category);
        result?;

        let hints = self.effective_hints(query.hints);
        let types = match self.requested(query, &hints) {
            Requested::Instance(instance) => return Ok(Candidates::new(vec![instance])),
            Requested::Types(types) => types,
            Requested::Any => Vec::new(),
        };

        let mut cause = None;
        let accepted = self
            .ordered(category)
            .into_iter()
            .filter(|&id| {
                types.is_empty()
                    || types.contains(&self.records[id].candidate.implementation_type())
            })
            .filter_map(|id| self.accept(id, category, query, &hints, &mut cause))
            .collect();
        Ok(Candidates::new(accepted))
    }

    /// The instance stored at `id` as `Arc<T>`, if it passes every check.
    fn accept<T>(
        &self,
        id: NodeId,
        category: Category,
        query: &Query<'_, T>,
        hints: &HintSet,
        cause: &mut Option<SharedError>,
    ) -> Option<Arc<T>>
    where
        T: ?Sized + Candidate,
    {
        let record = &self.records[id];
        if record.disposed {
            return None;
        }
        let instance = record.bindings.get(&category)?.downcast::<T>()?;
        self.is_acceptable(category, record.candidate.as_ref(), &*instance, query, hints, cause)
            .then_some(instance)
    }

    /// Availability, then the query filter, then hint compatibility, then the
    /// acceptance hook. The last availability failure is kept in `cause`.
    pub(crate) fn is_acceptable<T>(
        &self,
        category: Category,
        candidate: &dyn Candidate,
        instance: &T,
        query: &Query<'_, T>,
        hints: &HintSet,
        cause: &mut Option<SharedError>,
    ) -> bool
    where
        T: ?Sized + Candidate,
    {
        if let Availability::Unavailable(report) = candidate.availability() {
            tracing::trace!(
                category = %category,
                candidate = %candidate.implementation_type(),
                reason = report.reason(),
                "candidate unavailable"
            );
            *cause = Some(Arc::new(report));
            return false;
        }
        if let Some(filter) = query.filter {
            if !filter(instance) {
                tracing::trace!(
                    category = %category,
                    candidate = %candidate.implementation_type(),
                    "candidate rejected by filter"
                );
                return false;
            }
        }
        if !has_compatible_hints(candidate, hints) {
            return false;
        }
        if let Some(acceptance) = &self.acceptance {
            if !acceptance(category, candidate, hints) {
                tracing::trace!(
                    category = %category,
                    candidate = %candidate.implementation_type(),
                    "candidate rejected by acceptance hook"
                );
                return false;
            }
        }
        true
    }
}
