//! Lazy, incremental discovery.

use super::Registry;
use crate::resolver::{CallStack, Resolver};
use hintreg_core::{BoxError, Category, RegistryError, Service};

impl Registry {
    /// Scan `category` if it was never scanned, or merge sources added since.
    pub(crate) fn ensure_scanned(
        &mut self,
        category: Category,
        stack: &mut CallStack,
    ) -> Result<(), RegistryError> {
        let generation = self.providers.generation();
        let Some(pool) = self.pools.get_mut(&category) else {
            return Err(RegistryError::UnknownCategory(category));
        };
        let first = !pool.scanned;
        if !first && pool.generation == generation {
            return Ok(());
        }

        stack.begin_scan(category)?;
        let result = self.scan(category, first, stack);
        stack.end_scan(category);
        result?;

        // Only a completed scan counts; an aborted one is retried in full.
        if let Some(pool) = self.pools.get_mut(&category) {
            pool.scanned = true;
            pool.generation = generation;
        }
        Ok(())
    }

    fn scan(
        &mut self,
        category: Category,
        declarations: bool,
        stack: &mut CallStack,
    ) -> Result<(), RegistryError> {
        let mut registered = 0;

        if declarations {
            tracing::debug!(category = %category, "scanning category");
            let declared: Vec<_> = self
                .declarations
                .iter()
                .filter(|declared| declared.category == category)
                .map(|declared| declared.build.clone())
                .collect();
            for build in declared {
                let built = build(&mut Resolver::new(self, stack));
                registered += self.merge(category, "declaration", built.map(|s| vec![s]))?;
            }

            #[cfg(feature = "inventory")]
            if self.include_declared {
                for declaration in crate::discovery::declarations_for(category) {
                    let built = (declaration.build)(&mut Resolver::new(self, stack));
                    registered += self.merge(category, declaration.name, built.map(|s| vec![s]))?;
                }
            }
        }

        for (id, source) in self.providers.snapshot() {
            let Some(pool) = self.pools.get_mut(&category) else {
                return Err(RegistryError::UnknownCategory(category));
            };
            if !pool.consumed.insert(id) {
                continue;
            }
            let found = source.discover(category, &mut Resolver::new(self, stack));
            match self.merge(category, source.name(), found) {
                Ok(count) => registered += count,
                Err(err) => {
                    if let Some(pool) = self.pools.get_mut(&category) {
                        pool.consumed.remove(&id);
                    }
                    return Err(err);
                }
            }
        }

        tracing::debug!(category = %category, registered, "scan finished");
        Ok(())
    }

    /// Register what a declaration or source produced.
    ///
    /// A recursive lookup aborts the scan; any other failure is logged and the
    /// origin skipped.
    fn merge(
        &mut self,
        category: Category,
        origin: &str,
        found: Result<Vec<Service>, BoxError>,
    ) -> Result<usize, RegistryError> {
        let services = match found {
            Ok(services) => services,
            Err(err) => match RegistryError::recursive_from(err) {
                Ok(recursive) => return Err(recursive),
                Err(err) => {
                    tracing::warn!(
                        category = %category,
                        origin,
                        error = %err,
                        "discovery failed, skipping"
                    );
                    return Ok(0);
                }
            },
        };
        let mut registered = 0;
        for service in services {
            if service.category() != category {
                tracing::trace!(
                    category = %category,
                    origin,
                    service = ?service,
                    "ignoring service of another category"
                );
                continue;
            }
            if self.register_service(service)? {
                registered += 1;
            }
        }
        Ok(registered)
    }
}
