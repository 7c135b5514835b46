// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SchemaId -> Layout resolution.

use super::{Layout, LayoutCompiler};
use crate::error::{RowResult, SchemaError};
use crate::schema::{Namespace, SchemaId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves the layout of a UDT when a scope of that type is entered or created.
pub trait LayoutResolver: Send + Sync {
    fn resolve(&self, schema_id: SchemaId) -> RowResult<Arc<Layout>>;
}

/// Resolver backed by a [`Namespace`], compiling each layout once.
///
/// Compiled layouts are cached behind a read-mostly lock, so one resolver
/// can be shared by every row of the namespace.
pub struct NamespaceResolver {
    namespace: Arc<Namespace>,
    cache: RwLock<HashMap<SchemaId, Arc<Layout>>>,
}

impl NamespaceResolver {
    pub fn new(namespace: Arc<Namespace>) -> Self {
        Self {
            namespace,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    /// Number of layouts compiled so far.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

impl LayoutResolver for NamespaceResolver {
    fn resolve(&self, schema_id: SchemaId) -> RowResult<Arc<Layout>> {
        if let Some(layout) = self.cache.read().get(&schema_id) {
            return Ok(Arc::clone(layout));
        }

        let schema = self
            .namespace
            .find_by_id(schema_id)
            .ok_or(SchemaError::UnresolvedSchema(schema_id))?;
        log::debug!(
            "[layout] cache miss for schema {} ('{}'), compiling",
            schema_id,
            schema.name
        );
        let layout = Arc::new(LayoutCompiler::compile(&self.namespace, schema)?);

        // Another thread may have compiled it meanwhile; keep the first.
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(schema_id).or_insert(layout)))
    }
}

impl std::fmt::Debug for NamespaceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceResolver")
            .field("namespace", &self.namespace.name)
            .field("cached", &self.cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultKind;
    use crate::schema::{PropertyType, SchemaBuilder, TypeKind};

    fn resolver() -> NamespaceResolver {
        let mut ns = Namespace::new("ns");
        ns.add(
            SchemaBuilder::new("A", SchemaId::new(1))
                .property("x", PropertyType::primitive(TypeKind::Int8))
                .build(),
        )
        .expect("add");
        NamespaceResolver::new(Arc::new(ns))
    }

    #[test]
    fn test_resolve_caches_layout() {
        let resolver = resolver();
        let first = resolver.resolve(SchemaId::new(1)).expect("resolve");
        let second = resolver.resolve(SchemaId::new(1)).expect("resolve");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_unknown_schema_is_schema_mismatch() {
        let err = resolver().resolve(SchemaId::new(2)).unwrap_err();
        assert_eq!(err.kind(), ResultKind::SchemaMismatch);
    }

    #[test]
    fn test_shared_across_threads() {
        let resolver = Arc::new(resolver());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || resolver.resolve(SchemaId::new(1)).is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("thread"));
        }
        assert_eq!(resolver.cached(), 1);
    }
}
