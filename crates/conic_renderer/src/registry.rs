//! Per-type static bindings.
//!
//! Every drawable of one [`Shape`] type shares its geometry, shaders, input
//! layout, topology and material.  The first instance of a type builds them
//! through a [`StaticInit`] and commits them here; every later instance
//! clones the `Arc`s.  Entries are keyed by the shape's `TypeId`, so two
//! shape types never see each other's bindings.
//!
//! ```
//! use conic_renderer::backend::RecordingContext;
//! use conic_renderer::registry::StaticRegistry;
//! use conic_renderer::shapes::Pyramid;
//!
//! let registry = StaticRegistry::new();
//! assert!(!registry.is_initialized::<Pyramid>());
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bind::{Bindable, IndexBuffer};
use crate::drawable::Shape;
use crate::error::GraphicsError;

/// Ordered static bindings of one shape type, pipeline state first.
pub type BindingList = Arc<[Arc<dyn Bindable>]>;

struct Entry {
    bindings: BindingList,
    index_buffer: Arc<IndexBuffer>,
}

#[derive(Default)]
pub struct StaticRegistry {
    entries: HashMap<TypeId, Entry>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized<S: Shape>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<S>())
    }

    /// Opens the static set of `S` for construction.
    ///
    /// Fails with `DuplicateStaticInit` when `S` already has one; nothing is
    /// created in that case.
    pub fn begin<S: Shape>(&mut self) -> Result<StaticInit<'_>, GraphicsError> {
        if self.is_initialized::<S>() {
            return Err(GraphicsError::DuplicateStaticInit { shape: S::NAME });
        }
        Ok(StaticInit {
            registry: self,
            type_id: TypeId::of::<S>(),
            shape: S::NAME,
            bindings: Vec::new(),
            index_buffer: None,
        })
    }

    pub fn static_bindings<S: Shape>(&self) -> Option<BindingList> {
        self.entries
            .get(&TypeId::of::<S>())
            .map(|e| Arc::clone(&e.bindings))
    }

    pub fn index_buffer<S: Shape>(&self) -> Option<Arc<IndexBuffer>> {
        self.entries
            .get(&TypeId::of::<S>())
            .map(|e| Arc::clone(&e.index_buffer))
    }

    /// Number of shape types with a committed static set.
    pub fn shape_count(&self) -> usize {
        self.entries.len()
    }

    /// Drops every cached set.  Drawables still holding `Arc`s keep their
    /// bindings alive until they are dropped themselves.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticRegistry")
            .field("shapes", &self.entries.len())
            .finish()
    }
}

/// A static set under construction.
///
/// Nothing reaches the registry until [`commit`](Self::commit); dropping
/// the builder leaves the type uninitialised.
pub struct StaticInit<'r> {
    registry: &'r mut StaticRegistry,
    type_id: TypeId,
    shape: &'static str,
    bindings: Vec<Arc<dyn Bindable>>,
    index_buffer: Option<IndexBuffer>,
}

impl StaticInit<'_> {
    pub fn add_static_binding(&mut self, binding: Arc<dyn Bindable>) {
        self.bindings.push(binding);
    }

    /// Sets the shared index buffer.  A type has exactly one.
    pub fn add_static_index_buffer(&mut self, index_buffer: IndexBuffer) -> Result<(), GraphicsError> {
        if self.index_buffer.is_some() {
            return Err(GraphicsError::DuplicateStaticInit { shape: self.shape });
        }
        self.index_buffer = Some(index_buffer);
        Ok(())
    }

    /// Orders pipeline-state bindings before data bindings (stable) and
    /// seals the set.
    pub fn commit(self) -> Result<(), GraphicsError> {
        let index_buffer = self.index_buffer.ok_or_else(|| {
            GraphicsError::invalid(format!("static set of `{}` has no index buffer", self.shape))
        })?;
        let mut bindings = self.bindings;
        bindings.sort_by_key(|b| !b.kind().is_pipeline_state());

        log::debug!(
            "static bindings for `{}` committed: {} bindings, {} indices",
            self.shape,
            bindings.len(),
            index_buffer.count()
        );
        self.registry.entries.insert(
            self.type_id,
            Entry {
                bindings: bindings.into(),
                index_buffer: Arc::new(index_buffer),
            },
        );
        Ok(())
    }
}
