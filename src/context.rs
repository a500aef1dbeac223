use alloc::{collections::BTreeMap, sync::Arc};
use core::any::TypeId;

use crate::any::RcAny;

/// Values passed alongside a resolution, consulted before provider lookup.
#[derive(Clone)]
pub struct Context {
    map: BTreeMap<TypeId, RcAny>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<Arc<T>> {
        self.map
            .insert(TypeId::of::<T>(), Arc::new(value))
            .and_then(|old| old.downcast().ok())
    }

    #[inline]
    pub(crate) fn insert_raw(&mut self, id: TypeId, value: RcAny) -> Option<RcAny> {
        self.map.insert(id, value)
    }

    #[inline]
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.map.get(&TypeId::of::<T>()).cloned().and_then(|value| value.downcast().ok())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
