//! Single-slot observation hooks.
//!
//! Each operation kind has at most one hook. Setting a hook replaces the
//! previous one. Hooks run synchronously after the operation completes,
//! on the caller's task, and see the operation's key or result.

use std::sync::{Arc, RwLock};

use crate::error::CellarResult;
use crate::types::{DataContainer, ImportOutcome};

pub(crate) type SetItemHook<T> = Arc<dyn Fn(&str, &CellarResult<DataContainer<T>>) + Send + Sync>;
pub(crate) type GetItemHook<T> = Arc<dyn Fn(&str, Option<&DataContainer<T>>) + Send + Sync>;
pub(crate) type GetItemsHook<T> = Arc<dyn Fn(&[DataContainer<T>]) + Send + Sync>;
pub(crate) type KeyHook = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type ClearHook = Arc<dyn Fn() + Send + Sync>;
pub(crate) type ImportHook = Arc<dyn Fn(&ImportOutcome) + Send + Sync>;
pub(crate) type ExportHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Operation kinds that accept a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    SetItem,
    GetItem,
    GetItems,
    RemoveItem,
    Clear,
    ImportJson,
    ExportJson,
}

pub(crate) struct Slot<H> {
    inner: RwLock<Option<H>>,
}

impl<H: Clone> Slot<H> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub(crate) fn set(&self, hook: Option<H>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = hook;
    }

    /// Current hook. Cloned out so the lock is released before it runs,
    /// which lets a hook replace itself.
    pub(crate) fn get(&self) -> Option<H> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

pub(crate) struct StoreHooks<T> {
    pub(crate) set_item: Slot<SetItemHook<T>>,
    pub(crate) get_item: Slot<GetItemHook<T>>,
    pub(crate) get_items: Slot<GetItemsHook<T>>,
    pub(crate) remove_item: Slot<KeyHook>,
    pub(crate) clear: Slot<ClearHook>,
    pub(crate) import_json: Slot<ImportHook>,
    pub(crate) export_json: Slot<ExportHook>,
}

impl<T> StoreHooks<T> {
    pub(crate) fn new() -> Self {
        Self {
            set_item: Slot::new(),
            get_item: Slot::new(),
            get_items: Slot::new(),
            remove_item: Slot::new(),
            clear: Slot::new(),
            import_json: Slot::new(),
            export_json: Slot::new(),
        }
    }

    pub(crate) fn remove(&self, kind: HookKind) {
        match kind {
            HookKind::SetItem => self.set_item.set(None),
            HookKind::GetItem => self.get_item.set(None),
            HookKind::GetItems => self.get_items.set(None),
            HookKind::RemoveItem => self.remove_item.set(None),
            HookKind::Clear => self.clear.set(None),
            HookKind::ImportJson => self.import_json.set(None),
            HookKind::ExportJson => self.export_json.set(None),
        }
    }

    pub(crate) fn is_set(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::SetItem => self.set_item.is_set(),
            HookKind::GetItem => self.get_item.is_set(),
            HookKind::GetItems => self.get_items.is_set(),
            HookKind::RemoveItem => self.remove_item.is_set(),
            HookKind::Clear => self.clear.is_set(),
            HookKind::ImportJson => self.import_json.is_set(),
            HookKind::ExportJson => self.export_json.is_set(),
        }
    }
}
