//! Generic handle-indexed object store.
//!
//! `HandleMap<T>` owns a set of objects sharing a common base type `T`
//! (usually a trait object such as `dyn Entity`) and addresses them by
//! [`Handle`]. Callers keep the handle, never a reference, and redeem it
//! through the same map each time they need the object.
//!
//! Entries are keyed by raw handle in an ordered map, so only live objects
//! occupy storage and iteration follows handle order. Each entry records the
//! concrete type it was inserted as, so retrieval "as a subtype" is a tag
//! comparison followed by a downcast and yields `None` on mismatch.
//!
//! # Threading
//! A map is driven from a single owning thread. Mutation requires `&mut self`
//! and the registries built on top hold non-`Send` trait objects, so moving
//! one across threads is rejected at compile time.

use std::{
    any::{Any, TypeId},
    collections::BTreeMap,
    fmt,
};

use tracing::error;

use crate::{
    error::{EngineError, Result},
    handle::{Handle, HandleAllocator},
};

/// Access to the concrete value behind a base-type reference.
///
/// Implemented for every sized `'static` type. Base traits list it as a
/// supertrait so their trait objects can be inspected.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Compile-time "is-a" relation between a concrete type and a store's base
/// type.
///
/// Every type is a subtype of itself. Trait-object bases declare their
/// members with [`subtype!`](crate::subtype).
pub trait Subtype<Base: ?Sized>: Any {
    fn into_base(self: Box<Self>) -> Box<Base>;
}

impl<T: Any> Subtype<T> for T {
    fn into_base(self: Box<Self>) -> Box<T> {
        self
    }
}

/// Declares concrete types as subtypes of a trait-object base.
///
/// ```ignore
/// subtype!(dyn Entity => BaseEntity, ModelMesh);
/// ```
#[macro_export]
macro_rules! subtype {
    ($base:ty => $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::handle_map::Subtype<$base> for $ty {
                fn into_base(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<$base> {
                    self
                }
            }
        )+
    };
}

/// Runtime tag recorded for every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeTag {
    pub fn of<S: Any>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    fn of_val<T: ?Sized + AsAny>(value: &T) -> Self {
        Self {
            id: <T as AsAny>::as_any(value).type_id(),
            name: <T as AsAny>::type_name(value),
        }
    }

    pub fn is<S: Any>(&self) -> bool {
        self.id == TypeId::of::<S>()
    }
}

struct Entry<T: ?Sized> {
    value: Box<T>,
    tag: TypeTag,
}

/// Handle-indexed polymorphic store.
pub struct HandleMap<T: ?Sized> {
    alloc: HandleAllocator,
    entries: BTreeMap<u32, Entry<T>>,
}

impl<T: ?Sized> Default for HandleMap<T> {
    fn default() -> Self {
        Self {
            alloc: HandleAllocator::default(),
            entries: BTreeMap::new(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for HandleMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleMap")
            .field("live", &self.entries.len())
            .field("issued", &self.alloc.issued())
            .finish()
    }
}

impl<T: ?Sized + AsAny> HandleMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_allocator(alloc: HandleAllocator) -> Self {
        Self {
            alloc,
            entries: BTreeMap::new(),
        }
    }

    /// Stores `value` under a fresh handle.
    pub fn try_add(&mut self, value: Box<T>) -> Result<Handle> {
        let tag = TypeTag::of_val(&*value);
        let handle = self.alloc.allocate().ok_or(EngineError::HandleSpaceExhausted)?;
        self.entries.insert(handle.to_raw(), Entry { value, tag });
        Ok(handle)
    }

    /// Stores `value` under a fresh handle.
    ///
    /// Only fails once every representable handle has been issued, in which
    /// case nothing is stored and [`Handle::INVALID`] is returned.
    pub fn add(&mut self, value: Box<T>) -> Handle {
        match self.try_add(value) {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "HandleMap add failed");
                Handle::INVALID
            }
        }
    }

    /// Stores a concrete subtype, keeping its dynamic type for
    /// [`get_specific`](Self::get_specific).
    pub fn add_specific<S: Subtype<T>>(&mut self, value: S) -> Handle {
        self.add(<S as Subtype<T>>::into_base(Box::new(value)))
    }

    /// Whether `handle` refers to a live entry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entry(handle).is_some()
    }

    /// Looks up `handle`. Never-issued, removed and invalid handles all
    /// yield `None`; a miss never creates an entry.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entry(handle).map(|e| &*e.value)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entry_mut(handle).map(|e| &mut *e.value)
    }

    /// Looks up `handle` as the concrete type `S`. `None` when the entry is
    /// missing or was stored as a different type.
    pub fn get_specific<S: Subtype<T>>(&self, handle: Handle) -> Option<&S> {
        let entry = self.entry(handle)?;
        if !entry.tag.is::<S>() {
            return None;
        }
        <T as AsAny>::as_any(&*entry.value).downcast_ref::<S>()
    }

    pub fn get_specific_mut<S: Subtype<T>>(&mut self, handle: Handle) -> Option<&mut S> {
        let entry = self.entry_mut(handle)?;
        if !entry.tag.is::<S>() {
            return None;
        }
        <T as AsAny>::as_any_mut(&mut *entry.value).downcast_mut::<S>()
    }

    /// Runtime tag of the entry behind `handle`.
    pub fn tag_of(&self, handle: Handle) -> Option<TypeTag> {
        self.entry(handle).map(|e| e.tag)
    }

    /// Removes and returns the object. The handle is dead afterwards and is
    /// never issued again.
    pub fn remove(&mut self, handle: Handle) -> Option<Box<T>> {
        self.entries.remove(&handle.to_raw()).map(|e| e.value)
    }

    /// Drops every entry. Issued handles stay retired.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of live handles.
    ///
    /// Visiting through a snapshot lets the visitor mutate the map (or call
    /// into code that does) between objects.
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.entries
            .iter()
            .map(|(&raw, e)| (Handle::from_raw(raw), &*e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> + '_ {
        self.entries
            .iter_mut()
            .map(|(&raw, e)| (Handle::from_raw(raw), &mut *e.value))
    }

    /// Visits every live object once. Order is unspecified.
    pub fn for_each(&self, mut visit: impl FnMut(&T)) {
        self.iter().for_each(|(_, v)| visit(v));
    }

    pub fn for_each_mut(&mut self, mut visit: impl FnMut(&mut T)) {
        self.iter_mut().for_each(|(_, v)| visit(v));
    }

    /// Like [`for_each`](Self::for_each) but also passes the handle.
    pub fn for_each_with_handle(&self, mut visit: impl FnMut(Handle, &T)) {
        self.iter().for_each(|(h, v)| visit(h, v));
    }

    pub fn for_each_with_handle_mut(&mut self, mut visit: impl FnMut(Handle, &mut T)) {
        self.iter_mut().for_each(|(h, v)| visit(h, v));
    }

    /// Visits only entries stored as `S`, skipping the rest.
    pub fn for_each_specific<S: Subtype<T>>(&self, mut visit: impl FnMut(Handle, &S)) {
        for (&raw, entry) in self.entries.iter().filter(|(_, e)| e.tag.is::<S>()) {
            if let Some(value) = <T as AsAny>::as_any(&*entry.value).downcast_ref::<S>() {
                visit(Handle::from_raw(raw), value);
            }
        }
    }

    pub fn for_each_specific_mut<S: Subtype<T>>(&mut self, mut visit: impl FnMut(Handle, &mut S)) {
        for (&raw, entry) in self.entries.iter_mut().filter(|(_, e)| e.tag.is::<S>()) {
            if let Some(value) = <T as AsAny>::as_any_mut(&mut *entry.value).downcast_mut::<S>() {
                visit(Handle::from_raw(raw), value);
            }
        }
    }

    fn entry(&self, handle: Handle) -> Option<&Entry<T>> {
        if !handle.is_valid() {
            return None;
        }
        self.entries.get(&handle.to_raw())
    }

    fn entry_mut(&mut self, handle: Handle) -> Option<&mut Entry<T>> {
        if !handle.is_valid() {
            return None;
        }
        self.entries.get_mut(&handle.to_raw())
    }
}

impl<T: Any> HandleMap<T> {
    /// Stores a value of a sized element type.
    pub fn insert(&mut self, value: T) -> Handle {
        self.add(Box::new(value))
    }
}
