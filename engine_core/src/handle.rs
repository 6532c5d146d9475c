//! Opaque object handles.
//!
//! A handle is a plain 32-bit integer and nothing else. It carries no type
//! information and no pointer, which is what lets it cross into the managed
//! runtime and come back unchanged. A handle only means something together
//! with the store that issued it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque store-local object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Reserved value that never refers to a live object.
    pub const INVALID: Self = Self(u32::MAX);

    /// Wraps a raw value received from across the boundary.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The boundary representation.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

/// Per-store handle counter.
///
/// Issues strictly increasing values starting at 1. Values are never handed
/// out twice, so a handle whose object was removed stays dead forever.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    next: u32,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl HandleAllocator {
    /// Returns the next handle, or `None` once the space is used up.
    pub fn allocate(&mut self) -> Option<Handle> {
        if self.next == u32::MAX {
            return None;
        }
        let handle = Handle(self.next);
        self.next += 1;
        Some(handle)
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u32 {
        self.next - 1
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next: u32) -> Self {
        Self { next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_is_all_bits_set() {
        assert_eq!(Handle::INVALID.to_raw(), 0xFFFF_FFFF);
        assert!(!Handle::INVALID.is_valid());
        assert_eq!(Handle::default(), Handle::INVALID);
    }

    #[test]
    fn allocator_starts_above_zero_and_increases() {
        let mut alloc = HandleAllocator::default();
        let a = alloc.allocate().unwrap();
        let b = alloc.allocate().unwrap();
        assert_eq!(a.to_raw(), 1);
        assert!(b > a);
        assert_eq!(alloc.issued(), 2);
    }

    #[test]
    fn allocator_never_issues_sentinel() {
        let mut alloc = HandleAllocator::starting_at(u32::MAX - 1);
        assert_eq!(alloc.allocate(), Some(Handle::from_raw(u32::MAX - 1)));
        assert_eq!(alloc.allocate(), None);
        assert_eq!(alloc.allocate(), None);
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&Handle::from_raw(7)).unwrap();
        assert_eq!(json, "7");
    }
}
