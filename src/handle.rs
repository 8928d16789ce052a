//! Opaque native handles.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Next handle value. Starts at 1 so that 0 stays the null sentinel.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for native-side decoder state.
///
/// [`NativeHandle::NULL`] signals a failed creation and marks a released
/// session. Values handed out by [`NativeHandle::allocate`] are unique for
/// the lifetime of the process, so a released handle value never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// The null sentinel.
    pub const NULL: NativeHandle = NativeHandle(0);

    /// Allocate a fresh, never-before-seen handle value.
    ///
    /// Backends call this when they register new native state.
    pub fn allocate() -> Self {
        NativeHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns `true` for the null sentinel.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The raw integer value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Display for NativeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_null() {
            write!(f, "handle(null)")
        } else {
            write!(f, "handle({:#x})", self.0)
        }
    }
}
