//! Allocator selection and allocation accounting
//!
//! mimalloc is the global allocator unless the feature is disabled. With
//! `memory_tracking` the allocator is wrapped in a counter that records
//! live bytes and their high-water mark. Without it every reading is zero.

/// Live and peak heap bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub current: usize,
    pub peak: usize,
}

#[cfg(feature = "memory_tracking")]
mod counting {
    use super::Usage;
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[cfg(feature = "mimalloc")]
    type Inner = mimalloc::MiMalloc;
    #[cfg(feature = "mimalloc")]
    const INNER: Inner = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    type Inner = std::alloc::System;
    #[cfg(not(feature = "mimalloc"))]
    const INNER: Inner = std::alloc::System;

    pub struct Counting {
        inner: Inner,
        live: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Counting {
        pub const fn new() -> Self {
            Counting {
                inner: INNER,
                live: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        pub fn usage(&self) -> Usage {
            Usage {
                current: self.live.load(Ordering::SeqCst),
                peak: self.peak.load(Ordering::SeqCst),
            }
        }

        /// Restart the high-water mark at the live total
        pub fn reset_peak(&self) -> Usage {
            let current = self.live.load(Ordering::SeqCst);
            let peak = self.peak.swap(current, Ordering::SeqCst);
            Usage { current, peak }
        }

        fn grow(&self, bytes: usize) {
            let live = self.live.fetch_add(bytes, Ordering::Relaxed) + bytes;
            self.peak.fetch_max(live, Ordering::Relaxed);
        }

        fn shrink(&self, bytes: usize) {
            self.live.fetch_sub(bytes, Ordering::Relaxed);
        }
    }

    unsafe impl GlobalAlloc for Counting {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = self.inner.alloc(layout);
            if !ptr.is_null() {
                self.grow(layout.size());
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            self.shrink(layout.size());
            self.inner.dealloc(ptr, layout)
        }

        unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
            let moved = self.inner.realloc(ptr, layout, new_size);
            if !moved.is_null() {
                match new_size.checked_sub(layout.size()) {
                    Some(grown) => self.grow(grown),
                    None => self.shrink(layout.size() - new_size),
                }
            }
            moved
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static ALLOCATOR: counting::Counting = counting::Counting::new();

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Current and peak heap usage
#[cfg(feature = "memory_tracking")]
pub fn usage() -> Usage {
    ALLOCATOR.usage()
}

/// Set the peak to the current total, returning the readings before the reset
#[cfg(feature = "memory_tracking")]
pub fn reset_peak() -> Usage {
    ALLOCATOR.reset_peak()
}

#[cfg(not(feature = "memory_tracking"))]
pub fn usage() -> Usage {
    Usage::default()
}

#[cfg(not(feature = "memory_tracking"))]
pub fn reset_peak() -> Usage {
    Usage::default()
}
