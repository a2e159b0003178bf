use std::fmt;
use std::ops::Deref;

/// Width of one cache line on x86-64 and AArch64.
pub const CACHE_LINE: usize = 64;

/// Keeps `T` on its own cache line(s).
///
/// Aligned to two lines rather than one so that the adjacent-line
/// prefetcher does not pull a neighbour into the same pair.
#[repr(C, align(128))]
#[derive(Default)]
pub struct CachePadded<T> { value: T }

impl<T> CachePadded<T> {
    pub const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;
    fn deref(&self) -> &T { &self.value }
}

impl<T: fmt::Debug> fmt::Debug for CachePadded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{align_of, size_of};
    use std::sync::atomic::AtomicBool;

    use super::*;

    #[test]
    fn padded_values_fill_whole_lines() {
        assert!(align_of::<CachePadded<AtomicBool>>() >= CACHE_LINE);
        assert_eq!(size_of::<CachePadded<AtomicBool>>() % CACHE_LINE, 0);
        assert_eq!(size_of::<CachePadded<[u8; 129]>>(), 256);
    }
}
