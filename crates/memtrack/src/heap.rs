use std::ptr::NonNull;

/// The allocation primitive a registry wraps.
///
/// The registry never reads or writes the memory it hands out, it only needs
/// a way to get a block of `size` bytes and a way to give it back. Releasing
/// takes no size so that memory the registry has no record of can still be
/// returned to the heap.
pub trait HeapSource {
    /// Obtain `size` bytes, or `None` if the heap is exhausted. `size` is never 0.
    fn obtain(&self, size: usize) -> Option<NonNull<u8>>;

    /// Give memory back to the heap.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`HeapSource::obtain`] on this source and must
    /// not have been released already.
    unsafe fn release(&self, ptr: NonNull<u8>);
}

/// `malloc`/`free` from the platform C library.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcHeap;

impl HeapSource for LibcHeap {
    #[inline]
    fn obtain(&self, size: usize) -> Option<NonNull<u8>> {
        // SAFETY: malloc has no preconditions; a null return is mapped to None.
        NonNull::new(unsafe { libc::malloc(size) } as *mut u8)
    }

    #[inline]
    unsafe fn release(&self, ptr: NonNull<u8>) {
        // SAFETY: the caller guarantees `ptr` came from malloc and is still live.
        unsafe { libc::free(ptr.as_ptr() as *mut libc::c_void) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_libc_heap_roundtrip() {
        let heap = LibcHeap;
        let ptr = heap.obtain(64).expect("malloc(64) failed");

        unsafe {
            ptr.as_ptr().write_bytes(0xab, 64);
            assert_eq!(*ptr.as_ptr().add(63), 0xab);
            heap.release(ptr);
        }
    }
}
