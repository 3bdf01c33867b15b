//! Temporary byte buffers for decoding
//!
//! Small requests use a stack array. Mid-sized ones borrow a per-thread heap
//! buffer that is kept between calls, and anything above
//! [`MAX_RETAINED_SCRATCH`] gets its own allocation that is freed on return.

use core::cell::RefCell;

/// Requests up to this size never touch the heap
pub const STACK_SCRATCH_LEN: usize = 256;

/// Largest buffer a thread keeps between calls
pub const MAX_RETAINED_SCRATCH: usize = 64 * 1024;

thread_local! {
    static HEAP_SCRATCH: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

/// Run `f` with a zeroed buffer of exactly `len` bytes
///
/// The buffer is freed (or returned to the thread cache, up to
/// [`MAX_RETAINED_SCRATCH`]) when `f` returns. Nested calls on one thread fall back to a fresh allocation.
pub fn with_scratch<R>(len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
    if len <= STACK_SCRATCH_LEN {
        let mut buf = [0u8; STACK_SCRATCH_LEN];
        return f(&mut buf[..len]);
    }
    if len > MAX_RETAINED_SCRATCH {
        return f(vec![0u8; len].as_mut_slice());
    }

    HEAP_SCRATCH.with(|cell| match cell.try_borrow_mut() {
        Ok(mut cached) => {
            cached.clear();
            cached.resize(len, 0);
            f(cached.as_mut_slice())
        }
        Err(_) => f(vec![0u8; len].as_mut_slice()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_length() {
        for len in [0, 1, STACK_SCRATCH_LEN, STACK_SCRATCH_LEN + 1, 4096] {
            with_scratch(len, |buf| {
                assert_eq!(buf.len(), len);
                assert!(buf.iter().all(|&b| b == 0));
            });
        }
    }

    #[test]
    fn test_heap_buffer_is_zeroed_on_reuse() {
        with_scratch(1024, |buf| buf.fill(0xAA));
        with_scratch(1024, |buf| assert!(buf.iter().all(|&b| b == 0)));
    }

    fn retained() -> usize { HEAP_SCRATCH.with(|cell| cell.borrow().capacity()) }

    #[test]
    fn test_large_request_is_not_retained() {
        with_scratch(MAX_RETAINED_SCRATCH, |buf| buf[0] = 1);
        let kept = retained();
        assert!(kept >= MAX_RETAINED_SCRATCH);

        with_scratch(16 * 1024 * 1024, |buf| {
            assert_eq!(buf.len(), 16 * 1024 * 1024);
            buf[buf.len() - 1] = 1;
        });
        assert_eq!(retained(), kept);

        with_scratch(STACK_SCRATCH_LEN + 1, |buf| assert!(buf.iter().all(|&b| b == 0)));
        assert!(retained() <= kept);
    }

    #[test]
    fn test_nested_heap_requests() {
        let total = with_scratch(1000, |outer| {
            outer[0] = 1;
            with_scratch(2000, |inner| {
                inner[0] = 2;
                outer[0] as usize + inner[0] as usize + inner.len()
            })
        });
        assert_eq!(total, 2003);
    }
}
