//! Reference-counted immutable string handed out by the pool
//!
//! # Memory Layout
//!
//! ```text
//! ┌────────────────────┬────────────────┬──────────────────────┐
//! │ count: AtomicUsize │ len: usize     │ string data...       │
//! └────────────────────┴────────────────┴──────────────────────┘
//! ```
//!
//! One allocation per value. The pool keeps one strong reference in a bucket
//! slot, every caller that received the value shares the same block. Eviction
//! from a bucket only drops the bucket's reference; the block is freed when
//! the last holder goes away.
//!
//! | Operation | Time Complexity | Description |
//! |-----------|-----------------|-------------|
//! | new() | O(n) | Heap allocation + copy |
//! | clone() | O(1) | Only atomic increment |
//! | drop() | O(1) | Atomic decrement, dealloc on last reference |
//! | matches() | O(1) reject / O(n) hit | Length, identity, then bytes |

use core::{
    alloc::Layout,
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ptr::NonNull,
    str,
    sync::atomic::{
        self, AtomicUsize,
        Ordering::{Acquire, Relaxed, Release},
    },
};
use std::sync::LazyLock;

// ═══════════════════════════════════════════════════════════════════════════
//                          Handle
// ═══════════════════════════════════════════════════════════════════════════

/// Immutable shared text value
///
/// `PooledStr::new` always allocates: deduplication happens in
/// [`Pool`](crate::Pool), not here. Two values compare equal when their
/// content is equal; use [`PooledStr::ptr_eq`] to ask whether they share one
/// allocation.
///
/// ```rust
/// use interned::{Pool, PooledStr};
///
/// let pool = Pool::new();
/// let a = pool.get_or_add("hello");
/// let b = pool.get_or_add("hello");
/// assert!(PooledStr::ptr_eq(&a, &b));
///
/// let c = PooledStr::new("hello");
/// assert_eq!(a, c);
/// assert!(!PooledStr::ptr_eq(&a, &c));
/// ```
#[repr(transparent)]
pub struct PooledStr {
    /// Non-null pointer to `PooledStrInner`
    ///
    /// # Invariants
    /// - Pointer is always valid, points to correctly initialized `PooledStrInner`
    /// - Reference count is at least 1 (before drop starts)
    /// - String data is always valid UTF-8 and never written after allocation
    ptr: NonNull<PooledStrInner>,

    _marker: PhantomData<PooledStrInner>,
}

// SAFETY: PooledStr uses atomic reference counting and its content is never mutated
unsafe impl Send for PooledStr {}
unsafe impl Sync for PooledStr {}

static EMPTY: LazyLock<PooledStr> = LazyLock::new(|| PooledStr::new(""));

impl PooledStr {
    /// Allocate a fresh value holding a copy of `s`
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let string = s.as_ref();
        let layout = PooledStrInner::layout_for_string(string.len());

        // SAFETY: the header makes the layout non-zero sized, and the block is
        // fully initialized before a `PooledStr` is built around it
        let ptr = unsafe {
            let alloc: *mut PooledStrInner = std::alloc::alloc(layout).cast();
            let Some(ptr) = NonNull::new(alloc) else {
                std::alloc::handle_alloc_error(layout)
            };
            PooledStrInner::write_with_string(ptr, string);
            ptr
        };

        Self { ptr, _marker: PhantomData }
    }

    /// The canonical empty value
    ///
    /// Every call returns the same allocation.
    #[inline]
    pub fn empty() -> Self { EMPTY.clone() }

    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: ptr always points to valid PooledStrInner holding UTF-8 data
        unsafe { self.ptr.as_ref().as_str() }
    }

    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: ptr always points to valid PooledStrInner
        unsafe { self.ptr.as_ref().as_bytes() }
    }

    /// Length in bytes
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        // SAFETY: ptr always points to valid PooledStrInner
        unsafe { self.ptr.as_ref().string_len }
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Current reference count
    ///
    /// Other threads may change it right after the read; meant for tests and
    /// diagnostics.
    #[must_use]
    #[inline]
    pub fn ref_count(&self) -> usize {
        // SAFETY: ptr always points to valid PooledStrInner
        unsafe { self.ptr.as_ref().strong_count() }
    }

    /// Address of the string data
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        // SAFETY: ptr always points to valid PooledStrInner
        unsafe { self.ptr.as_ref().string_ptr() }
    }

    /// Whether both values share one allocation
    #[must_use]
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool { this.ptr == other.ptr }

    /// Content comparison used by bucket scans
    ///
    /// Length is compared first, then identity (a value handed back to the
    /// pool points at its own data), then bytes.
    #[must_use]
    #[inline]
    pub fn matches(&self, content: &str) -> bool {
        self.len() == content.len()
            && (self.as_ptr() == content.as_ptr() || self.as_bytes() == content.as_bytes())
    }
}

impl Clone for PooledStr {
    #[inline]
    fn clone(&self) -> Self {
        // SAFETY: ptr is valid during current PooledStr's lifetime
        unsafe { self.ptr.as_ref().inc_strong() }
        Self { ptr: self.ptr, _marker: PhantomData }
    }
}

impl Drop for PooledStr {
    fn drop(&mut self) {
        // SAFETY: ptr is still valid when drop starts; after the count hits zero
        // no other reference exists, so the block can be released
        unsafe {
            let inner = self.ptr.as_ref();
            if !inner.dec_strong() {
                return;
            }

            // Synchronizes with the Release decrements of other holders
            atomic::fence(Acquire);

            let layout = PooledStrInner::layout_for_string_unchecked(inner.string_len);
            std::alloc::dealloc(self.ptr.cast().as_ptr(), layout);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//                          Trait Interop
// ═══════════════════════════════════════════════════════════════════════════

impl PartialEq for PooledStr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PooledStr {}

impl PartialOrd for PooledStr {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for PooledStr {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering { self.as_str().cmp(other.as_str()) }
}

impl Hash for PooledStr {
    /// Same hash as the equivalent `&str`, required by `Borrow<str>`
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) { self.as_str().hash(state) }
}

impl fmt::Display for PooledStr {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::Display::fmt(self.as_str(), f) }
}

impl fmt::Debug for PooledStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self.as_str(), f) }
}

impl Default for PooledStr {
    #[inline]
    fn default() -> Self { Self::empty() }
}

impl AsRef<str> for PooledStr {
    #[inline]
    fn as_ref(&self) -> &str { self.as_str() }
}

impl AsRef<[u8]> for PooledStr {
    #[inline]
    fn as_ref(&self) -> &[u8] { self.as_bytes() }
}

impl Borrow<str> for PooledStr {
    #[inline]
    fn borrow(&self) -> &str { self.as_str() }
}

impl core::ops::Deref for PooledStr {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target { self.as_str() }
}

impl PartialEq<str> for PooledStr {
    #[inline]
    fn eq(&self, other: &str) -> bool { self.as_str() == other }
}

impl PartialEq<&str> for PooledStr {
    #[inline]
    fn eq(&self, other: &&str) -> bool { self.as_str() == *other }
}

impl PartialEq<PooledStr> for str {
    #[inline]
    fn eq(&self, other: &PooledStr) -> bool { self == other.as_str() }
}

impl PartialEq<PooledStr> for &str {
    #[inline]
    fn eq(&self, other: &PooledStr) -> bool { *self == other.as_str() }
}

impl PartialEq<String> for PooledStr {
    #[inline]
    fn eq(&self, other: &String) -> bool { self.as_str() == other.as_str() }
}

impl PartialEq<PooledStr> for String {
    #[inline]
    fn eq(&self, other: &PooledStr) -> bool { self.as_str() == other.as_str() }
}

impl<'a> From<&'a str> for PooledStr {
    #[inline]
    fn from(s: &'a str) -> Self { Self::new(s) }
}

impl From<String> for PooledStr {
    #[inline]
    fn from(s: String) -> Self { Self::new(s) }
}

impl<'a> From<std::borrow::Cow<'a, str>> for PooledStr {
    #[inline]
    fn from(cow: std::borrow::Cow<'a, str>) -> Self { Self::new(cow) }
}

impl From<Box<str>> for PooledStr {
    #[inline]
    fn from(s: Box<str>) -> Self { Self::new(s) }
}

impl From<PooledStr> for String {
    #[inline]
    fn from(s: PooledStr) -> Self { s.as_str().to_owned() }
}

impl str::FromStr for PooledStr {
    type Err = core::convert::Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self::new(s)) }
}

/// # Serde Serialization Support
///
/// Serializes the string content; deserialization goes through the shared
/// pool so repeated values in a document share one allocation.
#[cfg(feature = "serde")]
mod serde_impls {
    use super::PooledStr;
    use serde_core::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for PooledStr {
        #[inline]
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            self.as_str().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for PooledStr {
        #[inline]
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
            String::deserialize(deserializer).map(|s| crate::Pool::shared().get_or_add(&s))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//                          Allocation
// ═══════════════════════════════════════════════════════════════════════════

/// Header of the allocation, string data follows immediately after
#[repr(C)]
struct PooledStrInner {
    /// Count range: [1, `isize::MAX`], aborts when exceeded
    count: AtomicUsize,

    /// Byte length of the string data
    string_len: usize,
}

impl PooledStrInner {
    /// Keeps the total allocation size inside the signed range
    const MAX_LEN: usize = isize::MAX as usize - core::mem::size_of::<Self>();

    /// # Safety
    ///
    /// `self` must be the header of a block allocated by `layout_for_string`
    #[must_use]
    #[inline]
    const unsafe fn string_ptr(&self) -> *const u8 {
        // SAFETY: repr(C) guarantees string data starts right after the header
        unsafe { core::ptr::from_ref(self).add(1).cast() }
    }

    /// # Safety
    ///
    /// String data must have been initialized with `string_len` bytes
    #[must_use]
    #[inline]
    const unsafe fn as_bytes(&self) -> &[u8] {
        // SAFETY: caller guarantees ptr points to string_len initialized bytes
        unsafe { core::slice::from_raw_parts(self.string_ptr(), self.string_len) }
    }

    /// # Safety
    ///
    /// String data must be valid UTF-8
    #[must_use]
    #[inline]
    const unsafe fn as_str(&self) -> &str {
        // SAFETY: data was copied from a `&str`
        unsafe { str::from_utf8_unchecked(self.as_bytes()) }
    }

    /// # Panics
    ///
    /// If `string_len > Self::MAX_LEN`.
    fn layout_for_string(string_len: usize) -> Layout {
        if string_len > Self::MAX_LEN {
            panic!("String too long: {} bytes (max supported: {})", string_len, Self::MAX_LEN);
        }

        // SAFETY: Length check passed
        unsafe { Self::layout_for_string_unchecked(string_len) }
    }

    /// # Safety
    ///
    /// Caller must guarantee `string_len <= Self::MAX_LEN`
    unsafe fn layout_for_string_unchecked(string_len: usize) -> Layout {
        let header = Layout::new::<Self>();
        // SAFETY: align 1 is a power of two and the size was bounds checked
        unsafe {
            let string_data = Layout::from_size_align_unchecked(string_len, 1);
            let (combined, _offset) = header.extend(string_data).unwrap_unchecked();
            combined.pad_to_align()
        }
    }

    /// Initialize header and copy string bytes
    ///
    /// # Safety
    ///
    /// `ptr` must point to memory allocated with `layout_for_string(string.len())`
    unsafe fn write_with_string(ptr: NonNull<Self>, string: &str) {
        let inner = ptr.as_ptr();

        // SAFETY: the block is large enough for header and data, and the source
        // string cannot overlap a fresh allocation
        unsafe {
            core::ptr::write(inner, Self { count: AtomicUsize::new(1), string_len: string.len() });
            let string_ptr = (*inner).string_ptr().cast_mut();
            core::ptr::copy_nonoverlapping(string.as_ptr(), string_ptr, string.len());
        }
    }

    /// # Safety
    ///
    /// A live reference must exist (count >= 1)
    #[inline]
    unsafe fn inc_strong(&self) {
        let old_count = self.count.fetch_add(1, Relaxed);

        if old_count > isize::MAX as usize {
            std::process::abort();
        }
    }

    /// Returns `true` when this was the last reference
    ///
    /// # Safety
    ///
    /// A live reference must exist (count >= 1)
    #[inline]
    unsafe fn dec_strong(&self) -> bool { self.count.fetch_sub(1, Release) == 1 }

    #[inline]
    fn strong_count(&self) -> usize { self.count.load(Relaxed) }
}
