//! Content-addressed pool of interned strings
//!
//! # Routing
//!
//! ```text
//! ""                 -> PooledStr::empty()
//! exactly one char   -> CharCache (no hashing, no bucket)
//! everything else    -> bucket[hash(content) % bucket_count], scanned under its lock
//! ```
//!
//! The bucket array is allocated once and never resized, so picking a bucket
//! needs no synchronization; only the chosen bucket is locked.

use crate::{
    PoolConfig, PoolError, PooledStr,
    arena::{BucketArena, BucketGuard},
    char_cache::{CharCache, single_char},
    hasher, scratch,
};
use encoding_rs::{Encoding, UTF_8};
use std::sync::OnceLock;

static SHARED: OnceLock<Pool> = OnceLock::new();

/// Fixed-capacity concurrent string pool
///
/// Values with equal content come back as one shared allocation as long as
/// the entry has not been pushed out of its bucket in between. A full bucket
/// silently drops its tail entry; callers must only rely on content equality,
/// never on residency.
///
/// ```rust
/// use interned::{Pool, PooledStr};
///
/// let pool = Pool::with_capacity(1, 4).unwrap();
/// for s in ["aa", "bb", "cc", "dd", "ee"] {
///     pool.get_or_add(s);
/// }
/// assert!(pool.try_get("aa").is_none());
/// assert!(pool.contains("ee"));
/// ```
pub struct Pool {
    arena: BucketArena,
    chars: &'static CharCache,
}

impl Pool {
    /// Pool with the default `4096 × 32` dimensions
    pub fn new() -> Self {
        let config = PoolConfig::default();
        Self::build(config.bucket_count, config.bucket_capacity)
    }

    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self::build(config.bucket_count, config.bucket_capacity))
    }

    #[inline]
    pub fn with_capacity(bucket_count: usize, bucket_capacity: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(bucket_count, bucket_capacity))
    }

    fn build(bucket_count: usize, bucket_capacity: usize) -> Self {
        tracing::debug!(bucket_count, bucket_capacity, "creating string pool");
        Self { arena: BucketArena::new(bucket_count, bucket_capacity), chars: CharCache::global() }
    }

    /// Process-wide pool
    ///
    /// Built with the default dimensions on first access unless
    /// [`Pool::install_shared`] ran earlier. Lives until the process exits.
    #[inline]
    pub fn shared() -> &'static Self { SHARED.get_or_init(Self::new) }

    /// Make `pool` the process-wide pool
    ///
    /// Fails, handing `pool` back, once the shared pool exists (installed or
    /// lazily created by [`Pool::shared`]).
    pub fn install_shared(pool: Self) -> Result<&'static Self, Self> {
        SHARED.set(pool)?;
        Ok(Self::shared())
    }

    #[inline]
    pub fn bucket_count(&self) -> usize { self.arena.bucket_count() }

    #[inline]
    pub fn bucket_capacity(&self) -> usize { self.arena.capacity() }

    #[inline]
    pub fn config(&self) -> PoolConfig { PoolConfig::new(self.bucket_count(), self.bucket_capacity()) }

    /// Bucket that `content` is routed to
    ///
    /// Meaningful for strings of two or more characters; shorter inputs never
    /// reach a bucket.
    #[inline]
    pub fn bucket_index(&self, content: &str) -> usize {
        hasher::hash(content) as usize % self.bucket_count()
    }

    /// Canonical value for `content`, interning it on a miss
    pub fn get_or_add(&self, content: &str) -> PooledStr {
        match Route::of(content) {
            Route::Empty => PooledStr::empty(),
            Route::Char(c) => self.chars.get_or_add(c),
            Route::Bucket => {
                let index = self.bucket_index(content);
                let (value, evicted) = self.lock(index).get_or_add(content);
                if let Some(evicted) = evicted {
                    tracing::trace!(bucket = index, evicted_len = evicted.len(), "bucket full, dropped tail entry");
                }
                value
            }
        }
    }

    /// Decode `bytes` with `encoding`, then [`get_or_add`](Self::get_or_add)
    ///
    /// Malformed input decodes to U+FFFD. A leading BOM is kept as content.
    /// Valid UTF-8 with [`UTF_8`] is interned straight from `bytes`.
    pub fn get_or_add_bytes(
        &self,
        bytes: &[u8],
        encoding: &'static Encoding,
    ) -> Result<PooledStr, PoolError> {
        if encoding == UTF_8 {
            if let Ok(content) = core::str::from_utf8(bytes) {
                return Ok(self.get_or_add(content));
            }
        }

        let mut decoder = encoding.new_decoder_without_bom_handling();
        let max_len = decoder
            .max_utf8_buffer_length(bytes.len())
            .ok_or(PoolError::DecodedLengthOverflow { byte_len: bytes.len() })?;

        Ok(scratch::with_scratch(max_len, |buf| {
            let (_, _, written, _) = decoder.decode_to_utf8(bytes, buf, true);
            // SAFETY: encoding_rs only ever writes complete UTF-8 sequences,
            // and malformed input is replaced rather than copied
            let content = unsafe { core::str::from_utf8_unchecked(&buf[..written]) };
            self.get_or_add(content)
        }))
    }

    /// Pooled value for `content` without interning on a miss
    ///
    /// A hit deep in its bucket moves the entry a few slots forward.
    pub fn try_get(&self, content: &str) -> Option<PooledStr> {
        match Route::of(content) {
            Route::Empty => Some(PooledStr::empty()),
            Route::Char(c) => self.chars.try_get(c),
            Route::Bucket => self.lock(self.bucket_index(content)).try_get(content),
        }
    }

    #[inline]
    pub fn contains(&self, content: &str) -> bool {
        match Route::of(content) {
            Route::Empty => true,
            Route::Char(c) => self.chars.contains(c),
            Route::Bucket => self.lock(self.bucket_index(content)).contains(content),
        }
    }

    /// Insert `value` at the front of its bucket without a lookup first
    ///
    /// An entry with equal content is replaced by `value`.
    pub fn add(&self, value: PooledStr) {
        match Route::of(&value) {
            Route::Empty => {}
            Route::Char(_) => self.chars.add(value),
            Route::Bucket => {
                let index = self.bucket_index(&value);
                let evicted = self.lock(index).add(value);
                if let Some(evicted) = evicted {
                    tracing::trace!(bucket = index, evicted_len = evicted.len(), "bucket full, dropped tail entry");
                }
            }
        }
    }

    /// Empty every bucket, one lock at a time
    ///
    /// Not atomic across buckets: concurrent inserts may land in buckets that
    /// were already cleared. The single-character cache is left untouched.
    pub fn clear(&self) {
        for index in 0..self.bucket_count() {
            self.lock(index).clear();
        }
        tracing::debug!(bucket_count = self.bucket_count(), "string pool cleared");
    }

    /// Number of strings held in buckets
    ///
    /// Buckets are counted one after another, so the total can be stale under
    /// concurrent use. Single characters are not included.
    pub fn len(&self) -> usize { (0..self.bucket_count()).map(|index| self.lock(index).len()).sum() }

    pub fn is_empty(&self) -> bool { (0..self.bucket_count()).all(|index| self.lock(index).is_empty()) }

    /// Entries of bucket `index`, front to back
    ///
    /// # Panics
    ///
    /// If `index >= bucket_count`.
    pub fn bucket_snapshot(&self, index: usize) -> Vec<PooledStr> {
        self.lock(index).iter().cloned().collect()
    }

    #[inline]
    fn lock(&self, index: usize) -> BucketGuard<'_> { self.arena.lock(index) }
}

impl Default for Pool {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl core::fmt::Debug for Pool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pool")
            .field("bucket_count", &self.bucket_count())
            .field("bucket_capacity", &self.bucket_capacity())
            .finish_non_exhaustive()
    }
}

enum Route {
    Empty,
    Char(char),
    Bucket,
}

impl Route {
    #[inline]
    fn of(content: &str) -> Self {
        if content.is_empty() {
            Self::Empty
        } else if let Some(c) = single_char(content) {
            Self::Char(c)
        } else {
            Self::Bucket
        }
    }
}
