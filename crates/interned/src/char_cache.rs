//! Single-character fast path
//!
//! One-`char` strings recur constantly and can be located without hashing:
//! code points below [`DIRECT_TABLE_LEN`] index a table filled once at first
//! use, higher code points live in a concurrent overflow map that only grows.

use crate::PooledStr;
use std::sync::LazyLock;

/// Code points `[0, DIRECT_TABLE_LEN)` are pre-interned
pub const DIRECT_TABLE_LEN: usize = 2048;

type OverflowMap = scc::HashMap<char, PooledStr, ahash::RandomState>;

static CHAR_CACHE: LazyLock<CharCache> = LazyLock::new(CharCache::new);

pub struct CharCache {
    /// Read-only after construction
    table: Box<[PooledStr]>,
    /// Entries are added or overwritten, never removed
    overflow: OverflowMap,
}

impl CharCache {
    pub(crate) fn new() -> Self {
        let table = (0..DIRECT_TABLE_LEN as u32)
            .map(|code| {
                // No surrogates below 0xD800
                let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                Self::make(c)
            })
            .collect();

        Self { table, overflow: OverflowMap::with_hasher(ahash::RandomState::new()) }
    }

    /// Process-wide instance shared by every pool
    #[inline]
    pub fn global() -> &'static Self { &CHAR_CACHE }

    pub fn get_or_add(&self, c: char) -> PooledStr {
        if let Some(value) = self.direct(c) {
            return value.clone();
        }
        self.overflow.entry_sync(c).or_insert_with(|| Self::make(c)).get().clone()
    }

    pub fn try_get(&self, c: char) -> Option<PooledStr> {
        match self.direct(c) {
            Some(value) => Some(value.clone()),
            None => self.overflow.read_sync(&c, |_, value| value.clone()),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        self.direct(c).is_some() || self.overflow.read_sync(&c, |_, _| ()).is_some()
    }

    /// Store `value` if it is a single character outside the direct table
    pub fn add(&self, value: PooledStr) {
        let Some(c) = single_char(&value) else {
            return;
        };
        if self.direct(c).is_some() {
            return;
        }
        self.overflow.upsert_sync(c, value);
    }

    /// Number of characters held by the overflow map
    #[inline]
    pub fn overflow_len(&self) -> usize { self.overflow.len() }

    #[inline]
    fn direct(&self, c: char) -> Option<&PooledStr> { self.table.get(c as usize) }

    fn make(c: char) -> PooledStr { PooledStr::new(c.encode_utf8(&mut [0; 4])) }
}

/// The only `char` of `s`, if it has exactly one
#[inline]
pub(crate) fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}
