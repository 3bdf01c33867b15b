//! Concurrent fixed-capacity interned string pool
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Pool::get_or_add / try_get / contains / add / clear         │
//! ├───────────────┬──────────────────┬───────────────────────────┤
//! │  "" -> empty  │  1 char -> table │  else -> hash % buckets   │
//! ├───────────────┴──────────────────┼───────────────────────────┤
//! │  CharCache (direct + scc map)    │  BucketArena (raw mutex   │
//! │                                  │  per bucket, 32 slots)    │
//! ├──────────────────────────────────┴───────────────────────────┤
//! │  PooledStr: [count][len][bytes...]                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use interned::{Pool, PooledStr};
//!
//! let pool = Pool::shared();
//! let a = pool.get_or_add("content");
//! let b = pool.get_or_add(&String::from("content"));
//! assert!(PooledStr::ptr_eq(&a, &b));
//! ```

mod arena;
mod bucket;
mod char_cache;
mod config;
mod error;
mod hasher;
mod pool;
mod pooled_str;
mod scratch;

pub use bucket::{PROMOTE_DISTANCE, PROMOTE_THRESHOLD};
pub use char_cache::{CharCache, DIRECT_TABLE_LEN};
pub use config::{DEFAULT_BUCKET_CAPACITY, DEFAULT_BUCKET_COUNT, PoolConfig};
pub use encoding_rs;
pub use error::PoolError;
pub use hasher::hash;
pub use pool::Pool;
pub use pooled_str::PooledStr;
pub use scratch::{MAX_RETAINED_SCRATCH, STACK_SCRATCH_LEN, with_scratch};
