use thiserror::Error;

/// Argument errors raised before any pool state is touched
///
/// Misses, hash collisions and full buckets are ordinary outcomes and never
/// show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("bucket count must be at least 1")]
    ZeroBucketCount,

    #[error("bucket capacity must be at least 1")]
    ZeroBucketCapacity,

    #[error("{bucket_count} buckets of {bucket_capacity} slots overflow the address space")]
    SlotCountOverflow { bucket_count: usize, bucket_capacity: usize },

    #[error("decoding {byte_len} bytes would exceed the maximum string length")]
    DecodedLengthOverflow { byte_len: usize },
}
