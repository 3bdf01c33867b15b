use crate::PoolError;

/// Default number of buckets
pub const DEFAULT_BUCKET_COUNT: usize = 4096;

/// Default number of slots per bucket
pub const DEFAULT_BUCKET_CAPACITY: usize = 32;

/// Fixed dimensions of a [`Pool`](crate::Pool)
///
/// Both values are read once at construction and stay constant for the
/// lifetime of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    pub bucket_count: usize,
    pub bucket_capacity: usize,
}

impl PoolConfig {
    #[inline]
    pub const fn new(bucket_count: usize, bucket_capacity: usize) -> Self {
        Self { bucket_count, bucket_capacity }
    }

    /// Total number of slots, or the reason the dimensions are unusable
    pub const fn validate(&self) -> Result<usize, PoolError> {
        if self.bucket_count == 0 {
            return Err(PoolError::ZeroBucketCount);
        }
        if self.bucket_capacity == 0 {
            return Err(PoolError::ZeroBucketCapacity);
        }
        match self.bucket_count.checked_mul(self.bucket_capacity) {
            Some(slots) if slots <= isize::MAX as usize / core::mem::size_of::<usize>() => {
                Ok(slots)
            }
            _ => Err(PoolError::SlotCountOverflow {
                bucket_count: self.bucket_count,
                bucket_capacity: self.bucket_capacity,
            }),
        }
    }
}

impl Default for PoolConfig {
    #[inline]
    fn default() -> Self { Self::new(DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_CAPACITY) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dimensions() {
        let config = PoolConfig::default();
        assert_eq!(config.bucket_count, 4096);
        assert_eq!(config.bucket_capacity, 32);
        assert_eq!(config.validate(), Ok(4096 * 32));
    }

    #[test]
    fn test_rejects_zero() {
        assert_eq!(PoolConfig::new(0, 32).validate(), Err(PoolError::ZeroBucketCount));
        assert_eq!(PoolConfig::new(16, 0).validate(), Err(PoolError::ZeroBucketCapacity));
    }

    #[test]
    fn test_rejects_overflow() {
        let config = PoolConfig::new(usize::MAX, 2);
        assert_eq!(
            config.validate(),
            Err(PoolError::SlotCountOverflow { bucket_count: usize::MAX, bucket_capacity: 2 })
        );
    }
}
