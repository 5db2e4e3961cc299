//! Index ownership among cooperating processes.

use crate::error::SampleError;

/// Slice of a batch owned by one of `size` cooperating processes.
///
/// The process of rank `r` owns every index `i` with `i % size == r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    rank: usize,
    size: usize,
}

impl Partition {
    /// Creates the partition of process `rank` among `size`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidParameter`] if `size == 0` or
    /// `rank >= size`.
    pub fn new(rank: usize, size: usize) -> Result<Self, SampleError> {
        if size == 0 {
            return Err(SampleError::invalid("ranks", "must be >= 1"));
        }
        if rank >= size {
            return Err(SampleError::invalid(
                "rank",
                format!("must be < {size} (number of ranks), got {rank}"),
            ));
        }
        Ok(Self { rank, size })
    }

    /// The partition of a single process owning every index.
    #[must_use]
    pub fn whole() -> Self {
        Self { rank: 0, size: 1 }
    }

    /// Rank of this process.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of cooperating processes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if this process owns `index`.
    #[must_use]
    pub fn owns(&self, index: usize) -> bool {
        index % self.size == self.rank
    }

    /// Owned indices below `count`, in increasing order.
    pub fn indices(&self, count: usize) -> impl Iterator<Item = usize> {
        (self.rank..count).step_by(self.size)
    }
}

impl Default for Partition {
    fn default() -> Self {
        Self::whole()
    }
}
