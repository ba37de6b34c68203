use std::fmt::Debug;
use std::ptr::NonNull;

use derive_more::derive::Display;

/// Distinguishes the two memory regions placed on every NUMA node.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the compute engine works with exactly these two regions"
)]
pub enum RegionKind {
    /// The smaller region that the compute engine derives the dataset from.
    #[display("cache")]
    Cache,

    /// The large region that the compute engine reads from while hashing.
    #[display("dataset")]
    Dataset,
}

/// A contiguous range of memory owned by a handle.
///
/// Dropping the handle releases the memory.
pub trait MemoryRegion: Send + Sync {
    /// Address of the first byte of the region.
    fn as_ptr(&self) -> NonNull<u8>;

    /// Size of the region in bytes.
    fn len(&self) -> usize;

    /// Whether the region has a size of zero bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Allocates the memory regions that get placed on every NUMA node.
///
/// This is implemented by the compute engine that consumes the regions. The built-in
/// [`PageRegionAllocator`][crate::PageRegionAllocator] can be used when the engine only needs
/// raw memory of a fixed size.
pub trait RegionAllocator {
    /// Engine-specific options that control how regions are allocated.
    type Flags: Copy + Debug;

    /// Handle to an allocated cache region.
    type Cache: MemoryRegion;

    /// Handle to an allocated dataset region.
    type Dataset: MemoryRegion;

    /// Error returned when the allocator cannot provide a region.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Allocates a new cache region.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory could not be allocated.
    fn allocate_cache(&self, flags: Self::Flags) -> Result<Self::Cache, Self::Error>;

    /// Allocates a new dataset region.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory could not be allocated.
    fn allocate_dataset(&self, flags: Self::Flags) -> Result<Self::Dataset, Self::Error>;
}

/// Sizes of the two regions allocated by [`PageRegionAllocator`][crate::PageRegionAllocator].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegionSizes {
    cache: usize,
    dataset: usize,
}

impl RegionSizes {
    /// Size of the cache region used by the hashing engine: 256 MiB.
    pub const DEFAULT_CACHE: usize = 256 * 1024 * 1024;

    /// Size of the dataset region used by the hashing engine: 2 GiB of base data plus
    /// 33 554 368 bytes of extra items.
    pub const DEFAULT_DATASET: usize = 2_147_483_648 + 33_554_368;

    /// Creates a set of region sizes, in bytes.
    #[must_use]
    pub const fn new(cache: usize, dataset: usize) -> Self {
        Self { cache, dataset }
    }

    /// Size of a cache region, in bytes.
    #[must_use]
    pub const fn cache(&self) -> usize {
        self.cache
    }

    /// Size of a dataset region, in bytes.
    #[must_use]
    pub const fn dataset(&self) -> usize {
        self.dataset
    }

    /// Size of the region of the given kind, in bytes.
    #[must_use]
    pub const fn of(&self, kind: RegionKind) -> usize {
        match kind {
            RegionKind::Cache => self.cache,
            RegionKind::Dataset => self.dataset,
        }
    }
}

impl Default for RegionSizes {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CACHE, Self::DEFAULT_DATASET)
    }
}

/// Options for [`PageRegionAllocator`][crate::PageRegionAllocator].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct AllocationFlags {
    /// Back the regions with large (huge) pages.
    ///
    /// The operating system must be configured to provide large pages. If it cannot provide them,
    /// the allocation fails instead of silently falling back to regular pages.
    pub large_pages: bool,
}

impl AllocationFlags {
    /// Regular pages, no special treatment.
    #[must_use]
    pub const fn new() -> Self {
        Self { large_pages: false }
    }

    /// Requests the regions to be backed by large pages.
    #[must_use]
    pub const fn with_large_pages(mut self) -> Self {
        self.large_pages = true;
        self
    }
}
