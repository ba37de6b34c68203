use std::io;
use std::ptr::NonNull;

use crate::{AllocationFlags, MemoryRegion, RegionAllocator, RegionSizes};

/// An anonymous, page-aligned memory region obtained directly from the operating system.
///
/// The memory is zero-initialized. Physical pages are only committed by the operating system
/// when first touched, so binding the region to a NUMA node right after allocation determines
/// where every page will eventually live.
#[derive(Debug)]
pub struct PageRegion {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: The region is plain memory exclusively owned by this handle. Nothing about it is tied
// to the thread that allocated it.
unsafe impl Send for PageRegion {}
// SAFETY: The handle only exposes the address and size, never references into the memory.
unsafe impl Sync for PageRegion {}

impl PageRegion {
    /// Allocates a region of `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `len` is zero, if large pages were requested on a platform where this
    /// package cannot request them, or if the operating system refuses the allocation.
    pub fn allocate(len: usize, flags: AllocationFlags) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot allocate a memory region of zero bytes",
            ));
        }

        let ptr = pages::allocate(len, flags.large_pages)?;

        Ok(Self { ptr, len })
    }
}

impl MemoryRegion for PageRegion {
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl Drop for PageRegion {
    fn drop(&mut self) {
        // SAFETY: The pointer and length describe an allocation made by `pages::allocate()` that
        // has not yet been released - we are the only owner and this is the only release call.
        unsafe {
            pages::free(self.ptr, self.len);
        }
    }
}

/// Allocates cache and dataset regions of fixed sizes as [`PageRegion`]s.
///
/// # Example
///
/// ```
/// use numa_placement::{AllocationFlags, PageRegionAllocator, RegionAllocator, RegionSizes};
///
/// let allocator = PageRegionAllocator::new(RegionSizes::new(4096, 8192));
///
/// let cache = allocator.allocate_cache(AllocationFlags::new()).unwrap();
/// # use numa_placement::MemoryRegion;
/// assert_eq!(cache.len(), 4096);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PageRegionAllocator {
    sizes: RegionSizes,
}

impl PageRegionAllocator {
    /// Creates an allocator that hands out regions of the given sizes.
    #[must_use]
    pub const fn new(sizes: RegionSizes) -> Self {
        Self { sizes }
    }

    /// The sizes of the regions this allocator hands out.
    #[must_use]
    pub const fn sizes(&self) -> RegionSizes {
        self.sizes
    }
}

impl RegionAllocator for PageRegionAllocator {
    type Flags = AllocationFlags;
    type Cache = PageRegion;
    type Dataset = PageRegion;
    type Error = io::Error;

    fn allocate_cache(&self, flags: AllocationFlags) -> io::Result<PageRegion> {
        PageRegion::allocate(self.sizes.cache(), flags)
    }

    fn allocate_dataset(&self, flags: AllocationFlags) -> io::Result<PageRegion> {
        PageRegion::allocate(self.sizes.dataset(), flags)
    }
}

#[cfg(unix)]
mod pages {
    use std::io;
    use std::ptr::{self, NonNull};

    pub(super) fn allocate(len: usize, large_pages: bool) -> io::Result<NonNull<u8>> {
        let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;

        #[cfg(target_os = "linux")]
        let flags = if large_pages {
            flags | libc::MAP_HUGETLB
        } else {
            flags
        };

        #[cfg(not(target_os = "linux"))]
        if large_pages {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "large pages can only be requested on Linux",
            ));
        }

        // SAFETY: Anonymous private mapping with no address hint; the kernel picks the address
        // and we check for failure before using the result.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                flags,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        NonNull::new(ptr.cast()).ok_or_else(|| io::Error::other("mmap returned a null pointer"))
    }

    /// # Safety
    ///
    /// The pointer and length must describe a live mapping created by `allocate()`.
    pub(super) unsafe fn free(ptr: NonNull<u8>, len: usize) {
        // SAFETY: Forwarding safety requirements to caller.
        let result = unsafe { libc::munmap(ptr.as_ptr().cast(), len) };

        debug_assert_eq!(result, 0, "munmap of an owned mapping cannot fail");
    }
}

#[cfg(windows)]
mod pages {
    use std::io;
    use std::ptr::NonNull;

    use windows::Win32::System::Memory::{
        MEM_COMMIT, MEM_LARGE_PAGES, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE, VirtualAlloc,
        VirtualFree,
    };

    pub(super) fn allocate(len: usize, large_pages: bool) -> io::Result<NonNull<u8>> {
        let mut allocation_type = MEM_COMMIT | MEM_RESERVE;

        if large_pages {
            allocation_type |= MEM_LARGE_PAGES;
        }

        // SAFETY: No safety requirements beyond passing valid arguments; we check for failure
        // before using the result.
        let ptr = unsafe { VirtualAlloc(None, len, allocation_type, PAGE_READWRITE) };

        NonNull::new(ptr.cast()).ok_or_else(io::Error::last_os_error)
    }

    /// # Safety
    ///
    /// The pointer must be the base address of a live allocation created by `allocate()`.
    pub(super) unsafe fn free(ptr: NonNull<u8>, _len: usize) {
        // MEM_RELEASE requires a size of zero and releases the whole reservation.
        // SAFETY: Forwarding safety requirements to caller.
        let result = unsafe { VirtualFree(ptr.as_ptr().cast(), 0, MEM_RELEASE) };

        debug_assert!(
            result.is_ok(),
            "VirtualFree of an owned allocation cannot fail"
        );
    }
}

#[cfg(not(any(unix, windows)))]
mod pages {
    use std::alloc::{self, Layout};
    use std::io;
    use std::ptr::NonNull;

    const PAGE_SIZE: usize = 4096;

    fn layout(len: usize) -> io::Result<Layout> {
        Layout::from_size_align(len, PAGE_SIZE)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }

    pub(super) fn allocate(len: usize, large_pages: bool) -> io::Result<NonNull<u8>> {
        if large_pages {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "large pages are not supported on this platform",
            ));
        }

        // SAFETY: The caller guarantees a nonzero size, which is the only requirement.
        let ptr = unsafe { alloc::alloc_zeroed(layout(len)?) };

        NonNull::new(ptr).ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))
    }

    /// # Safety
    ///
    /// The pointer and length must describe a live allocation created by `allocate()`.
    pub(super) unsafe fn free(ptr: NonNull<u8>, len: usize) {
        let layout = layout(len).expect("layout was valid when the region was allocated");

        // SAFETY: Forwarding safety requirements to caller.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
    }
}
