#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Places the working memory of a memory-hard hashing engine on the NUMA nodes of the system and
//! pins worker threads to the processors of those nodes.
//!
//! On a multi-socket or multi-die system, every processor is wired to some memory directly and
//! reaches the rest of the memory through a slower interconnect. A hashing engine that reads
//! gigabytes of pseudo-random data per second is very sensitive to this: each worker thread should
//! read from a copy of the data that lives on the memory modules of the node it is running on.
//!
//! This package provides the building blocks for that:
//!
//! 1. [`NumaInfo::discover()`] inspects the NUMA topology of the system once at startup, allocates
//!    a cache region and a dataset region for every NUMA node through a [`RegionAllocator`] and
//!    binds the pages of each region to its node.
//! 1. [`NumaInfo::nth_cpu_for_node()`] (backed by [`CpuNodeMap`]) picks a processor on a given
//!    node for a worker thread.
//! 1. [`set_thread_affinity()`] and [`set_thread_affinity_for()`] pin a thread to that processor.
//! 1. [`cpuid_from_mask()`] and [`mask_to_string()`] convert between processor IDs and the 64-bit
//!    affinity masks found in configuration files.
//!
//! # Example
//!
//! ```
//! use numa_placement::{
//!     AllocationFlags, NumaInfo, PageRegionAllocator, RegionSizes, set_thread_affinity,
//! };
//!
//! // The hashing engine uses much larger regions, see `RegionSizes::default()`.
//! let allocator = PageRegionAllocator::new(RegionSizes::new(1024 * 1024, 4 * 1024 * 1024));
//! let numa = NumaInfo::discover(&allocator, AllocationFlags::new()).unwrap();
//!
//! std::thread::scope(|s| {
//!     for node in numa.nodes() {
//!         let numa = &numa;
//!
//!         s.spawn(move || {
//!             if let Some(processor) = numa.nth_cpu_for_node(node.id(), 1) {
//!                 // Failing to pin only costs performance, so it is fine to continue.
//!                 _ = set_thread_affinity(processor);
//!             }
//!
//!             // Hash using node.cache() and node.dataset() here.
//!         });
//!     }
//! });
//! ```
//!
//! # Platform support
//!
//! * **Linux** reads the topology from sysfs, binds memory with `mbind()` and pins threads with
//!   `pthread_setaffinity_np()`.
//! * **Windows** reads the topology from the NUMA APIs and pins threads with
//!   `SetThreadAffinityMask()`, which limits pinning to the first 64 processors. Existing memory
//!   cannot be moved to another node, so binding fails (with a logged warning) on multi-node
//!   systems.
//! * **macOS** reports a single node. Thread affinity is passed to the kernel as an affinity tag,
//!   which is only a scheduling hint.
//! * **Other platforms** report a single node containing all available processors and do not
//!   support thread affinity.
//!
//! # Logging
//!
//! The package emits [`tracing`](https://docs.rs/tracing) events: a warning when memory cannot be
//! bound to its node and debug events describing the discovered topology. It never installs a
//! subscriber itself.
//!
//! # Features
//!
//! * `topology` (default) - enables topology discovery and memory binding. Without it, that code
//!   and its dependencies are not compiled and [`NumaInfo::discover()`] returns
//!   [`Error::TopologyUnavailable`].

mod cpu_mask;
mod cpu_node_map;
mod error;
mod numa_info;
mod page_region;
mod primitive_types;
mod region;
mod thread_affinity;

pub use cpu_mask::*;
pub use cpu_node_map::*;
pub use error::*;
pub use numa_info::*;
pub use page_region::*;
pub use primitive_types::*;
pub use region::*;
pub use thread_affinity::{AffinityError, set_thread_affinity, set_thread_affinity_for};

pub(crate) mod pal;
