use std::io;

use thiserror::Error;

use crate::{MemoryRegionId, RegionKind};

/// Errors that can occur when discovering the NUMA topology and placing memory regions on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The package was built without topology support (the `topology` Cargo feature is disabled).
    ///
    /// This is distinct from a system that has no memory regions to report.
    #[error("NUMA topology support is not available in this build")]
    TopologyUnavailable,

    /// The operating system did not provide a usable description of the NUMA topology.
    #[error("failed to inspect the NUMA topology of the system")]
    Topology(#[source] io::Error),

    /// The memory allocator failed to provide a region for a memory region (NUMA node).
    ///
    /// Any regions allocated for previously processed memory regions have been released.
    #[error("failed to allocate the {kind} region for NUMA node {node}")]
    Allocation {
        /// The memory region (NUMA node) the allocation was intended for.
        node: MemoryRegionId,

        /// Which of the two regions could not be allocated.
        kind: RegionKind,

        /// The error reported by the allocator.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// A specialized `Result` type for topology operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
