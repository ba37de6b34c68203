#[cfg(feature = "topology")]
use std::io;
#[cfg(feature = "topology")]
use std::ptr::NonNull;

use crate::pal::Platform;
#[cfg(feature = "topology")]
use crate::pal::NodeLayout;
use crate::thread_affinity::ThreadHandle;
#[cfg(feature = "topology")]
use crate::MemoryRegionId;
use crate::{AffinityError, ProcessorId};

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

/// Platform for targets where this package does not know how to inspect the memory topology.
///
/// Describes the system as a single memory region containing every available processor,
/// accepts memory binding requests without doing anything and rejects thread affinity.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    #[cfg(feature = "topology")]
    fn numa_nodes(&self) -> io::Result<Vec<NodeLayout>> {
        Ok(vec![NodeLayout::single_node_of_available_processors()])
    }

    #[cfg(feature = "topology")]
    fn bind_memory(
        &self,
        _start: NonNull<u8>,
        _len: usize,
        _node: MemoryRegionId,
    ) -> io::Result<()> {
        Ok(())
    }

    fn current_thread(&self) -> ThreadHandle {
        ThreadHandle::current()
    }

    fn set_thread_affinity(
        &self,
        _thread: ThreadHandle,
        _processor: ProcessorId,
    ) -> Result<(), AffinityError> {
        Err(AffinityError::Unsupported)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[cfg(feature = "topology")]
    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot query available parallelism.
    fn single_node_with_all_processors() {
        let nodes = BUILD_TARGET_PLATFORM.numa_nodes().unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, 0);
        assert!(!nodes[0].processors.is_empty());
    }

    #[cfg(feature = "topology")]
    #[test]
    fn bind_memory_accepts_anything() {
        let mut buffer = [0_u8; 8];

        BuildTargetPlatform
            .bind_memory(NonNull::from(&mut buffer).cast(), 8, 3)
            .unwrap();
    }

    #[test]
    fn affinity_is_unsupported() {
        let platform = BuildTargetPlatform;

        let error = platform
            .set_thread_affinity(platform.current_thread(), 0)
            .unwrap_err();

        assert!(matches!(error, AffinityError::Unsupported));
        assert_eq!(error.status_code(), -1);
    }
}
