use std::fmt::Debug;
#[cfg(feature = "topology")]
use std::io;
#[cfg(feature = "topology")]
use std::num::NonZero;
#[cfg(feature = "topology")]
use std::ptr::NonNull;
#[cfg(feature = "topology")]
use std::thread;

use crate::thread_affinity::ThreadHandle;
#[cfg(feature = "topology")]
use crate::MemoryRegionId;
use crate::{AffinityError, ProcessorId};

/// The operations this package needs from the operating system.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Lists the memory regions (NUMA nodes) of the system in ascending ID order, together with
    /// the processors that belong to each.
    ///
    /// A memory region without processors (e.g. a memory expander) is listed with an empty
    /// processor list. Systems without NUMA support report a single memory region 0 that
    /// contains every processor.
    #[cfg(feature = "topology")]
    fn numa_nodes(&self) -> io::Result<Vec<NodeLayout>>;

    /// Requests the operating system to place the physical pages of a memory range on the
    /// given memory region.
    ///
    /// The range does not need to be touched yet; pages that are committed later also follow
    /// the binding.
    #[cfg(feature = "topology")]
    fn bind_memory(&self, start: NonNull<u8>, len: usize, node: MemoryRegionId)
    -> io::Result<()>;

    /// The handle of the calling thread.
    fn current_thread(&self) -> ThreadHandle;

    /// Restricts a thread to run only on the given processor.
    fn set_thread_affinity(
        &self,
        thread: ThreadHandle,
        processor: ProcessorId,
    ) -> Result<(), AffinityError>;
}

/// One memory region (NUMA node) as reported by the operating system.
#[cfg(feature = "topology")]
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NodeLayout {
    pub(crate) id: MemoryRegionId,

    /// In ascending order.
    pub(crate) processors: Vec<ProcessorId>,
}

#[cfg(feature = "topology")]
impl NodeLayout {
    pub(crate) fn new(id: MemoryRegionId, processors: Vec<ProcessorId>) -> Self {
        Self { id, processors }
    }

    /// A single memory region 0 containing processors `0..N`, where `N` is the available
    /// parallelism reported by the standard library.
    ///
    /// Used on platforms that do not expose their memory topology.
    #[cfg_attr(
        all(not(test), not(miri), any(target_os = "linux", windows)),
        expect(
            dead_code,
            reason = "only platforms without a topology API describe themselves like this"
        )
    )]
    pub(crate) fn single_node_of_available_processors() -> Self {
        let count = thread::available_parallelism().map_or(1, NonZero::get);
        let count = ProcessorId::try_from(count).unwrap_or(ProcessorId::MAX);

        Self::new(0, (0..count).collect())
    }
}

#[cfg(all(test, feature = "topology"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot query available parallelism.
    fn single_node_lists_available_processors() {
        let expected = thread::available_parallelism().unwrap().get();

        let layout = NodeLayout::single_node_of_available_processors();

        assert_eq!(layout.id, 0);
        assert_eq!(layout.processors.len(), expected);
        assert_eq!(layout.processors.first(), Some(&0));
        assert!(layout.processors.is_sorted());
    }
}
