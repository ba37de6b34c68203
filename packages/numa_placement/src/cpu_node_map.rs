use std::fmt::{self, Debug};

use crate::{MAX_MAPPED_PROCESSORS, MemoryRegionId, ProcessorId};

/// Maps processor IDs to the ID of the memory region (NUMA node) each processor belongs to.
///
/// The map has a fixed capacity of [`MAX_MAPPED_PROCESSORS`] entries. Processors with higher IDs
/// cannot be represented and are never reported by any lookup.
///
/// A processor that the operating system did not place in any memory region is unmapped. Unmapped
/// processors are distinct from processors that legitimately belong to memory region 0.
#[derive(Clone, Eq, PartialEq)]
pub struct CpuNodeMap {
    nodes: [Option<MemoryRegionId>; MAX_MAPPED_PROCESSORS],
}

impl CpuNodeMap {
    /// Creates a map in which no processor is assigned to any memory region.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: [None; MAX_MAPPED_PROCESSORS],
        }
    }

    /// Records that a processor belongs to a memory region.
    ///
    /// Returns `false` without modifying the map if the processor ID is beyond the capacity of
    /// the map.
    pub fn assign(&mut self, processor: ProcessorId, node: MemoryRegionId) -> bool {
        let Some(slot) = usize::try_from(processor)
            .ok()
            .and_then(|index| self.nodes.get_mut(index))
        else {
            return false;
        };

        *slot = Some(node);
        true
    }

    /// Returns the memory region that a processor belongs to, if known.
    #[must_use]
    pub fn node_of(&self, processor: ProcessorId) -> Option<MemoryRegionId> {
        usize::try_from(processor)
            .ok()
            .and_then(|index| self.nodes.get(index))
            .copied()
            .flatten()
    }

    /// Iterates over the processors assigned to a memory region, in ascending processor ID order.
    pub fn processors_in(
        &self,
        node: MemoryRegionId,
    ) -> impl Iterator<Item = ProcessorId> + Clone + '_ {
        self.mapped().filter_map(
            move |(processor, processor_node)| (processor_node == node).then_some(processor),
        )
    }

    /// Selects the `nth` (1-based) processor assigned to a memory region, scanning processors
    /// in ascending ID order.
    ///
    /// Returns `None` if fewer than `nth` processors belong to the memory region. Passing `nth` of
    /// zero always returns `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use numa_placement::CpuNodeMap;
    ///
    /// let mut map = CpuNodeMap::new();
    /// map.assign(2, 1);
    /// map.assign(5, 1);
    /// map.assign(9, 1);
    ///
    /// assert_eq!(map.nth_cpu_for_node(1, 1), Some(2));
    /// assert_eq!(map.nth_cpu_for_node(1, 2), Some(5));
    /// assert_eq!(map.nth_cpu_for_node(1, 4), None);
    /// ```
    #[must_use]
    pub fn nth_cpu_for_node(&self, node: MemoryRegionId, nth: usize) -> Option<ProcessorId> {
        let index = nth.checked_sub(1)?;
        self.processors_in(node).nth(index)
    }

    /// Number of processors that are assigned to some memory region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mapped().count()
    }

    /// Whether no processor is assigned to any memory region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(Option::is_none)
    }

    /// Iterates over `(processor, memory region)` pairs for every mapped processor,
    /// in ascending processor ID order.
    pub fn mapped(&self) -> impl Iterator<Item = (ProcessorId, MemoryRegionId)> + Clone + '_ {
        (0..).zip(self.nodes.iter()).filter_map(|(processor, node)| {
            node.map(|node| (processor, node))
        })
    }
}

impl Default for CpuNodeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CpuNodeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 64 slots of mostly identical data is unreadable, so only show what is mapped.
        f.debug_map().entries(self.mapped()).finish()
    }
}
