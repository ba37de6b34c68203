#[cfg(feature = "topology")]
use itertools::Itertools;
use tracing::debug;
#[cfg(feature = "topology")]
use tracing::warn;

use crate::pal::PlatformFacade;
#[cfg(feature = "topology")]
use crate::pal::{NodeLayout, Platform};
#[cfg(feature = "topology")]
use crate::{MAX_MAPPED_PROCESSORS, RegionKind};
use crate::{
    CpuNodeMap, Error, MemoryRegion, MemoryRegionId, PageRegion, ProcessorId, RegionAllocator,
    Result,
};

/// A snapshot of the NUMA topology of the system, with a cache region and a dataset region
/// placed on every NUMA node.
///
/// Created once by [`discover()`][Self::discover] during startup and read-only afterwards, so
/// it can be shared by reference with any number of threads. Call [`release()`][Self::release]
/// (or drop the snapshot) to free the memory regions.
///
/// The region handle types default to the built-in [`PageRegion`] but can be any type produced
/// by the [`RegionAllocator`] given to `discover()`.
///
/// # Example
///
/// ```
/// use numa_placement::{AllocationFlags, NumaInfo, PageRegionAllocator, RegionSizes};
///
/// let allocator = PageRegionAllocator::new(RegionSizes::new(64 * 1024, 64 * 1024));
/// let numa = NumaInfo::discover(&allocator, AllocationFlags::new()).unwrap();
///
/// for node in numa.nodes() {
///     println!("node {} has processors {:?}", node.id(), node.processors());
/// }
///
/// if let Some(processor) = numa.nth_cpu_for_node(0, 1) {
///     println!("first processor of node 0 is {processor}");
/// }
/// ```
#[derive(Debug)]
pub struct NumaInfo<C = PageRegion, D = PageRegion> {
    nodes: Vec<NumaNode<C, D>>,
    cpu_to_node: CpuNodeMap,
}

/// One NUMA node (memory region) together with the memory regions placed on it.
#[derive(Debug)]
pub struct NumaNode<C = PageRegion, D = PageRegion> {
    id: MemoryRegionId,
    processors: Vec<ProcessorId>,
    cache: C,
    dataset: D,
}

impl<C, D> NumaNode<C, D> {
    /// The operating system's ID of this NUMA node.
    #[must_use]
    pub fn id(&self) -> MemoryRegionId {
        self.id
    }

    /// The processors that belong to this node, in ascending order.
    ///
    /// Unlike [`NumaInfo::cpu_to_node()`], this is not limited to the first
    /// [`MAX_MAPPED_PROCESSORS`][crate::MAX_MAPPED_PROCESSORS] processors. It is empty for
    /// memory-only nodes.
    #[must_use]
    pub fn processors(&self) -> &[ProcessorId] {
        &self.processors
    }

    /// The cache region placed on this node.
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// The dataset region placed on this node.
    #[must_use]
    pub fn dataset(&self) -> &D {
        &self.dataset
    }
}

impl<C, D> NumaInfo<C, D>
where
    C: MemoryRegion,
    D: MemoryRegion,
{
    /// Discovers the NUMA nodes of the system and places a cache region and a dataset region on
    /// each of them.
    ///
    /// The regions come from `allocator` and their pages are bound to the node they were
    /// allocated for. If the operating system refuses a binding, a warning is logged and the
    /// region is kept as-is, so a snapshot is still produced even if memory ends up non-local.
    ///
    /// # Errors
    ///
    /// * [`Error::TopologyUnavailable`] if the package was built without the `topology` feature.
    /// * [`Error::Topology`] if the operating system does not describe its topology.
    /// * [`Error::Allocation`] if the allocator fails. Every region allocated up to that point
    ///   has been released when this is returned.
    pub fn discover<A>(allocator: &A, flags: A::Flags) -> Result<Self>
    where
        A: RegionAllocator<Cache = C, Dataset = D>,
    {
        Self::discover_on(&PlatformFacade::real(), allocator, flags)
    }

    #[cfg(not(feature = "topology"))]
    fn discover_on<A>(_pal: &PlatformFacade, _allocator: &A, _flags: A::Flags) -> Result<Self>
    where
        A: RegionAllocator<Cache = C, Dataset = D>,
    {
        Err(Error::TopologyUnavailable)
    }

    #[cfg(feature = "topology")]
    fn discover_on<A>(pal: &PlatformFacade, allocator: &A, flags: A::Flags) -> Result<Self>
    where
        A: RegionAllocator<Cache = C, Dataset = D>,
    {
        let layout = pal.numa_nodes().map_err(Error::Topology)?;

        let mut nodes = Vec::with_capacity(layout.len());
        let mut cpu_to_node = CpuNodeMap::new();
        let mut unmapped_processors: usize = 0;

        // If anything below fails, dropping `nodes` releases everything allocated so far.
        for NodeLayout { id, processors } in layout {
            let cache = allocator
                .allocate_cache(flags)
                .map_err(|e| allocation_error(id, RegionKind::Cache, e))?;
            bind_region(pal, &cache, id, RegionKind::Cache);

            let dataset = allocator
                .allocate_dataset(flags)
                .map_err(|e| allocation_error(id, RegionKind::Dataset, e))?;
            bind_region(pal, &dataset, id, RegionKind::Dataset);

            for processor in processors.iter().copied() {
                if !cpu_to_node.assign(processor, id) {
                    unmapped_processors = unmapped_processors.saturating_add(1);
                }
            }

            nodes.push(NumaNode {
                id,
                processors,
                cache,
                dataset,
            });
        }

        if unmapped_processors > 0 {
            debug!(
                unmapped_processors,
                capacity = MAX_MAPPED_PROCESSORS,
                "processors beyond the capacity of the processor to node map are not mapped"
            );
        }

        debug!(
            node_count = nodes.len(),
            node_ids = %nodes.iter().map(|node| node.id).join(","),
            mapped_processors = cpu_to_node.len(),
            "discovered NUMA topology"
        );

        Ok(Self { nodes, cpu_to_node })
    }
}

impl<C, D> NumaInfo<C, D> {
    /// Number of NUMA nodes in the snapshot. Zero after [`release()`][Self::release].
    #[must_use]
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot contains no NUMA nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The NUMA nodes in the order the operating system enumerated them.
    #[must_use]
    pub fn nodes(&self) -> &[NumaNode<C, D>] {
        &self.nodes
    }

    /// The NUMA node with the given ID, if it is part of the snapshot.
    #[must_use]
    pub fn node(&self, id: MemoryRegionId) -> Option<&NumaNode<C, D>> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// The cache regions, one per node, in the same order as [`nodes()`][Self::nodes].
    pub fn caches(&self) -> impl ExactSizeIterator<Item = &C> + Clone {
        self.nodes.iter().map(NumaNode::cache)
    }

    /// The dataset regions, one per node, in the same order as [`nodes()`][Self::nodes].
    pub fn datasets(&self) -> impl ExactSizeIterator<Item = &D> + Clone {
        self.nodes.iter().map(NumaNode::dataset)
    }

    /// The memory region that each of the first
    /// [`MAX_MAPPED_PROCESSORS`][crate::MAX_MAPPED_PROCESSORS] processors belongs to.
    ///
    /// This mapping is kept after [`release()`][Self::release] because it describes the hardware,
    /// not the memory regions.
    #[must_use]
    pub fn cpu_to_node(&self) -> &CpuNodeMap {
        &self.cpu_to_node
    }

    /// Selects the `nth` (1-based) processor of a NUMA node, in ascending processor ID order.
    ///
    /// Use `nth` of 1 to get the first processor of the node. Returns `None` if the node has
    /// fewer than `nth` mapped processors.
    #[must_use]
    pub fn nth_cpu_for_node(&self, node: MemoryRegionId, nth: usize) -> Option<ProcessorId> {
        self.cpu_to_node.nth_cpu_for_node(node, nth)
    }

    /// Releases every cache and dataset region and removes all nodes from the snapshot.
    ///
    /// Calling this on an already released snapshot does nothing.
    pub fn release(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        debug!(node_count = self.nodes.len(), "releasing NUMA node memory regions");
        self.nodes.clear();
    }
}

#[cfg(feature = "topology")]
fn allocation_error<E>(node: MemoryRegionId, kind: RegionKind, source: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::Allocation {
        node,
        kind,
        source: Box::new(source),
    }
}

#[cfg(feature = "topology")]
fn bind_region(
    pal: &PlatformFacade,
    region: &impl MemoryRegion,
    node: MemoryRegionId,
    kind: RegionKind,
) {
    if let Err(error) = pal.bind_memory(region.as_ptr(), region.len(), node) {
        warn!(
            node,
            %kind,
            %error,
            "failed to bind memory region to its NUMA node, memory may not be local to the node"
        );
    }
}
