//! Topology discovery against the real operating system.

#![cfg(feature = "topology")]

use std::collections::HashSet;

use numa_placement::{AllocationFlags, MemoryRegion, NumaInfo, PageRegionAllocator, RegionSizes};

fn small_allocator() -> PageRegionAllocator {
    PageRegionAllocator::new(RegionSizes::new(64 * 1024, 256 * 1024))
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
fn discover_places_regions_on_every_node() {
    let numa = NumaInfo::discover(&small_allocator(), AllocationFlags::new()).unwrap();

    assert!(numa.count() >= 1);
    assert_eq!(numa.caches().count(), numa.count());
    assert_eq!(numa.datasets().count(), numa.count());

    for node in numa.nodes() {
        assert_eq!(node.cache().len(), 64 * 1024);
        assert_eq!(node.dataset().len(), 256 * 1024);
    }

    // Node IDs are unique.
    let ids: HashSet<_> = numa.nodes().iter().map(|node| node.id()).collect();
    assert_eq!(ids.len(), numa.count());
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
fn mapped_processors_agree_with_node_records() {
    let numa = NumaInfo::discover(&small_allocator(), AllocationFlags::new()).unwrap();

    assert!(!numa.cpu_to_node().is_empty());

    for (processor, node_id) in numa.cpu_to_node().mapped() {
        let node = numa.node(node_id).unwrap();
        assert!(node.processors().contains(&processor));
    }

    // Some node has a first processor.
    assert!(
        numa.nodes()
            .iter()
            .any(|node| numa.nth_cpu_for_node(node.id(), 1).is_some())
    );
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
fn regions_are_writable_and_released() {
    let mut numa = NumaInfo::discover(&small_allocator(), AllocationFlags::new()).unwrap();

    for dataset in numa.datasets() {
        // SAFETY: The region is owned by the snapshot and at least one byte long. Nothing else
        // accesses it concurrently.
        unsafe {
            dataset.as_ptr().write(1);
            assert_eq!(dataset.as_ptr().read(), 1);
        }
    }

    numa.release();
    assert_eq!(numa.count(), 0);

    numa.release();
    assert_eq!(numa.count(), 0);
}
