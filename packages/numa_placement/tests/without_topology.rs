//! Behavior of a build without the `topology` feature.

#![cfg(not(feature = "topology"))]

use numa_placement::{
    AllocationFlags, Error, NumaInfo, PageRegionAllocator, RegionSizes, cpuid_from_mask,
    mask_to_string,
};

#[test]
fn discover_reports_topology_unavailable() {
    let allocator = PageRegionAllocator::new(RegionSizes::new(4096, 4096));

    let error = NumaInfo::discover(&allocator, AllocationFlags::new()).unwrap_err();

    assert!(matches!(error, Error::TopologyUnavailable));
}

#[test]
fn mask_functions_keep_working() {
    assert_eq!(cpuid_from_mask(0b1010, 1), Some(3));
    assert_eq!(mask_to_string(0b1010), "1010");
}
