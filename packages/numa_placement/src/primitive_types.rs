/// Identifies a specific logical processor (a hardware thread).
///
/// This will match the numeric identifier used by standard tooling of the operating system.
///
/// The values used are not guaranteed to be sequential/contiguous or to start from zero.
pub type ProcessorId = u32;

/// Identifies a specific memory region, also known as a NUMA node.
///
/// This will match the numeric identifier used by standard tooling of the operating system
/// (e.g. the `N` in `/sys/devices/system/node/nodeN` on Linux).
pub type MemoryRegionId = u32;

/// How many processors a [`CpuNodeMap`][crate::CpuNodeMap] can describe.
///
/// Processors with an ID of this value or higher are not represented in the map. On systems with
/// more logical processors than this, the excess processors are silently absent from the
/// processor-to-node mapping (though they are still counted as members of their node by the
/// operating system and can still be targeted by thread affinity operations).
pub const MAX_MAPPED_PROCESSORS: usize = 64;
