#[cfg(feature = "topology")]
use std::io;
#[cfg(feature = "topology")]
use std::ptr::NonNull;

use crate::pal::Platform;
#[cfg(feature = "topology")]
use crate::pal::NodeLayout;
use crate::pal::windows::{Bindings, BindingsFacade};
use crate::thread_affinity::ThreadHandle;
use crate::{AffinityError, ProcessorId};
#[cfg(feature = "topology")]
use crate::{MemoryRegionId, mask_processors};

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform =
    BuildTargetPlatform::new(BindingsFacade::real());

/// The platform that matches the crate's build target.
///
/// You would only use a different platform in unit tests that need to mock the platform.
/// Even then, whenever possible, unit tests should use the real platform for maximum realism.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    bindings: BindingsFacade,
}

impl BuildTargetPlatform {
    pub(crate) const fn new(bindings: BindingsFacade) -> Self {
        Self { bindings }
    }

    /// The global processor ID of the first processor in each processor group, indexed by group.
    ///
    /// Windows numbers processors within their group, so we number them globally by laying the
    /// groups out one after another, each taking up its maximum processor count.
    #[cfg(feature = "topology")]
    fn group_start_offsets(&self) -> Vec<ProcessorId> {
        (0..self.bindings.get_maximum_processor_group_count())
            .scan(0, |next_start: &mut ProcessorId, group| {
                let start = *next_start;
                *next_start =
                    start.saturating_add(self.bindings.get_maximum_processor_count(group));
                Some(start)
            })
            .collect()
    }
}

impl Platform for BuildTargetPlatform {
    #[cfg(feature = "topology")]
    fn numa_nodes(&self) -> io::Result<Vec<NodeLayout>> {
        let highest_node = self.bindings.get_numa_highest_node_number()?;
        let group_starts = self.group_start_offsets();

        (0..=highest_node)
            .map(|node| {
                let node_number = u16::try_from(node).map_err(io::Error::other)?;
                let affinity = self.bindings.get_numa_node_processor_mask_ex(node_number)?;

                let group_start = group_starts
                    .get(usize::from(affinity.Group))
                    .copied()
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "memory region {node} refers to unknown processor group {}",
                                affinity.Group
                            ),
                        )
                    })?;

                let processors = mask_processors(affinity.Mask as u64)
                    .map(|index| group_start.saturating_add(index))
                    .collect();

                Ok(NodeLayout::new(node, processors))
            })
            .collect()
    }

    #[cfg(feature = "topology")]
    fn bind_memory(
        &self,
        _start: NonNull<u8>,
        _len: usize,
        _node: MemoryRegionId,
    ) -> io::Result<()> {
        // With one memory region, all memory is already where it needs to be.
        if self.bindings.get_numa_highest_node_number()? == 0 {
            return Ok(());
        }

        // Windows can only choose the memory region when the memory is allocated
        // (VirtualAllocExNuma), not for an existing allocation.
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Windows cannot bind existing memory to a memory region",
        ))
    }

    fn current_thread(&self) -> ThreadHandle {
        self.bindings.get_current_thread()
    }

    fn set_thread_affinity(
        &self,
        thread: ThreadHandle,
        processor: ProcessorId,
    ) -> Result<(), AffinityError> {
        let mask = 1_usize
            .checked_shl(processor)
            .ok_or(AffinityError::ProcessorOutOfRange { processor })?;

        self.bindings
            .set_thread_affinity_mask(thread, mask)
            .map_err(|source| AffinityError::Rejected {
                processor,
                status: AffinityError::MASK_REJECTED_STATUS,
                source,
            })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    #[cfg(feature = "topology")]
    use mockall::predicate::eq;
    #[cfg(feature = "topology")]
    use windows::Win32::System::SystemInformation::GROUP_AFFINITY;

    use super::*;
    use crate::pal::windows::MockBindings;

    #[cfg(feature = "topology")]
    fn affinity(group: u16, mask: usize) -> GROUP_AFFINITY {
        GROUP_AFFINITY {
            Mask: mask,
            Group: group,
            ..Default::default()
        }
    }

    /// Simulates processor groups of the given maximum sizes.
    #[cfg(feature = "topology")]
    fn simulate_groups(bindings: &mut MockBindings, group_sizes: &'static [u32]) {
        let group_count = u16::try_from(group_sizes.len()).unwrap();

        bindings
            .expect_get_maximum_processor_group_count()
            .return_const(group_count);

        bindings
            .expect_get_maximum_processor_count()
            .returning(|group| group_sizes[usize::from(group)]);
    }

    #[cfg(feature = "topology")]
    #[test]
    fn two_nodes_in_one_group() {
        let mut bindings = MockBindings::new();
        simulate_groups(&mut bindings, &[8]);

        bindings
            .expect_get_numa_highest_node_number()
            .times(1)
            .returning(|| Ok(1));

        bindings
            .expect_get_numa_node_processor_mask_ex()
            .with(eq(0))
            .returning(|_| Ok(affinity(0, 0b0000_1111)));

        bindings
            .expect_get_numa_node_processor_mask_ex()
            .with(eq(1))
            .returning(|_| Ok(affinity(0, 0b1111_0000)));

        let nodes = BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .numa_nodes()
            .unwrap();

        assert_eq!(
            nodes,
            vec![
                NodeLayout::new(0, vec![0, 1, 2, 3]),
                NodeLayout::new(1, vec![4, 5, 6, 7]),
            ]
        );
    }

    #[cfg(feature = "topology")]
    #[test]
    fn second_group_is_offset_by_first_group_size() {
        let mut bindings = MockBindings::new();
        simulate_groups(&mut bindings, &[4, 4]);

        bindings
            .expect_get_numa_highest_node_number()
            .returning(|| Ok(1));

        bindings
            .expect_get_numa_node_processor_mask_ex()
            .with(eq(0))
            .returning(|_| Ok(affinity(0, 0b1111)));

        bindings
            .expect_get_numa_node_processor_mask_ex()
            .with(eq(1))
            .returning(|_| Ok(affinity(1, 0b0011)));

        let nodes = BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .numa_nodes()
            .unwrap();

        assert_eq!(nodes[1], NodeLayout::new(1, vec![4, 5]));
    }

    #[cfg(feature = "topology")]
    #[test]
    fn unknown_group_is_error() {
        let mut bindings = MockBindings::new();
        simulate_groups(&mut bindings, &[4]);

        bindings
            .expect_get_numa_highest_node_number()
            .returning(|| Ok(0));

        bindings
            .expect_get_numa_node_processor_mask_ex()
            .returning(|_| Ok(affinity(3, 0b1)));

        let error = BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .numa_nodes()
            .unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[cfg(feature = "topology")]
    #[test]
    fn bind_memory_single_node_is_noop() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_get_numa_highest_node_number()
            .returning(|| Ok(0));

        let mut buffer = [0_u8; 4];

        BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .bind_memory(NonNull::from(&mut buffer).cast(), 4, 0)
            .unwrap();
    }

    #[cfg(feature = "topology")]
    #[test]
    fn bind_memory_multi_node_is_unsupported() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_get_numa_highest_node_number()
            .returning(|| Ok(1));

        let mut buffer = [0_u8; 4];

        let error = BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .bind_memory(NonNull::from(&mut buffer).cast(), 4, 1)
            .unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn set_thread_affinity_uses_single_bit_mask() {
        let thread = ThreadHandle::current();

        let mut bindings = MockBindings::new();

        bindings
            .expect_set_thread_affinity_mask()
            .withf(move |t, mask| *t == thread && *mask == 0b1000)
            .times(1)
            .returning(|_, _| Ok(()));

        BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .set_thread_affinity(thread, 3)
            .unwrap();
    }

    #[test]
    fn set_thread_affinity_rejected_status() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_set_thread_affinity_mask()
            .times(1)
            .returning(|_, _| Err(io::Error::from_raw_os_error(87)));

        let error = BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
            .set_thread_affinity(ThreadHandle::current(), 40)
            .unwrap_err();

        assert_eq!(error.status_code(), -2);
    }

    #[test]
    fn set_thread_affinity_beyond_mask_width_is_out_of_range() {
        let platform = BuildTargetPlatform::new(BindingsFacade::from_mock(MockBindings::new()));

        let error = platform
            .set_thread_affinity(ThreadHandle::current(), usize::BITS)
            .unwrap_err();

        assert!(matches!(error, AffinityError::ProcessorOutOfRange { .. }));
        assert_eq!(error.status_code(), -1);
    }

    #[cfg(feature = "topology")]
    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
    fn real_topology_smoke_test() {
        let nodes = BUILD_TARGET_PLATFORM.numa_nodes().unwrap();

        assert!(!nodes.is_empty());
        assert!(nodes.iter().any(|node| !node.processors.is_empty()));
    }
}
