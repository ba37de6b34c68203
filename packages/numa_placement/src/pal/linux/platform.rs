#[cfg(feature = "topology")]
use std::io;
use std::mem;
#[cfg(feature = "topology")]
use std::ptr::NonNull;

#[cfg(feature = "topology")]
use libc::c_ulong;

use crate::pal::Platform;
#[cfg(feature = "topology")]
use crate::pal::NodeLayout;
use crate::pal::linux::{Bindings, BindingsFacade};
#[cfg(feature = "topology")]
use crate::pal::linux::{Filesystem, FilesystemFacade};
use crate::thread_affinity::ThreadHandle;
#[cfg(feature = "topology")]
use crate::MemoryRegionId;
use crate::{AffinityError, ProcessorId};

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform {
    bindings: BindingsFacade::real(),
    #[cfg(feature = "topology")]
    fs: FilesystemFacade::real(),
};

#[expect(
    clippy::cast_sign_loss,
    reason = "CPU_SETSIZE is a small positive constant"
)]
const CPU_SET_CAPACITY: usize = libc::CPU_SETSIZE as usize;

/// The platform that matches the crate's build target.
///
/// You would only use a different platform in unit tests that need to mock the platform.
/// Even then, whenever possible, unit tests should use the real platform for maximum realism.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    bindings: BindingsFacade,

    /// Source of the sysfs topology files.
    #[cfg(feature = "topology")]
    fs: FilesystemFacade,
}

impl Platform for BuildTargetPlatform {
    #[cfg(feature = "topology")]
    fn numa_nodes(&self) -> io::Result<Vec<NodeLayout>> {
        let Some(online) = self.fs.get_numa_node_online_contents() else {
            // Without NUMA support in the kernel, all memory is in a single memory region.
            let processors = parse_cpulist(&self.fs.get_cpu_present_contents()?)?;
            return Ok(vec![NodeLayout::new(0, processors)]);
        };

        parse_cpulist(&online)?
            .into_iter()
            .map(|node| {
                let cpulist = self.fs.get_numa_node_cpulist_contents(node)?;
                Ok(NodeLayout::new(node, parse_cpulist(&cpulist)?))
            })
            .collect()
    }

    #[cfg(feature = "topology")]
    fn bind_memory(
        &self,
        start: NonNull<u8>,
        len: usize,
        node: MemoryRegionId,
    ) -> io::Result<()> {
        self.bindings.mbind(start, len, &node_mask(node))
    }

    fn current_thread(&self) -> ThreadHandle {
        ThreadHandle::from_raw(self.bindings.pthread_self())
    }

    fn set_thread_affinity(
        &self,
        thread: ThreadHandle,
        processor: ProcessorId,
    ) -> Result<(), AffinityError> {
        let index = usize::try_from(processor)
            .ok()
            .filter(|index| *index < CPU_SET_CAPACITY)
            .ok_or(AffinityError::ProcessorOutOfRange { processor })?;

        // SAFETY: Zero-initialized cpu_set_t is a valid value.
        let mut cpu_set: libc::cpu_set_t = unsafe { mem::zeroed() };

        // SAFETY: No safety requirements. The index is within the capacity of the set.
        unsafe {
            libc::CPU_SET(index, &mut cpu_set);
        }

        self.bindings
            .pthread_setaffinity_np(thread.raw(), &cpu_set)
            .map_err(|source| AffinityError::Rejected {
                processor,
                status: source
                    .raw_os_error()
                    .filter(|code| *code != 0)
                    .unwrap_or(AffinityError::GENERIC_FAILURE_STATUS),
                source,
            })
    }
}

/// A node mask for `mbind()` with only the bit of the given memory region set.
#[cfg(feature = "topology")]
fn node_mask(node: MemoryRegionId) -> Vec<c_ulong> {
    let word_bits = c_ulong::BITS;

    let word_count = usize::try_from(node / word_bits)
        .unwrap_or(usize::MAX)
        .saturating_add(1);

    let mut mask = vec![0; word_count];

    if let Some(last) = mask.last_mut() {
        *last = 1 << (node % word_bits);
    }

    mask
}

#[cfg(feature = "topology")]
fn parse_cpulist(contents: &str) -> io::Result<Vec<u32>> {
    cpulist::parse(contents.trim()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #[cfg(feature = "topology")]
    use std::collections::HashSet;
    use std::io;

    #[cfg(feature = "topology")]
    use mockall::predicate::eq;

    use super::*;
    use crate::pal::linux::MockBindings;
    #[cfg(feature = "topology")]
    use crate::{AllocationFlags, MemoryRegion, PageRegion};
    #[cfg(feature = "topology")]
    use crate::pal::linux::MockFilesystem;

    #[cfg(feature = "topology")]
    fn platform_with_fs(fs: MockFilesystem) -> BuildTargetPlatform {
        BuildTargetPlatform {
            bindings: BindingsFacade::from_mock(MockBindings::new()),
            fs: FilesystemFacade::from_mock(fs),
        }
    }

    fn platform_with_bindings(bindings: MockBindings) -> BuildTargetPlatform {
        BuildTargetPlatform {
            bindings: BindingsFacade::from_mock(bindings),
            #[cfg(feature = "topology")]
            fs: FilesystemFacade::from_mock(MockFilesystem::new()),
        }
    }

    /// Simulates a system whose memory regions each contain the listed processors.
    #[cfg(feature = "topology")]
    fn simulate_nodes(
        fs: &mut MockFilesystem,
        online: &'static str,
        nodes: &[(u32, &'static str)],
    ) {
        fs.expect_get_numa_node_online_contents()
            .times(1)
            .return_const(Some(online.to_string()));

        for (node, cpulist) in nodes.iter().copied() {
            fs.expect_get_numa_node_cpulist_contents()
                .with(eq(node))
                .times(1)
                .returning(move |_| Ok(format!("{cpulist}\n")));
        }
    }

    #[cfg(feature = "topology")]
    #[test]
    fn two_nodes_four_processors_each() {
        let mut fs = MockFilesystem::new();
        simulate_nodes(&mut fs, "0-1\n", &[(0, "0-3"), (1, "4-7")]);

        let nodes = platform_with_fs(fs).numa_nodes().unwrap();

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
    fn interleaved_processors_and_sparse_node_ids() {
        let mut fs = MockFilesystem::new();
        simulate_nodes(&mut fs, "0,2", &[(0, "0,2,4,6"), (2, "1,3,5,7")]);

        let nodes = platform_with_fs(fs).numa_nodes().unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], NodeLayout::new(0, vec![0, 2, 4, 6]));
        assert_eq!(nodes[1], NodeLayout::new(2, vec![1, 3, 5, 7]));
    }

    #[cfg(feature = "topology")]
    #[test]
    fn memory_only_node_has_no_processors() {
        let mut fs = MockFilesystem::new();
        simulate_nodes(&mut fs, "0-1", &[(0, "0-1"), (1, "")]);

        let nodes = platform_with_fs(fs).numa_nodes().unwrap();

        assert_eq!(nodes[1], NodeLayout::new(1, Vec::new()));
    }

    #[cfg(feature = "topology")]
    #[test]
    fn without_numa_support_single_node_has_present_processors() {
        let mut fs = MockFilesystem::new();

        fs.expect_get_numa_node_online_contents()
            .times(1)
            .return_const(None::<String>);

        fs.expect_get_cpu_present_contents()
            .times(1)
            .returning(|| Ok("0-5\n".to_string()));

        let nodes = platform_with_fs(fs).numa_nodes().unwrap();

        assert_eq!(nodes, vec![NodeLayout::new(0, vec![0, 1, 2, 3, 4, 5])]);
    }

    #[cfg(feature = "topology")]
    #[test]
    fn unreadable_node_cpulist_is_error() {
        let mut fs = MockFilesystem::new();

        fs.expect_get_numa_node_online_contents()
            .times(1)
            .return_const(Some("0".to_string()));

        fs.expect_get_numa_node_cpulist_contents()
            .times(1)
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let error = platform_with_fs(fs).numa_nodes().unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::PermissionDenied);
    }

    #[cfg(feature = "topology")]
    #[test]
    fn malformed_online_list_is_error() {
        let mut fs = MockFilesystem::new();

        fs.expect_get_numa_node_online_contents()
            .times(1)
            .return_const(Some("zero-one".to_string()));

        let error = platform_with_fs(fs).numa_nodes().unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[cfg(feature = "topology")]
    #[test]
    fn node_mask_sets_single_bit() {
        assert_eq!(node_mask(0), vec![1]);
        assert_eq!(node_mask(3), vec![0b1000]);
        assert_eq!(node_mask(c_ulong::BITS), vec![0, 1]);
        assert_eq!(node_mask(c_ulong::BITS + 1), vec![0, 0b10]);
    }

    #[cfg(feature = "topology")]
    #[test]
    fn bind_memory_binds_to_requested_node() {
        let mut buffer = [0_u8; 16];
        let start = NonNull::from(&mut buffer).cast::<u8>();

        // The predicate must be Send, which a pointer is not, so compare addresses.
        let start_addr = start.as_ptr().addr();

        let mut bindings = MockBindings::new();

        bindings
            .expect_mbind()
            .withf(move |s, len, mask| {
                s.as_ptr().addr() == start_addr && *len == 16 && *mask == [0b100]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        platform_with_bindings(bindings)
            .bind_memory(start, 16, 2)
            .unwrap();
    }

    #[cfg(feature = "topology")]
    #[test]
    fn bind_memory_failure_is_returned() {
        let mut buffer = [0_u8; 16];
        let start = NonNull::from(&mut buffer).cast::<u8>();

        let mut bindings = MockBindings::new();

        bindings
            .expect_mbind()
            .times(1)
            .returning(|_, _, _| Err(io::Error::from_raw_os_error(libc::EINVAL)));

        let error = platform_with_bindings(bindings)
            .bind_memory(start, 16, 5)
            .unwrap_err();

        assert_eq!(error.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn current_thread_comes_from_bindings() {
        let mut bindings = MockBindings::new();

        let raw: libc::pthread_t = 42;
        bindings.expect_pthread_self().times(1).return_const(raw);

        let thread = platform_with_bindings(bindings).current_thread();

        assert_eq!(thread.raw(), 42);
    }

    #[test]
    fn set_thread_affinity_sets_exactly_one_processor() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_pthread_setaffinity_np()
            .withf(|thread, cpu_set| {
                // SAFETY: No safety requirements.
                let set_count = unsafe { libc::CPU_COUNT(cpu_set) };
                // SAFETY: No safety requirements.
                let is_set = unsafe { libc::CPU_ISSET(7, cpu_set) };

                *thread == 99 && set_count == 1 && is_set
            })
            .times(1)
            .returning(|_, _| Ok(()));

        platform_with_bindings(bindings)
            .set_thread_affinity(ThreadHandle::from_raw(99), 7)
            .unwrap();
    }

    #[test]
    fn set_thread_affinity_out_of_range_does_not_call_os() {
        // No expectations - any call to the bindings would panic.
        let platform = platform_with_bindings(MockBindings::new());

        let error = platform
            .set_thread_affinity(ThreadHandle::from_raw(1), 100_000)
            .unwrap_err();

        assert!(matches!(
            error,
            AffinityError::ProcessorOutOfRange { processor: 100_000 }
        ));
        assert_eq!(error.status_code(), AffinityError::GENERIC_FAILURE_STATUS);
    }

    #[test]
    fn set_thread_affinity_rejection_reports_errno() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_pthread_setaffinity_np()
            .times(1)
            .returning(|_, _| Err(io::Error::from_raw_os_error(libc::EINVAL)));

        let error = platform_with_bindings(bindings)
            .set_thread_affinity(ThreadHandle::from_raw(1), 900)
            .unwrap_err();

        assert_eq!(error.status_code(), libc::EINVAL);
    }

    #[cfg(feature = "topology")]
    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
    fn real_bind_memory_arguments_are_accepted() {
        let region = PageRegion::allocate(64 * 1024, AllocationFlags::new()).unwrap();
        let first_node = BUILD_TARGET_PLATFORM.numa_nodes().unwrap()[0].id;

        let result = BUILD_TARGET_PLATFORM.bind_memory(region.as_ptr(), region.len(), first_node);

        // Containers often deny memory policy calls (EPERM) and some kernels lack NUMA support
        // (ENOSYS). Malformed arguments would show up as EINVAL.
        if let Err(error) = result {
            assert_ne!(error.raw_os_error(), Some(libc::EINVAL), "{error}");
        }
    }

    #[cfg(feature = "topology")]
    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
    fn real_topology_smoke_test() {
        let nodes = BUILD_TARGET_PLATFORM.numa_nodes().unwrap();

        assert!(!nodes.is_empty());
        assert!(nodes.iter().any(|node| !node.processors.is_empty()));

        // Every processor belongs to at most one memory region.
        let mut seen = HashSet::new();
        for processor in nodes.iter().flat_map(|node| node.processors.iter()) {
            assert!(seen.insert(*processor));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot call platform APIs.
    fn real_affinity_to_current_processor() {
        std::thread::spawn(|| {
            // The processor we are running on is by definition one we are allowed to use.
            // SAFETY: No safety requirements.
            let current = unsafe { libc::sched_getcpu() };
            let current = ProcessorId::try_from(current).unwrap();

            let thread = BUILD_TARGET_PLATFORM.current_thread();
            BUILD_TARGET_PLATFORM
                .set_thread_affinity(thread, current)
                .unwrap();

            // SAFETY: No safety requirements.
            let after = unsafe { libc::sched_getcpu() };
            assert_eq!(ProcessorId::try_from(after).unwrap(), current);
        })
        .join()
        .unwrap();
    }
}
