use std::io;

#[cfg(feature = "topology")]
use windows::Win32::System::SystemInformation::{GROUP_AFFINITY, GetNumaNodeProcessorMaskEx};
use windows::Win32::System::Threading::{GetCurrentThread, SetThreadAffinityMask};
#[cfg(feature = "topology")]
use windows::Win32::System::Threading::{
    GetMaximumProcessorCount, GetMaximumProcessorGroupCount, GetNumaHighestNodeNumber,
};

use crate::pal::windows::Bindings;
use crate::thread_affinity::ThreadHandle;

/// FFI bindings that target the real operating system that the build is targeting.
///
/// You would only use different bindings in PAL unit tests that need to use mock bindings.
/// Even then, whenever possible, unit tests should use real bindings for maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

impl Bindings for BuildTargetBindings {
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_current_thread(&self) -> ThreadHandle {
        // SAFETY: No safety requirements. Does not require closing the handle.
        ThreadHandle::from_raw(unsafe { GetCurrentThread() })
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn set_thread_affinity_mask(&self, thread: ThreadHandle, mask: usize) -> io::Result<()> {
        // SAFETY: The handle refers to a thread that has not been joined yet.
        let previous_mask = unsafe { SetThreadAffinityMask(thread.raw(), mask) };

        // The previous mask is never empty, so zero can only mean failure.
        if previous_mask == 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_numa_highest_node_number(&self) -> io::Result<u32> {
        let mut result: u32 = 0;

        // SAFETY: No safety requirements beyond passing valid input.
        unsafe { GetNumaHighestNodeNumber(&raw mut result) }.map_err(io::Error::other)?;

        Ok(result)
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_numa_node_processor_mask_ex(&self, node: u16) -> io::Result<GROUP_AFFINITY> {
        let mut affinity = GROUP_AFFINITY::default();

        // SAFETY: No safety requirements beyond passing valid input.
        unsafe { GetNumaNodeProcessorMaskEx(node, &raw mut affinity) }.map_err(io::Error::other)?;

        Ok(affinity)
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_maximum_processor_group_count(&self) -> u16 {
        // SAFETY: No safety requirements.
        unsafe { GetMaximumProcessorGroupCount() }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_maximum_processor_count(&self, group_number: u16) -> u32 {
        // SAFETY: No safety requirements.
        unsafe { GetMaximumProcessorCount(group_number) }
    }
}
