use std::fmt::Debug;
use std::io;

#[cfg(feature = "topology")]
use windows::Win32::System::SystemInformation::GROUP_AFFINITY;

use crate::thread_affinity::ThreadHandle;

/// Bindings for FFI calls into external libraries (either provided by operating system or not).
///
/// All PAL FFI calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    /// A pseudo-handle that refers to the calling thread.
    fn get_current_thread(&self) -> ThreadHandle;

    /// Restricts the thread to the processors in `mask`, within the current processor group.
    fn set_thread_affinity_mask(&self, thread: ThreadHandle, mask: usize) -> io::Result<()>;

    #[cfg(feature = "topology")]
    fn get_numa_highest_node_number(&self) -> io::Result<u32>;

    #[cfg(feature = "topology")]
    fn get_numa_node_processor_mask_ex(&self, node: u16) -> io::Result<GROUP_AFFINITY>;

    #[cfg(feature = "topology")]
    fn get_maximum_processor_group_count(&self) -> u16;

    #[cfg(feature = "topology")]
    fn get_maximum_processor_count(&self, group_number: u16) -> u32;
}
