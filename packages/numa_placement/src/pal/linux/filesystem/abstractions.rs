use std::fmt::Debug;
use std::io;

/// Linux exposes its memory topology as a virtual filesystem. This trait abstracts this virtual
/// filesystem to allow it to be mocked.
///
/// All I/O is synchronous and blocking because we expect it to hit a fast path in the OS, given
/// the data is never on a real storage device.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Filesystem: Debug + Send + Sync + 'static {
    /// Get the contents of the /sys/devices/system/node/online file or `None` if it does
    /// not exist (i.e. the kernel was built without NUMA support).
    ///
    /// This is a cpulist format file ("0,1,2-4,5-10:2" style list) of memory region IDs.
    fn get_numa_node_online_contents(&self) -> Option<String>;

    /// Get the contents of the /sys/devices/system/node/node{}/cpulist file.
    ///
    /// This is a cpulist format file. It is empty for memory regions without processors.
    fn get_numa_node_cpulist_contents(&self, node_index: u32) -> io::Result<String>;

    /// Get the contents of the /sys/devices/system/cpu/present file.
    ///
    /// This is a cpulist format file of all processors that are physically present.
    fn get_cpu_present_contents(&self) -> io::Result<String>;
}
