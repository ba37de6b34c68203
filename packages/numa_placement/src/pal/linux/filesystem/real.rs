use std::{fs, io};

use crate::pal::linux::Filesystem;

/// The virtual filesystem for the real operating system that the build is targeting.
///
/// You would only use different filesystems in PAL unit tests that need to use a mock filesystem.
/// Even then, whenever possible, unit tests should use the real filesystem for maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetFilesystem;

impl Filesystem for BuildTargetFilesystem {
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_numa_node_online_contents(&self) -> Option<String> {
        fs::read_to_string("/sys/devices/system/node/online").ok()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_numa_node_cpulist_contents(&self, node_index: u32) -> io::Result<String> {
        fs::read_to_string(format!(
            "/sys/devices/system/node/node{node_index}/cpulist"
        ))
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn get_cpu_present_contents(&self) -> io::Result<String> {
        fs::read_to_string("/sys/devices/system/cpu/present")
    }
}
