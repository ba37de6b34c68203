use std::fmt::Debug;

use libc::{integer_t, kern_return_t};

use crate::thread_affinity::ThreadHandle;

/// Bindings for FFI calls into external libraries (either provided by operating system or not).
///
/// All PAL FFI calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    fn pthread_self(&self) -> ThreadHandle;

    /// Applies `THREAD_AFFINITY_POLICY` with the given tag to the Mach thread behind `thread`.
    ///
    /// Threads with the same tag are preferably scheduled on processors that share a cache,
    /// threads with different tags on processors that do not.
    fn set_affinity_tag(&self, thread: ThreadHandle, tag: integer_t) -> kern_return_t;
}
