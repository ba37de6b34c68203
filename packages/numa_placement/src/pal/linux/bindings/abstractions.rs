use std::fmt::Debug;
use std::io;
#[cfg(feature = "topology")]
use std::ptr::NonNull;

#[cfg(feature = "topology")]
use libc::c_ulong;
use libc::{cpu_set_t, pthread_t};

/// Bindings for FFI calls into external libraries (either provided by operating system or not).
///
/// All PAL FFI calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    fn pthread_self(&self) -> pthread_t;

    /// The thread handle must refer to a thread that has not been joined or detached-and-exited.
    fn pthread_setaffinity_np(&self, thread: pthread_t, cpuset: &cpu_set_t) -> io::Result<()>;

    /// Applies the `MPOL_BIND` memory policy to the pages in the range, restricting them to the
    /// memory regions whose bits are set in `node_mask`.
    #[cfg(feature = "topology")]
    fn mbind(&self, start: NonNull<u8>, len: usize, node_mask: &[c_ulong]) -> io::Result<()>;
}
