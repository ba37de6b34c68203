use std::io;
use std::mem;
#[cfg(feature = "topology")]
use std::ptr::NonNull;

#[cfg(feature = "topology")]
use libc::c_ulong;
use libc::{cpu_set_t, pthread_t};

use crate::pal::linux::Bindings;

/// Restricts allocations to the given set of memory regions. Not exported by `libc`.
#[cfg(feature = "topology")]
const MPOL_BIND: c_ulong = 2;

/// No `MPOL_F_*` flags.
#[cfg(feature = "topology")]
const MBIND_FLAGS: c_ulong = 0;

/// FFI bindings that target the real operating system that the build is targeting.
///
/// You would only use different bindings in PAL unit tests that need to use mock bindings.
/// Even then, whenever possible, unit tests should use real bindings for maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

impl Bindings for BuildTargetBindings {
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn pthread_self(&self) -> pthread_t {
        // SAFETY: No safety requirements.
        unsafe { libc::pthread_self() }
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn pthread_setaffinity_np(&self, thread: pthread_t, cpuset: &cpu_set_t) -> io::Result<()> {
        // SAFETY: The thread handle refers to a live thread (see trait docs) and the set is a
        // valid reference of the exact size we pass along.
        let result =
            unsafe { libc::pthread_setaffinity_np(thread, mem::size_of::<cpu_set_t>(), cpuset) };

        // Unlike most libc functions, this one returns the error code instead of setting errno.
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::from_raw_os_error(result))
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn mbind(&self, start: NonNull<u8>, len: usize, node_mask: &[c_ulong]) -> io::Result<()> {
        // The kernel treats `maxnode` as one past the last valid bit.
        let max_node = node_mask
            .len()
            .checked_mul(c_ulong::BITS as usize)
            .and_then(|bits| bits.checked_add(1))
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;

        // SAFETY: mbind only changes the memory policy of the range and does not access the
        // memory itself. The mask pointer is valid for `node_mask.len()` words and `max_node`
        // does not make the kernel read beyond that.
        let result = unsafe {
            libc::syscall(
                libc::SYS_mbind,
                start.as_ptr(),
                len,
                MPOL_BIND,
                node_mask.as_ptr(),
                max_node,
                MBIND_FLAGS,
            )
        };

        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}
