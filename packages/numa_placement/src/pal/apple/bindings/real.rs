use libc::{integer_t, kern_return_t};

use crate::pal::apple::Bindings;
use crate::thread_affinity::ThreadHandle;

/// FFI bindings that target the real operating system that the build is targeting.
///
/// You would only use different bindings in PAL unit tests that need to use mock bindings.
/// Even then, whenever possible, unit tests should use real bindings for maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

impl Bindings for BuildTargetBindings {
    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn pthread_self(&self) -> ThreadHandle {
        // SAFETY: No safety requirements.
        ThreadHandle::from_raw(unsafe { libc::pthread_self() })
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, only tested via integration tests.
    fn set_affinity_tag(&self, thread: ThreadHandle, tag: integer_t) -> kern_return_t {
        // SAFETY: The handle refers to a thread that has not been joined yet.
        let port = unsafe { libc::pthread_mach_thread_np(thread.raw()) };

        let mut policy = libc::thread_affinity_policy_data_t { affinity_tag: tag };

        // SAFETY: The policy is a valid value of the flavor we pass and lives for the duration of
        // the call. The count is the size of that flavor in `integer_t` units.
        unsafe {
            libc::thread_policy_set(
                port,
                libc::THREAD_AFFINITY_POLICY,
                (&raw mut policy).cast::<integer_t>(),
                libc::THREAD_AFFINITY_POLICY_COUNT,
            )
        }
    }
}
