use std::io;
use std::thread::JoinHandle;

use thiserror::Error;

use crate::ProcessorId;
use crate::pal::{Platform, PlatformFacade};

/// Binds the current thread to a single processor.
///
/// After this returns successfully, the operating system only schedules the current thread on
/// the given processor.
///
/// On Apple platforms the binding is a scheduling hint (an affinity tag) that the kernel may
/// choose not to honor, so success there does not guarantee the thread runs on that processor.
///
/// # Errors
///
/// Returns an error if the processor ID cannot be expressed on this platform, if the operating
/// system rejects the binding (e.g. because no such processor exists or the process is not
/// allowed to use it) or if the platform does not support binding threads to processors.
/// The thread remains usable either way; whether the failure matters is up to the caller.
///
/// # Example
///
/// ```
/// use numa_placement::set_thread_affinity;
///
/// match set_thread_affinity(0) {
///     Ok(()) => println!("running on processor 0 from now on"),
///     Err(e) => println!("continuing without affinity (status {}): {e}", e.status_code()),
/// }
/// ```
pub fn set_thread_affinity(processor: ProcessorId) -> Result<(), AffinityError> {
    set_current_thread_affinity_on(&PlatformFacade::real(), processor)
}

/// Binds another thread to a single processor.
///
/// Borrowing the join handle guarantees that the thread has not been joined yet, which keeps the
/// operating system handle of the thread valid for the duration of the call.
///
/// The same platform caveats apply as for [`set_thread_affinity()`].
///
/// # Errors
///
/// Same as [`set_thread_affinity()`].
pub fn set_thread_affinity_for<T>(
    thread: &JoinHandle<T>,
    processor: ProcessorId,
) -> Result<(), AffinityError> {
    PlatformFacade::real().set_thread_affinity(ThreadHandle::of(thread), processor)
}

fn set_current_thread_affinity_on(
    pal: &PlatformFacade,
    processor: ProcessorId,
) -> Result<(), AffinityError> {
    pal.set_thread_affinity(pal.current_thread(), processor)
}

/// The reason a thread could not be bound to a processor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AffinityError {
    /// The processor ID is too large to be expressed in the affinity mask of this platform.
    #[error("processor {processor} cannot be expressed in a thread affinity mask on this platform")]
    ProcessorOutOfRange {
        /// The processor that was requested.
        processor: ProcessorId,
    },

    /// The operating system rejected the request.
    #[error("the operating system refused to bind the thread to processor {processor} (status {status})")]
    Rejected {
        /// The processor that was requested.
        processor: ProcessorId,

        /// The platform-specific status code describing the failure. Never zero.
        status: i32,

        /// The error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// Binding threads to processors is not supported on this platform.
    #[error("binding threads to processors is not supported on this platform")]
    Unsupported,
}

impl AffinityError {
    /// The status code for failures that did not come from an operating system call.
    pub const GENERIC_FAILURE_STATUS: i32 = -1;

    /// The status code used on Windows when the operating system rejects the affinity mask.
    pub const MASK_REJECTED_STATUS: i32 = -2;

    /// The nonzero, platform-specific status code for this failure.
    ///
    /// * On Linux, this is the `errno` value returned by `pthread_setaffinity_np()`.
    /// * On Windows, this is [`MASK_REJECTED_STATUS`][Self::MASK_REJECTED_STATUS].
    /// * On Apple platforms, this is the `kern_return_t` of `thread_policy_set()`.
    /// * Failures detected before calling the operating system use
    ///   [`GENERIC_FAILURE_STATUS`][Self::GENERIC_FAILURE_STATUS].
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            Self::ProcessorOutOfRange { .. } | Self::Unsupported => Self::GENERIC_FAILURE_STATUS,
            Self::Rejected { status, .. } => *status,
        }
    }
}

#[cfg(unix)]
pub(crate) type RawThread = libc::pthread_t;

#[cfg(windows)]
pub(crate) type RawThread = windows::Win32::Foundation::HANDLE;

#[cfg(not(any(unix, windows)))]
pub(crate) type RawThread = std::thread::ThreadId;

/// Operating system handle of a thread, in the form the platform affinity APIs accept.
///
/// A value of this type is only created right before it is used, from the current thread or from
/// a borrowed join handle, so the thread it refers to is always alive (or at least not yet joined)
/// while the value is in use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ThreadHandle {
    raw: RawThread,
}

// SAFETY: Thread handles are process-wide identifiers that any thread may use to refer to
// the thread in question. They are pointers on some platforms, which is why the compiler cannot
// see this on its own.
unsafe impl Send for ThreadHandle {}
// SAFETY: See above. The handle is an immutable identifier.
unsafe impl Sync for ThreadHandle {}

impl ThreadHandle {
    pub(crate) const fn from_raw(raw: RawThread) -> Self {
        Self { raw }
    }

    pub(crate) const fn raw(self) -> RawThread {
        self.raw
    }

    /// The handle of the calling thread, obtained directly from the operating system.
    ///
    /// Platforms with mockable bindings obtain this through their bindings instead.
    #[cfg_attr(
        all(not(test), not(miri), any(target_os = "linux", windows, target_vendor = "apple")),
        expect(dead_code, reason = "only the fallback platform uses this outside of tests")
    )]
    pub(crate) fn current() -> Self {
        #[cfg(unix)]
        {
            // SAFETY: No safety requirements.
            Self::from_raw(unsafe { libc::pthread_self() })
        }

        #[cfg(windows)]
        {
            // SAFETY: No safety requirements. This is a pseudo-handle that does not need closing
            // and is only meaningful on the current thread.
            Self::from_raw(unsafe { windows::Win32::System::Threading::GetCurrentThread() })
        }

        #[cfg(not(any(unix, windows)))]
        {
            Self::from_raw(std::thread::current().id())
        }
    }

    /// The handle of the thread behind a join handle.
    pub(crate) fn of<T>(thread: &JoinHandle<T>) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::thread::JoinHandleExt;

            #[allow(
                trivial_numeric_casts,
                clippy::unnecessary_cast,
                reason = "pthread_t is an integer on some platforms and a pointer on others"
            )]
            Self::from_raw(thread.as_pthread_t() as libc::pthread_t)
        }

        #[cfg(windows)]
        {
            use std::os::windows::io::AsRawHandle;

            Self::from_raw(windows::Win32::Foundation::HANDLE(thread.as_raw_handle()))
        }

        #[cfg(not(any(unix, windows)))]
        {
            Self::from_raw(thread.thread().id())
        }
    }
}
