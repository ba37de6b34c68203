//! Platform Abstraction Layer (PAL). This is private API.
//!
//! Every supported operating system provides a `BuildTargetPlatform` that answers the three
//! questions this package asks of the platform: which memory regions exist and which processors
//! belong to them, how to bind memory to a memory region and how to bind a thread to a processor.

mod abstractions;
pub(crate) use abstractions::*;

mod facade;
pub(crate) use facade::*;

#[cfg(all(target_os = "linux", not(miri)))]
mod linux;
#[cfg(all(target_os = "linux", not(miri)))]
pub(crate) use linux::*;

#[cfg(all(windows, not(miri)))]
mod windows;
#[cfg(all(windows, not(miri)))]
pub(crate) use windows::*;

#[cfg(all(target_vendor = "apple", not(miri)))]
mod apple;
#[cfg(all(target_vendor = "apple", not(miri)))]
pub(crate) use apple::*;

// The fallback module is compiled in test mode on all platforms, under Miri, and as the primary
// implementation on unsupported platforms. It is only glob-imported when it is the primary
// implementation. Tests on supported platforms reach it via the explicit `fallback::` path.
#[cfg(any(
    test,
    miri,
    not(any(target_os = "linux", windows, target_vendor = "apple"))
))]
pub(crate) mod fallback;

#[cfg(any(
    miri,
    not(any(target_os = "linux", windows, target_vendor = "apple"))
))]
pub(crate) use fallback::*;
