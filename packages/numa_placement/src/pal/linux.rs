mod bindings;
pub(crate) use bindings::*;

#[cfg(feature = "topology")]
mod filesystem;
#[cfg(feature = "topology")]
pub(crate) use filesystem::*;

mod platform;
pub(crate) use platform::*;
