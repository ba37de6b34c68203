use std::fmt::Debug;
use std::io;
#[cfg(feature = "topology")]
use std::ptr::NonNull;
#[cfg(test)]
use std::sync::Arc;

#[cfg(feature = "topology")]
use libc::c_ulong;
use libc::{cpu_set_t, pthread_t};

#[cfg(test)]
use crate::pal::linux::MockBindings;
use crate::pal::linux::{Bindings, BuildTargetBindings};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum BindingsFacade {
    Real(&'static BuildTargetBindings),

    #[cfg(test)]
    Mock(Arc<MockBindings>),
}

impl BindingsFacade {
    pub(crate) const fn real() -> Self {
        Self::Real(&BuildTargetBindings)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockBindings) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Bindings for BindingsFacade {
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn pthread_self(&self) -> pthread_t {
        match self {
            Self::Real(bindings) => bindings.pthread_self(),
            #[cfg(test)]
            Self::Mock(mock) => mock.pthread_self(),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn pthread_setaffinity_np(&self, thread: pthread_t, cpuset: &cpu_set_t) -> io::Result<()> {
        match self {
            Self::Real(bindings) => bindings.pthread_setaffinity_np(thread, cpuset),
            #[cfg(test)]
            Self::Mock(mock) => mock.pthread_setaffinity_np(thread, cpuset),
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn mbind(&self, start: NonNull<u8>, len: usize, node_mask: &[c_ulong]) -> io::Result<()> {
        match self {
            Self::Real(bindings) => bindings.mbind(start, len, node_mask),
            #[cfg(test)]
            Self::Mock(mock) => mock.mbind(start, len, node_mask),
        }
    }
}

impl Debug for BindingsFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
