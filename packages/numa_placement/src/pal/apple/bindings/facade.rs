use std::fmt::Debug;
#[cfg(test)]
use std::sync::Arc;

use libc::{integer_t, kern_return_t};

#[cfg(test)]
use crate::pal::apple::MockBindings;
use crate::pal::apple::{Bindings, BuildTargetBindings};
use crate::thread_affinity::ThreadHandle;

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
    fn pthread_self(&self) -> ThreadHandle {
        match self {
            Self::Real(bindings) => bindings.pthread_self(),
            #[cfg(test)]
            Self::Mock(mock) => mock.pthread_self(),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn set_affinity_tag(&self, thread: ThreadHandle, tag: integer_t) -> kern_return_t {
        match self {
            Self::Real(bindings) => bindings.set_affinity_tag(thread, tag),
            #[cfg(test)]
            Self::Mock(mock) => mock.set_affinity_tag(thread, tag),
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
