use std::fmt::Debug;
use std::io;
#[cfg(test)]
use std::sync::Arc;

#[cfg(feature = "topology")]
use windows::Win32::System::SystemInformation::GROUP_AFFINITY;

#[cfg(test)]
use crate::pal::windows::MockBindings;
use crate::pal::windows::{Bindings, BuildTargetBindings};
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
    fn get_current_thread(&self) -> ThreadHandle {
        match self {
            Self::Real(bindings) => bindings.get_current_thread(),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_current_thread(),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn set_thread_affinity_mask(&self, thread: ThreadHandle, mask: usize) -> io::Result<()> {
        match self {
            Self::Real(bindings) => bindings.set_thread_affinity_mask(thread, mask),
            #[cfg(test)]
            Self::Mock(mock) => mock.set_thread_affinity_mask(thread, mask),
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn get_numa_highest_node_number(&self) -> io::Result<u32> {
        match self {
            Self::Real(bindings) => bindings.get_numa_highest_node_number(),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_numa_highest_node_number(),
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn get_numa_node_processor_mask_ex(&self, node: u16) -> io::Result<GROUP_AFFINITY> {
        match self {
            Self::Real(bindings) => bindings.get_numa_node_processor_mask_ex(node),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_numa_node_processor_mask_ex(node),
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn get_maximum_processor_group_count(&self) -> u16 {
        match self {
            Self::Real(bindings) => bindings.get_maximum_processor_group_count(),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_maximum_processor_group_count(),
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn get_maximum_processor_count(&self, group_number: u16) -> u32 {
        match self {
            Self::Real(bindings) => bindings.get_maximum_processor_count(group_number),
            #[cfg(test)]
            Self::Mock(mock) => mock.get_maximum_processor_count(group_number),
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
