#[cfg(feature = "topology")]
use std::io;
#[cfg(feature = "topology")]
use std::ptr::NonNull;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::MockPlatform;
#[cfg(feature = "topology")]
use crate::pal::NodeLayout;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform};
use crate::thread_affinity::ThreadHandle;
#[cfg(feature = "topology")]
use crate::MemoryRegionId;
use crate::{AffinityError, ProcessorId};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    Real(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    pub(crate) fn real() -> Self {
        Self::Real(&BUILD_TARGET_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Platform for PlatformFacade {
    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn numa_nodes(&self) -> io::Result<Vec<NodeLayout>> {
        match self {
            Self::Real(p) => p.numa_nodes(),
            #[cfg(test)]
            Self::Mock(p) => p.numa_nodes(),
        }
    }

    #[cfg(feature = "topology")]
    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn bind_memory(
        &self,
        start: NonNull<u8>,
        len: usize,
        node: MemoryRegionId,
    ) -> io::Result<()> {
        match self {
            Self::Real(p) => p.bind_memory(start, len, node),
            #[cfg(test)]
            Self::Mock(p) => p.bind_memory(start, len, node),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn current_thread(&self) -> ThreadHandle {
        match self {
            Self::Real(p) => p.current_thread(),
            #[cfg(test)]
            Self::Mock(p) => p.current_thread(),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Trivial layer, mutation not insightful.
    fn set_thread_affinity(
        &self,
        thread: ThreadHandle,
        processor: ProcessorId,
    ) -> Result<(), AffinityError> {
        match self {
            Self::Real(p) => p.set_thread_affinity(thread, processor),
            #[cfg(test)]
            Self::Mock(p) => p.set_thread_affinity(thread, processor),
        }
    }
}
