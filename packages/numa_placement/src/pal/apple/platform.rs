use std::io;
use std::num::NonZero;
#[cfg(feature = "topology")]
use std::ptr::NonNull;
use std::thread;

use libc::{KERN_SUCCESS, integer_t};

use crate::pal::Platform;
use crate::pal::apple::{Bindings, BindingsFacade};
#[cfg(feature = "topology")]
use crate::pal::NodeLayout;
use crate::thread_affinity::ThreadHandle;
#[cfg(feature = "topology")]
use crate::MemoryRegionId;
use crate::{AffinityError, ProcessorId};

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform =
    BuildTargetPlatform::new(BindingsFacade::real());

/// The platform that matches the crate's build target.
///
/// Apple platforms have a single memory region and only accept thread affinity as a hint.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    bindings: BindingsFacade,
}

impl BuildTargetPlatform {
    pub(crate) const fn new(bindings: BindingsFacade) -> Self {
        Self { bindings }
    }
}

impl Platform for BuildTargetPlatform {
    #[cfg(feature = "topology")]
    fn numa_nodes(&self) -> io::Result<Vec<NodeLayout>> {
        Ok(vec![NodeLayout::single_node_of_available_processors()])
    }

    #[cfg(feature = "topology")]
    fn bind_memory(
        &self,
        _start: NonNull<u8>,
        _len: usize,
        _node: MemoryRegionId,
    ) -> io::Result<()> {
        // All memory is in the only memory region there is.
        Ok(())
    }

    fn current_thread(&self) -> ThreadHandle {
        self.bindings.pthread_self()
    }

    fn set_thread_affinity(
        &self,
        thread: ThreadHandle,
        processor: ProcessorId,
    ) -> Result<(), AffinityError> {
        // The kernel accepts any tag, so processors the machine does not have are caught here.
        let processor_count = thread::available_parallelism().map_or(1, NonZero::get);

        let exists = usize::try_from(processor).is_ok_and(|index| index < processor_count);

        if !exists {
            return Err(AffinityError::ProcessorOutOfRange { processor });
        }

        // The tag is only a grouping hint. Tag 0 is the kernel's "no affinity" value, so
        // processor 0 effectively clears any earlier hint.
        let tag = integer_t::try_from(processor)
            .ok()
            .ok_or(AffinityError::ProcessorOutOfRange { processor })?;

        match self.bindings.set_affinity_tag(thread, tag) {
            KERN_SUCCESS => Ok(()),
            status => Err(AffinityError::Rejected {
                processor,
                status,
                source: io::Error::other(format!("thread_policy_set() returned {status}")),
            }),
        }
    }
}
