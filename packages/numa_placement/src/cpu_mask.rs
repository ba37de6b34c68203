use crate::ProcessorId;

/// Returns the ID of the processor that corresponds to the `index`-th (0-based) set bit of an
/// affinity mask, counting from bit 0 upward.
///
/// Returns `None` if the mask has `index` or fewer bits set.
///
/// The result depends only on the arguments. Calling this with different masks in any order,
/// from any number of threads, always yields results for the mask actually passed in.
///
/// # Example
///
/// ```
/// use numa_placement::cpuid_from_mask;
///
/// // Processors 0 and 2 are enabled.
/// let mask = 0b0000_0101;
///
/// assert_eq!(cpuid_from_mask(mask, 0), Some(0));
/// assert_eq!(cpuid_from_mask(mask, 1), Some(2));
/// assert_eq!(cpuid_from_mask(mask, 2), None);
/// ```
#[must_use]
pub fn cpuid_from_mask(mask: u64, index: usize) -> Option<ProcessorId> {
    mask_processors(mask).nth(index)
}

/// Iterates over the processor IDs enabled in an affinity mask, in ascending order.
///
/// # Example
///
/// ```
/// use numa_placement::mask_processors;
///
/// let processors: Vec<_> = mask_processors(0b1011_0000).collect();
/// assert_eq!(processors, vec![4, 5, 7]);
/// ```
pub fn mask_processors(mask: u64) -> impl Iterator<Item = ProcessorId> + Clone {
    (0..u64::BITS).filter(move |bit| mask & (1 << bit) != 0)
}

/// Renders an affinity mask as a string of `'0'` and `'1'` characters, most significant bit first.
///
/// The string starts at the highest set bit and keeps every lower bit down to bit 0, so its
/// length is the position of the highest set bit plus one. A mask with no bits set renders as an
/// empty string.
///
/// # Example
///
/// ```
/// use numa_placement::mask_to_string;
///
/// assert_eq!(mask_to_string(0b1010), "1010");
/// assert_eq!(mask_to_string(0), "");
/// ```
#[must_use]
pub fn mask_to_string(mask: u64) -> String {
    if mask == 0 {
        // The binary formatter would give us "0" but no processor is selected, so nothing to show.
        return String::new();
    }

    format!("{mask:b}")
}
