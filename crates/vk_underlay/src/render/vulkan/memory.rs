//! Device memory type selection and alignment helpers

use ash::vk;

/// Select the lowest-indexed memory type whose bit is set in `type_bits` and
/// whose property flags are a superset of `required`. Returns `None` when no
/// type qualifies; callers treat that as fatal, there is no fallback
/// property set.
pub fn select_memory_type(
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
    properties: &vk::PhysicalDeviceMemoryProperties,
) -> Option<u32> {
    (0..properties.memory_type_count).find(|&i| {
        (type_bits & (1 << i)) != 0
            && properties.memory_types[i as usize]
                .property_flags
                .contains(required)
    })
}

/// Round `value` up to the next multiple of `alignment`, which must be a
/// power of two.
pub fn align_up(value: vk::DeviceSize, alignment: vk::DeviceSize) -> vk::DeviceSize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut p = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (i, f) in flags.iter().enumerate() {
            p.memory_types[i].property_flags = *f;
        }
        p
    }

    #[test]
    fn picks_lowest_qualifying_index() {
        let host_visible =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        let p = props(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            host_visible,
            host_visible,
        ]);
        // All types allowed: index 1 is the first host-visible one.
        assert_eq!(select_memory_type(0b111, host_visible, &p), Some(1));
        // Type 1 masked out: falls through to index 2.
        assert_eq!(select_memory_type(0b101, host_visible, &p), Some(2));
    }

    #[test]
    fn requires_flag_superset() {
        let p = props(&[vk::MemoryPropertyFlags::HOST_VISIBLE]);
        let wanted =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(select_memory_type(0b1, wanted, &p), None);
        assert_eq!(
            select_memory_type(0b1, vk::MemoryPropertyFlags::HOST_VISIBLE, &p),
            Some(0)
        );
    }

    #[test]
    fn empty_bitmask_finds_nothing() {
        let p = props(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        assert_eq!(
            select_memory_type(0, vk::MemoryPropertyFlags::DEVICE_LOCAL, &p),
            None
        );
    }

    #[test]
    fn align_up_returns_smallest_qualifying_multiple() {
        for &align in &[1u64, 2, 4, 64, 256, 1024] {
            for &value in &[1u64, 63, 64, 65, 196, 255, 256, 1000] {
                let a = align_up(value, align);
                assert!(a >= value);
                assert_eq!(a % align, 0);
                assert!(a < value + align);
            }
        }
    }
}
