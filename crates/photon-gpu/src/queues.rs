//! Queue role resolution.
//!
//! Maps abstract queue roles to concrete queue family indices on a physical
//! device, and derives the image sharing decision for resources accessed by
//! both the graphics and presentation families.

use ash::vk;

use crate::error::{GpuError, Result};

/// Abstract roles a queue family can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueRole {
    Graphics,
    Presentation,
    Compute,
}

impl QueueRole {
    /// Roles a device must provide to be usable.
    pub const REQUIRED: [Self; 3] = [Self::Graphics, Self::Presentation, Self::Compute];
}

/// Resolved role-to-family-index assignments.
///
/// A single family commonly serves several roles at once; duplicate indices
/// across roles are expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueRoleMap {
    graphics: Option<u32>,
    presentation: Option<u32>,
    compute: Option<u32>,
}

impl QueueRoleMap {
    /// Get the family index bound to a role, if any.
    pub const fn get(&self, role: QueueRole) -> Option<u32> {
        match role {
            QueueRole::Graphics => self.graphics,
            QueueRole::Presentation => self.presentation,
            QueueRole::Compute => self.compute,
        }
    }

    /// Bind a role to a family index. A role is never reassigned once bound.
    fn bind(&mut self, role: QueueRole, index: u32) {
        let slot = match role {
            QueueRole::Graphics => &mut self.graphics,
            QueueRole::Presentation => &mut self.presentation,
            QueueRole::Compute => &mut self.compute,
        };
        if slot.is_none() {
            *slot = Some(index);
        }
    }

    /// Whether every required role has been bound.
    pub fn is_complete(&self, required: &[QueueRole]) -> bool {
        required.iter().all(|&role| self.get(role).is_some())
    }

    /// Get the family index bound to a role, converting an unbound role into
    /// an error. A partial map never crosses a component boundary silently.
    pub fn require(&self, role: QueueRole) -> Result<u32> {
        self.get(role).ok_or(GpuError::NoSuitableDevice)
    }
}

/// Resolve queue roles against a device's queue family table.
///
/// Scans the table once in ascending family order, binding each unassigned
/// role to the first family that satisfies it and stopping as soon as every
/// required role is bound. Presentation support is a per-surface property, so
/// it is supplied as a predicate rather than read from the capability flags.
///
/// An incomplete map is returned as-is; the device selector interprets
/// incompleteness as unsuitability, not as an error at this layer.
pub fn resolve_queue_roles(
    families: &[vk::QueueFamilyProperties],
    mut present_support: impl FnMut(u32) -> bool,
    required: &[QueueRole],
) -> QueueRoleMap {
    let mut map = QueueRoleMap::default();

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;
        if family.queue_count == 0 {
            continue;
        }

        for &role in required {
            if map.get(role).is_some() {
                continue;
            }

            let satisfied = match role {
                QueueRole::Graphics => family.queue_flags.contains(vk::QueueFlags::GRAPHICS),
                QueueRole::Compute => family.queue_flags.contains(vk::QueueFlags::COMPUTE),
                QueueRole::Presentation => present_support(index),
            };

            if satisfied {
                map.bind(role, index);
            }
        }

        if map.is_complete(required) {
            break;
        }
    }

    map
}

/// Sharing decision for swapchain images.
///
/// When graphics and presentation resolve to the same family the images are
/// exclusively owned by it. When the families differ the images are shared
/// concurrently across both, trading some throughput for freedom from manual
/// ownership-transfer barriers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    Concurrent(Vec<u32>),
}

impl ImageSharing {
    /// Derive the sharing decision from the resolved graphics and
    /// presentation family indices.
    pub fn derive(graphics: u32, presentation: u32) -> Self {
        if graphics == presentation {
            Self::Exclusive
        } else {
            Self::Concurrent(vec![graphics, presentation])
        }
    }

    /// The Vulkan sharing mode for this decision.
    pub const fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    /// The queue family index list for the swapchain create info.
    ///
    /// Empty in the exclusive case; the distinct index set otherwise.
    pub fn indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(indices) => indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties::default()
            .queue_flags(flags)
            .queue_count(count)
    }

    #[test]
    fn single_family_serves_all_roles() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 1)];
        let map = resolve_queue_roles(&families, |_| true, &QueueRole::REQUIRED);

        assert!(map.is_complete(&QueueRole::REQUIRED));
        assert_eq!(map.get(QueueRole::Graphics), Some(0));
        assert_eq!(map.get(QueueRole::Presentation), Some(0));
        assert_eq!(map.get(QueueRole::Compute), Some(0));
    }

    #[test]
    fn first_satisfying_family_wins() {
        // Both families support graphics; the first must be chosen and never
        // reassigned when the second also matches.
        let families = [
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 1),
        ];
        let map = resolve_queue_roles(&families, |_| false, &[QueueRole::Graphics]);

        assert_eq!(map.get(QueueRole::Graphics), Some(0));
    }

    #[test]
    fn presentation_uses_the_surface_predicate() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::COMPUTE, 1),
        ];
        let map = resolve_queue_roles(&families, |index| index == 1, &QueueRole::REQUIRED);

        assert_eq!(map.get(QueueRole::Graphics), Some(0));
        assert_eq!(map.get(QueueRole::Presentation), Some(1));
        assert_eq!(map.get(QueueRole::Compute), Some(1));
    }

    #[test]
    fn zero_queue_families_are_skipped() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 0),
            family(vk::QueueFlags::GRAPHICS, 1),
        ];
        let map = resolve_queue_roles(&families, |_| false, &[QueueRole::Graphics]);

        assert_eq!(map.get(QueueRole::Graphics), Some(1));
    }

    #[test]
    fn incomplete_map_when_table_is_exhausted() {
        let families = [family(vk::QueueFlags::TRANSFER, 1)];
        let map = resolve_queue_roles(&families, |_| false, &QueueRole::REQUIRED);

        assert!(!map.is_complete(&QueueRole::REQUIRED));
        assert_eq!(map.get(QueueRole::Graphics), None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let families = [
            family(vk::QueueFlags::COMPUTE, 1),
            family(vk::QueueFlags::GRAPHICS, 1),
        ];
        let first = resolve_queue_roles(&families, |index| index == 0, &QueueRole::REQUIRED);
        let second = resolve_queue_roles(&families, |index| index == 0, &QueueRole::REQUIRED);

        assert_eq!(first, second);
    }

    #[test]
    fn same_family_shares_exclusively() {
        let sharing = ImageSharing::derive(0, 0);
        assert_eq!(sharing, ImageSharing::Exclusive);
        assert_eq!(sharing.mode(), vk::SharingMode::EXCLUSIVE);
        assert!(sharing.indices().is_empty());
    }

    #[test]
    fn distinct_families_share_concurrently() {
        let sharing = ImageSharing::derive(0, 2);
        assert_eq!(sharing.mode(), vk::SharingMode::CONCURRENT);

        let mut indices = sharing.indices().to_vec();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 2]);
    }
}
