//! Physical device selection and logical device creation.

use crate::capabilities::DeviceCapabilities;
use crate::error::{GpuError, Result};
use crate::queues::{resolve_queue_roles, QueueRole, QueueRoleMap};
use crate::surface::SurfaceContext;
use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// Required device extensions.
pub fn required_device_extensions() -> Vec<&'static CStr> {
    vec![ash::khr::swapchain::NAME]
}

/// A device candidate that passed every suitability predicate.
pub struct SelectedDevice {
    pub physical_device: vk::PhysicalDevice,
    pub capabilities: DeviceCapabilities,
    pub queue_roles: QueueRoleMap,
}

/// Queue handles retrieved from the logical device, one per role.
///
/// Non-owning views into the device; they must not outlive it.
#[derive(Clone, Copy)]
pub struct DeviceQueues {
    pub graphics: vk::Queue,
    pub presentation: vk::Queue,
    pub compute: vk::Queue,
}

/// Select a physical device.
///
/// Walks the candidates in enumeration order and takes the first one that
/// satisfies every predicate: discrete GPU, a complete queue role map
/// against this surface, the required extension set, and at least one
/// surface format and present mode. There is no scoring between matches, so
/// the result follows platform enumeration order, which is not guaranteed
/// stable across driver updates.
///
/// # Safety
/// The instance and surface must be valid.
pub unsafe fn select_physical_device(
    instance: &ash::Instance,
    surface: &SurfaceContext,
) -> Result<SelectedDevice> {
    let candidates = instance.enumerate_physical_devices()?;

    if candidates.is_empty() {
        return Err(GpuError::NoCandidates);
    }

    for physical_device in candidates {
        let capabilities = DeviceCapabilities::query(instance, physical_device);

        match check_suitability(instance, physical_device, &capabilities, surface) {
            Ok(queue_roles) => {
                tracing::info!("Selected GPU: {}", capabilities.summary());
                return Ok(SelectedDevice {
                    physical_device,
                    capabilities,
                    queue_roles,
                });
            }
            Err(reason) => {
                tracing::debug!("Rejected {}: {reason}", capabilities.device_name);
            }
        }
    }

    Err(GpuError::NoSuitableDevice)
}

/// Apply the suitability predicates to one candidate.
///
/// Returns the complete role map on success, or the failed predicate as a
/// human-readable rejection reason.
unsafe fn check_suitability(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    capabilities: &DeviceCapabilities,
    surface: &SurfaceContext,
) -> std::result::Result<QueueRoleMap, String> {
    if !capabilities.is_discrete() {
        return Err(format!(
            "not a discrete GPU ({:?})",
            capabilities.device_type
        ));
    }

    let missing = capabilities.missing_extensions(&required_device_extensions());
    if !missing.is_empty() {
        return Err(format!("missing device extensions: {}", missing.join(", ")));
    }

    // Queue family table is derived fresh per candidate and discarded with it.
    let families = instance.get_physical_device_queue_family_properties(physical_device);
    let queue_roles = resolve_queue_roles(
        &families,
        |family| {
            surface
                .supports_presentation(physical_device, family)
                .unwrap_or(false)
        },
        &QueueRole::REQUIRED,
    );
    if !queue_roles.is_complete(&QueueRole::REQUIRED) {
        return Err("queue family table does not cover all required roles".to_string());
    }

    let support = surface
        .support(physical_device)
        .map_err(|e| format!("surface support query failed: {e}"))?;
    if !support.is_adequate() {
        return Err("no surface formats or present modes".to_string());
    }

    Ok(queue_roles)
}

/// Create the logical device and retrieve one queue per role.
///
/// # Safety
/// The instance and physical device must be valid, and the role map must
/// have been resolved against this device.
pub unsafe fn create_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    queue_roles: &QueueRoleMap,
) -> Result<(ash::Device, DeviceQueues)> {
    let graphics = queue_roles.require(QueueRole::Graphics)?;
    let presentation = queue_roles.require(QueueRole::Presentation)?;
    let compute = queue_roles.require(QueueRole::Compute)?;

    // One queue per distinct family; roles sharing a family share the queue.
    let unique_families: HashSet<u32> = [graphics, presentation, compute].into_iter().collect();

    let queue_priority = 1.0_f32;
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
        .iter()
        .map(|&family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(std::slice::from_ref(&queue_priority))
        })
        .collect();

    let extensions = required_device_extensions();
    let extension_names: Vec<*const i8> = extensions.iter().map(|ext| ext.as_ptr()).collect();

    let features = vk::PhysicalDeviceFeatures::default();

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    let device = instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(|e| GpuError::ResourceCreation {
            what: "Device",
            source: e,
        })?;

    let queues = DeviceQueues {
        graphics: device.get_device_queue(graphics, 0),
        presentation: device.get_device_queue(presentation, 0),
        compute: device.get_device_queue(compute, 0),
    };

    Ok((device, queues))
}
