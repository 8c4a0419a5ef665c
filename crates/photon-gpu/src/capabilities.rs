//! GPU capability detection.

use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub const fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Static capabilities of a device candidate.
///
/// A pure read over driver-reported data; queried fresh per candidate and
/// discarded with the selection step, never cached across device changes.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// GPU vendor
    pub vendor: GpuVendor,
    /// Device name
    pub device_name: String,
    /// Reported device type (discrete, integrated, virtual, CPU)
    pub device_type: vk::PhysicalDeviceType,
    /// Vulkan API version
    pub api_version: u32,
    /// Driver version
    pub driver_version: u32,
    /// Available device extensions
    pub available_extensions: HashSet<String>,
}

impl DeviceCapabilities {
    /// Query capabilities from a physical device.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let properties = instance.get_physical_device_properties(physical_device);

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();

        let available_extensions: HashSet<String> = extensions
            .iter()
            .filter_map(|ext| {
                CStr::from_ptr(ext.extension_name.as_ptr())
                    .to_str()
                    .ok()
                    .map(String::from)
            })
            .collect();

        let vendor = GpuVendor::from_vendor_id(properties.vendor_id);
        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        Self {
            vendor,
            device_name,
            device_type: properties.device_type,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
            available_extensions,
        }
    }

    /// Whether the device is a discrete GPU.
    ///
    /// A quality filter rather than a correctness requirement: integrated,
    /// virtual, and CPU devices are rejected outright.
    pub fn is_discrete(&self) -> bool {
        self.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }

    /// Required extensions not present on this device.
    pub fn missing_extensions(&self, required: &[&CStr]) -> Vec<String> {
        required
            .iter()
            .filter_map(|ext| ext.to_str().ok())
            .filter(|name| !self.available_extensions.contains(*name))
            .map(String::from)
            .collect()
    }

    /// Whether the device's extension set is a superset of `required`.
    pub fn supports_extensions(&self, required: &[&CStr]) -> bool {
        self.missing_extensions(required).is_empty()
    }

    /// Get a human-readable summary of capabilities.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}) - Vulkan {}.{}.{}",
            self.device_name,
            self.vendor,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities_with_extensions(extensions: &[&str]) -> DeviceCapabilities {
        DeviceCapabilities {
            vendor: GpuVendor::Other(0),
            device_name: "test".to_string(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::API_VERSION_1_1,
            driver_version: 0,
            available_extensions: extensions.iter().map(|ext| (*ext).to_string()).collect(),
        }
    }

    #[test]
    fn vendor_identification() {
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
    }

    #[test]
    fn extension_superset_check() {
        let caps = capabilities_with_extensions(&["VK_KHR_swapchain", "VK_KHR_maintenance1"]);
        assert!(caps.supports_extensions(&[ash::khr::swapchain::NAME]));
    }

    #[test]
    fn missing_extensions_are_reported_by_name() {
        let caps = capabilities_with_extensions(&[]);
        let missing = caps.missing_extensions(&[ash::khr::swapchain::NAME]);
        assert_eq!(missing, vec!["VK_KHR_swapchain".to_string()]);
    }
}
