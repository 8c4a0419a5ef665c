//! Surface management and surface configuration negotiation.
//!
//! The surface side of capability queries lives here, together with the
//! pure selection logic that turns driver-reported capability sets into one
//! concrete swapchain configuration. Each choice has a fixed preference
//! order with a documented fallback, so negotiation is deterministic for a
//! given capability snapshot.

use crate::error::{GpuError, Result};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Preferred surface format and color space pair.
pub const PREFERRED_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Surface context for windowed rendering.
///
/// Owns the Vulkan surface handle and the surface extension loader. Created
/// before device selection, since suitability depends on per-surface
/// capabilities.
pub struct SurfaceContext {
    /// The Vulkan surface handle.
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader.
    pub surface_loader: ash::khr::surface::Instance,
}

impl SurfaceContext {
    /// Create a surface for a window.
    ///
    /// # Safety
    /// The instance must be valid and the window must have valid handles
    /// that outlive the surface.
    pub unsafe fn new<W>(entry: &ash::Entry, instance: &ash::Instance, window: &W) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

        let surface = ash_window::create_surface(
            entry,
            instance,
            display.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;

        let surface_loader = ash::khr::surface::Instance::new(entry, instance);

        Ok(Self {
            surface,
            surface_loader,
        })
    }

    /// Query surface support for a device candidate.
    ///
    /// Queried fresh per device and surface pair; the snapshot goes stale if
    /// the surface is resized or the device changes, so it is never cached.
    pub fn support(&self, physical_device: vk::PhysicalDevice) -> Result<SurfaceSupport> {
        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)?;

            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)?;

            let present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)?;

            Ok(SurfaceSupport {
                capabilities,
                formats,
                present_modes,
            })
        }
    }

    /// Whether a queue family on the device can present to this surface.
    pub fn supports_presentation(
        &self,
        physical_device: vk::PhysicalDevice,
        family: u32,
    ) -> Result<bool> {
        unsafe {
            Ok(self.surface_loader.get_physical_device_surface_support(
                physical_device,
                family,
                self.surface,
            )?)
        }
    }

    /// Destroy the surface.
    ///
    /// # Safety
    /// The surface must not be in use.
    pub unsafe fn destroy(&self) {
        self.surface_loader.destroy_surface(self.surface, None);
    }
}

/// Surface capability query result for one device and surface pair.
pub struct SurfaceSupport {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Whether the device reports at least one format and one present mode.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Select the surface format.
///
/// A single `UNDEFINED` entry is the driver's way of accepting any format,
/// in which case the preferred pair is chosen outright. Otherwise the
/// preferred pair is taken if reported, falling back to the first reported
/// entry (arbitrary but deterministic in enumeration order).
///
/// Callers guarantee a non-empty format list; device selection rejects
/// candidates with empty capability sets.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    if available.len() == 1 && available[0].format == vk::Format::UNDEFINED {
        return PREFERRED_FORMAT;
    }

    for format in available {
        if format.format == PREFERRED_FORMAT.format
            && format.color_space == PREFERRED_FORMAT.color_space
        {
            return *format;
        }
    }

    available[0]
}

/// Select the present mode.
///
/// Mailbox gives low-latency triple buffering when available; FIFO is the
/// only mode guaranteed by conformant devices and is the universal fallback.
pub fn select_present_mode(available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if available.contains(&vk::PresentModeKHR::MAILBOX) {
        return vk::PresentModeKHR::MAILBOX;
    }
    vk::PresentModeKHR::FIFO
}

/// Choose the swapchain extent.
///
/// A `u32::MAX` current extent means the driver defers to the application:
/// the requested size is clamped per axis to the reported bounds. Any other
/// current extent is authoritative and used verbatim.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested_width: u32,
    requested_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: requested_width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested_height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Choose the swapchain image count.
///
/// One above the minimum to avoid waiting on the driver, clamped to the
/// maximum when the driver reports a finite one (zero means unbounded).
pub fn image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && count > capabilities.max_image_count {
        count = capabilities.max_image_count;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(
        current: vk::Extent2D,
        min_count: u32,
        max_count: u32,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR::default()
            .current_extent(current)
            .min_image_extent(vk::Extent2D {
                width: 1,
                height: 1,
            })
            .max_image_extent(vk::Extent2D {
                width: 4096,
                height: 4096,
            })
            .min_image_count(min_count)
            .max_image_count(max_count)
    }

    #[test]
    fn undefined_sentinel_yields_preferred_format() {
        let available = [format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)];
        let chosen = select_surface_format(&available);
        assert_eq!(chosen.format, PREFERRED_FORMAT.format);
        assert_eq!(chosen.color_space, PREFERRED_FORMAT.color_space);
    }

    #[test]
    fn preferred_format_found_mid_list() {
        let available = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = select_surface_format(&available);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn fallback_is_first_reported_format() {
        let available = [
            format(vk::Format::R8G8B8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = select_surface_format(&available);
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn mailbox_preferred_when_present() {
        let available = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];
        assert_eq!(select_present_mode(&available), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_fallback_without_mailbox() {
        // FIFO presence is a conformance guarantee, so the fixture carries it.
        let available = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert!(available.contains(&vk::PresentModeKHR::FIFO));
        assert_eq!(select_present_mode(&available), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn deferred_extent_clamps_the_request() {
        let caps = capabilities(
            vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            2,
            0,
        );
        let extent = choose_extent(&caps, 800, 600);
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);

        let oversized = choose_extent(&caps, 10_000, 10_000);
        assert_eq!(oversized.width, 4096);
        assert_eq!(oversized.height, 4096);
    }

    #[test]
    fn concrete_extent_is_authoritative() {
        let caps = capabilities(
            vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            2,
            0,
        );
        let extent = choose_extent(&caps, 800, 600);
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn image_count_is_one_above_minimum() {
        let caps = capabilities(vk::Extent2D::default(), 2, 0);
        assert_eq!(image_count(&caps), 3);
    }

    #[test]
    fn image_count_respects_finite_maximum() {
        let caps = capabilities(vk::Extent2D::default(), 2, 3);
        assert_eq!(image_count(&caps), 3);

        let tight = capabilities(vk::Extent2D::default(), 2, 2);
        assert_eq!(image_count(&tight), 2);
    }
}
