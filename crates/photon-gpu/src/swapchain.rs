//! Swapchain creation.

use crate::error::{GpuError, Result};
use crate::queues::{ImageSharing, QueueRole, QueueRoleMap};
use crate::surface::{
    choose_extent, image_count, select_present_mode, select_surface_format, SurfaceSupport,
};
use ash::vk;

/// Fully negotiated swapchain configuration.
///
/// Determined entirely by one surface support snapshot and one resolved
/// role map; immutable once built.
#[derive(Debug, Clone)]
pub struct SwapchainConfig {
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub sharing: ImageSharing,
}

impl SwapchainConfig {
    /// Negotiate a configuration from a surface support snapshot and the
    /// resolved queue roles.
    pub fn negotiate(
        support: &SurfaceSupport,
        queue_roles: &QueueRoleMap,
        requested_width: u32,
        requested_height: u32,
    ) -> Result<Self> {
        let graphics = queue_roles.require(QueueRole::Graphics)?;
        let presentation = queue_roles.require(QueueRole::Presentation)?;

        Ok(Self {
            format: select_surface_format(&support.formats),
            present_mode: select_present_mode(&support.present_modes),
            extent: choose_extent(&support.capabilities, requested_width, requested_height),
            image_count: image_count(&support.capabilities),
            pre_transform: support.capabilities.current_transform,
            sharing: ImageSharing::derive(graphics, presentation),
        })
    }
}

/// Swapchain wrapper.
pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain and one 2D color view per image.
    ///
    /// Image order corresponds to presentation index. The caller must have
    /// verified presentation support for the resolved presentation family
    /// before calling; creating against an unsupported combination is
    /// undefined behavior on conformant drivers.
    ///
    /// # Safety
    /// All handles must be valid.
    pub unsafe fn new(
        device: &ash::Device,
        swapchain_loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        config: &SwapchainConfig,
    ) -> Result<Self> {
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(config.image_count)
            .image_format(config.format.format)
            .image_color_space(config.format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(config.sharing.mode())
            .queue_family_indices(config.sharing.indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true);

        let swapchain = swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(|e| GpuError::ResourceCreation {
                what: "Swapchain",
                source: e,
            })?;

        let images = swapchain_loader.get_swapchain_images(swapchain)?;

        let image_views: Vec<_> = images
            .iter()
            .map(|&image| {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(config.format.format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(
                        vk::ImageSubresourceRange::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .base_mip_level(0)
                            .level_count(1)
                            .base_array_layer(0)
                            .layer_count(1),
                    );

                device.create_image_view(&view_info, None)
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| GpuError::ResourceCreation {
                what: "Image view",
                source: e,
            })?;

        Ok(Self {
            swapchain,
            images,
            image_views,
            format: config.format.format,
            extent: config.extent,
        })
    }

    /// Destroy the image views, then the swapchain.
    ///
    /// # Safety
    /// All handles must be valid and the swapchain must not be in use.
    pub unsafe fn destroy(
        &self,
        device: &ash::Device,
        swapchain_loader: &ash::khr::swapchain::Device,
    ) {
        for &view in &self.image_views {
            device.destroy_image_view(view, None);
        }
        swapchain_loader.destroy_swapchain(self.swapchain, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::resolve_queue_roles;

    fn support() -> SurfaceSupport {
        SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default()
                .current_extent(vk::Extent2D {
                    width: 1280,
                    height: 720,
                })
                .min_image_count(2)
                .max_image_count(0)
                .current_transform(vk::SurfaceTransformFlagsKHR::IDENTITY),
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    fn roles(present_family: u32) -> QueueRoleMap {
        let families = [
            vk::QueueFamilyProperties::default()
                .queue_flags(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                .queue_count(1),
            vk::QueueFamilyProperties::default()
                .queue_flags(vk::QueueFlags::TRANSFER)
                .queue_count(1),
        ];
        resolve_queue_roles(
            &families,
            |family| family == present_family,
            &QueueRole::REQUIRED,
        )
    }

    #[test]
    fn negotiated_config_follows_the_snapshot() {
        let config = SwapchainConfig::negotiate(&support(), &roles(0), 800, 600).unwrap();

        assert_eq!(config.format.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(config.present_mode, vk::PresentModeKHR::FIFO);
        // Device-reported extent is authoritative; the request is ignored.
        assert_eq!(config.extent.width, 1280);
        assert_eq!(config.image_count, 3);
    }

    #[test]
    fn shared_family_negotiates_exclusive_images() {
        let config = SwapchainConfig::negotiate(&support(), &roles(0), 800, 600).unwrap();
        assert_eq!(config.sharing, ImageSharing::Exclusive);
    }

    #[test]
    fn split_families_negotiate_concurrent_images() {
        let config = SwapchainConfig::negotiate(&support(), &roles(1), 800, 600).unwrap();
        assert_eq!(config.sharing.mode(), vk::SharingMode::CONCURRENT);

        let mut indices = config.sharing.indices().to_vec();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn incomplete_roles_fail_negotiation() {
        let map = QueueRoleMap::default();
        let err = SwapchainConfig::negotiate(&support(), &map, 800, 600).unwrap_err();
        assert!(matches!(err, GpuError::NoSuitableDevice));
    }
}
