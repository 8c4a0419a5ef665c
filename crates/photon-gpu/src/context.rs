//! GPU context management.
//!
//! `GpuContextBuilder::build` runs the one-shot negotiation sequence:
//! instance, surface, device selection, logical device and queues, surface
//! configuration, swapchain. Ownership is strictly hierarchical and
//! `teardown` releases everything in the exact reverse of creation order.

use crate::capabilities::DeviceCapabilities;
use crate::device::{create_device, select_physical_device, DeviceQueues};
use crate::error::{GpuError, Result};
use crate::instance::{create_debug_messenger, create_instance};
use crate::lifecycle::{Lifecycle, Stage};
use crate::queues::QueueRole;
use crate::surface::SurfaceContext;
use crate::swapchain::{Swapchain, SwapchainConfig};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Main GPU context holding Vulkan resources.
///
/// Queues are non-owning views into the device. Everything else is owned
/// here and torn down exactly once, in reverse creation order.
pub struct GpuContext {
    // Entry must be kept alive for the lifetime of the context
    #[allow(dead_code)]
    entry: ash::Entry,
    instance: ash::Instance,
    debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface: SurfaceContext,
    physical_device: vk::PhysicalDevice,
    capabilities: DeviceCapabilities,
    device: ash::Device,
    queues: DeviceQueues,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: Swapchain,

    graphics_family: u32,
    presentation_family: u32,
    compute_family: u32,

    lifecycle: Lifecycle,
}

impl GpuContext {
    /// Get the Vulkan device handle.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Get device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Get the graphics queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.queues.graphics
    }

    /// Get the presentation queue.
    pub fn presentation_queue(&self) -> vk::Queue {
        self.queues.presentation
    }

    /// Get the compute queue.
    pub fn compute_queue(&self) -> vk::Queue {
        self.queues.compute
    }

    /// Get the graphics queue family index.
    pub fn graphics_family(&self) -> u32 {
        self.graphics_family
    }

    /// Get the presentation queue family index.
    pub fn presentation_family(&self) -> u32 {
        self.presentation_family
    }

    /// Get the compute queue family index.
    pub fn compute_family(&self) -> u32 {
        self.compute_family
    }

    /// Get the negotiated swapchain image format.
    pub fn format(&self) -> vk::Format {
        self.swapchain.format
    }

    /// Get the negotiated swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }

    /// Get the swapchain images, ordered by presentation index.
    pub fn images(&self) -> &[vk::Image] {
        &self.swapchain.images
    }

    /// Get the swapchain image views, one per image.
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.swapchain.image_views
    }

    /// Get the current lifecycle stage.
    pub fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }

    /// Whether the context accepts work submission.
    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Wait for device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }

    /// Release every owned resource in reverse creation order.
    ///
    /// Calling teardown on an already torn down context is a no-op.
    pub fn teardown(&mut self) {
        if !self.lifecycle.begin_teardown() {
            return;
        }

        unsafe {
            let _ = self.device.device_wait_idle();

            // Image views before the swapchain, swapchain before the device,
            // device before the surface and instance.
            self.swapchain.destroy(&self.device, &self.swapchain_loader);
            self.device.destroy_device(None);
            self.surface.destroy();
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }

        tracing::info!("GPU context torn down");
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Builder for creating a GPU context.
pub struct GpuContextBuilder {
    app_name: String,
    width: u32,
    height: u32,
    enable_validation: bool,
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Photon".to_string(),
            width: 800,
            height: 600,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl GpuContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the requested swapchain dimensions.
    ///
    /// Used only when the driver defers the extent to the application;
    /// otherwise the driver-reported extent wins.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable validation layers.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Build the GPU context against a window.
    ///
    /// Runs the whole negotiation synchronously on the calling thread; every
    /// failure surfaces immediately, and retrying with the same inputs would
    /// return the same result.
    pub fn build<W>(self, window: &W) -> Result<GpuContext>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let mut lifecycle = Lifecycle::new();

        // Load Vulkan entry point
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            GpuError::UnsupportedFeature(format!("Vulkan loader unavailable: {e}"))
        })?;

        // Create Vulkan instance and optional debug messenger
        let instance = unsafe { create_instance(&entry, &self.app_name, self.enable_validation) }?;
        let debug = if self.enable_validation {
            Some(unsafe { create_debug_messenger(&entry, &instance) }?)
        } else {
            None
        };
        lifecycle.advance(Stage::InstanceReady)?;

        // The surface is an input to device selection, so it is created
        // before the device stage.
        let surface = unsafe { SurfaceContext::new(&entry, &instance, window) }?;

        // Select the physical device and create the logical device
        let selected = unsafe { select_physical_device(&instance, &surface) }?;
        let (device, queues) =
            unsafe { create_device(&instance, selected.physical_device, &selected.queue_roles) }?;
        lifecycle.advance(Stage::DeviceReady)?;

        let graphics_family = selected.queue_roles.require(QueueRole::Graphics)?;
        let presentation_family = selected.queue_roles.require(QueueRole::Presentation)?;
        let compute_family = selected.queue_roles.require(QueueRole::Compute)?;

        // Presentation support must be verified before swapchain creation
        if !surface.supports_presentation(selected.physical_device, presentation_family)? {
            return Err(GpuError::SurfaceUnsupported {
                family: presentation_family,
            });
        }

        // Negotiate the surface configuration
        let support = surface.support(selected.physical_device)?;
        let config =
            SwapchainConfig::negotiate(&support, &selected.queue_roles, self.width, self.height)?;
        lifecycle.advance(Stage::SurfaceReady)?;

        tracing::info!(
            "Negotiated surface config: {:?}/{:?}, {:?}, {}x{}, {} images, {:?} sharing",
            config.format.format,
            config.format.color_space,
            config.present_mode,
            config.extent.width,
            config.extent.height,
            config.image_count,
            config.sharing.mode(),
        );

        // Create the swapchain and image views
        let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);
        let swapchain =
            unsafe { Swapchain::new(&device, &swapchain_loader, surface.surface, &config) }?;
        lifecycle.advance(Stage::SwapchainReady)?;

        lifecycle.advance(Stage::Running)?;

        Ok(GpuContext {
            entry,
            instance,
            debug,
            surface,
            physical_device: selected.physical_device,
            capabilities: selected.capabilities,
            device,
            queues,
            swapchain_loader,
            swapchain,
            graphics_family,
            presentation_family,
            compute_family,
            lifecycle,
        })
    }
}
