//! Vulkan context negotiation for the Photon renderer.
//!
//! This crate provides:
//! - Vulkan instance creation with validation support
//! - Physical device selection against fixed suitability predicates
//! - Queue role resolution and image sharing derivation
//! - Surface format, present mode, and extent negotiation
//! - Swapchain and image view creation
//! - Ordered context teardown

pub mod capabilities;
pub mod context;
pub mod device;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod queues;
pub mod surface;
pub mod swapchain;

pub use capabilities::{DeviceCapabilities, GpuVendor};
pub use context::{GpuContext, GpuContextBuilder};
pub use device::SelectedDevice;
pub use error::{GpuError, Result};
pub use lifecycle::{Lifecycle, Stage};
pub use queues::{ImageSharing, QueueRole, QueueRoleMap};
pub use surface::{SurfaceContext, SurfaceSupport};
pub use swapchain::{Swapchain, SwapchainConfig};
