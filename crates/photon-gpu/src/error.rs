//! GPU error types.

use ash::vk;
use thiserror::Error;

use crate::lifecycle::Stage;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// Required platform layer or extension absent.
    #[error("Required platform feature not supported: {0}")]
    UnsupportedFeature(String),

    /// Device enumeration returned nothing.
    #[error("No Vulkan-capable devices found")]
    NoCandidates,

    /// No suitable GPU found.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// Presentation-support check failed for the resolved family.
    #[error("Surface not supported by presentation queue family {family}")]
    SurfaceUnsupported { family: u32 },

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// A platform creation call failed after all preconditions passed.
    #[error("{what} creation failed: {source}")]
    ResourceCreation {
        what: &'static str,
        #[source]
        source: vk::Result,
    },

    /// Lifecycle state machine violation.
    #[error("Invalid lifecycle transition: expected {expected:?}, was {actual:?}")]
    InvalidState { expected: Stage, actual: Stage },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
