//! Context lifecycle state machine.
//!
//! Creation walks the stages strictly forward; teardown releases everything
//! in the mirrored reverse order. Tracking the stage explicitly means a new
//! owned resource cannot be added without its release step, and teardown of
//! an already torn down context is a no-op rather than a double release.

use crate::error::{GpuError, Result};

/// Stages a GPU context moves through during its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Uninitialized,
    InstanceReady,
    DeviceReady,
    SurfaceReady,
    SwapchainReady,
    Running,
    TornDown,
}

impl Stage {
    /// The stage the machine must be in before entering `self`.
    const fn prev(self) -> Option<Self> {
        match self {
            Self::Uninitialized => None,
            Self::InstanceReady => Some(Self::Uninitialized),
            Self::DeviceReady => Some(Self::InstanceReady),
            Self::SurfaceReady => Some(Self::DeviceReady),
            Self::SwapchainReady => Some(Self::SurfaceReady),
            Self::Running => Some(Self::SwapchainReady),
            Self::TornDown => Some(Self::Running),
        }
    }
}

/// Tracks the current lifecycle stage of a GPU context.
#[derive(Debug)]
pub struct Lifecycle {
    stage: Stage,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Create a tracker in the `Uninitialized` stage.
    pub const fn new() -> Self {
        Self {
            stage: Stage::Uninitialized,
        }
    }

    /// Get the current stage.
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether the owning application may submit work.
    pub const fn is_running(&self) -> bool {
        matches!(self.stage, Stage::Running)
    }

    /// Whether teardown has already run.
    pub const fn is_torn_down(&self) -> bool {
        matches!(self.stage, Stage::TornDown)
    }

    /// Move to the next creation stage.
    ///
    /// Only the immediate successor of the current stage is accepted; any
    /// other transition (including any creation step after teardown) fails
    /// with `InvalidState`.
    pub fn advance(&mut self, to: Stage) -> Result<()> {
        let expected = to.prev().ok_or(GpuError::InvalidState {
            expected: Stage::Uninitialized,
            actual: self.stage,
        })?;

        if self.stage != expected {
            return Err(GpuError::InvalidState {
                expected,
                actual: self.stage,
            });
        }

        self.stage = to;
        Ok(())
    }

    /// Enter the terminal `TornDown` stage.
    ///
    /// Returns `true` if resources still need releasing, `false` if the
    /// context was already torn down (re-entrant teardown is a no-op).
    pub fn begin_teardown(&mut self) -> bool {
        if self.is_torn_down() {
            return false;
        }
        self.stage = Stage::TornDown;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_startup(lifecycle: &mut Lifecycle) {
        lifecycle.advance(Stage::InstanceReady).unwrap();
        lifecycle.advance(Stage::DeviceReady).unwrap();
        lifecycle.advance(Stage::SurfaceReady).unwrap();
        lifecycle.advance(Stage::SwapchainReady).unwrap();
        lifecycle.advance(Stage::Running).unwrap();
    }

    #[test]
    fn forward_transitions_in_order() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.stage(), Stage::Uninitialized);

        full_startup(&mut lifecycle);
        assert!(lifecycle.is_running());
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Stage::InstanceReady).unwrap();

        let err = lifecycle.advance(Stage::SurfaceReady).unwrap_err();
        assert!(matches!(
            err,
            GpuError::InvalidState {
                expected: Stage::DeviceReady,
                actual: Stage::InstanceReady,
            }
        ));
    }

    #[test]
    fn backward_transition_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        full_startup(&mut lifecycle);

        assert!(lifecycle.advance(Stage::InstanceReady).is_err());
    }

    #[test]
    fn teardown_twice_is_a_noop() {
        let mut lifecycle = Lifecycle::new();
        full_startup(&mut lifecycle);

        assert!(lifecycle.begin_teardown());
        assert!(!lifecycle.begin_teardown());
        assert!(lifecycle.is_torn_down());
    }

    #[test]
    fn creation_after_teardown_is_a_state_violation() {
        let mut lifecycle = Lifecycle::new();
        full_startup(&mut lifecycle);
        lifecycle.begin_teardown();

        let err = lifecycle.advance(Stage::InstanceReady).unwrap_err();
        assert!(matches!(
            err,
            GpuError::InvalidState {
                actual: Stage::TornDown,
                ..
            }
        ));
    }

    #[test]
    fn uninitialized_is_not_a_transition_target() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(Stage::Uninitialized).is_err());
    }
}
