//! Photon context negotiation demo.
//!
//! Opens a window, negotiates a GPU context against the first suitable
//! device, reports the negotiated configuration, and tears everything down
//! when the window closes. No frames are rendered.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use photon_gpu::GpuContextBuilder;
use photon_platform::{create_window, PlatformConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Photon starting...");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut viewer = Viewer {
        config: PlatformConfig {
            title: "Photon".to_string(),
            width: WIDTH,
            height: HEIGHT,
            resizable: false,
        },
        state: None,
        failed: false,
    };

    event_loop.run_app(&mut viewer)?;

    if viewer.failed {
        anyhow::bail!("context negotiation failed");
    }
    Ok(())
}

struct Viewer {
    config: PlatformConfig,
    state: Option<State>,
    failed: bool,
}

/// Live window and negotiated context.
///
/// The context is declared first so it is torn down before the window goes
/// away if the state is dropped without an explicit teardown.
struct State {
    gpu: photon_gpu::GpuContext,
    #[allow(dead_code)]
    window: Window,
}

impl Viewer {
    fn create_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<State> {
        let window = create_window(event_loop, &self.config)?;

        let gpu = GpuContextBuilder::new()
            .app_name(&self.config.title)
            .size(self.config.width, self.config.height)
            .build(&window)?;

        info!("GPU: {}", gpu.capabilities().summary());
        info!(
            "Swapchain: {:?}, {}x{}, {} images",
            gpu.format(),
            gpu.extent().width,
            gpu.extent().height,
            gpu.images().len(),
        );

        Ok(State { gpu, window })
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.create_state(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                info!("Context ready");
            }
            Err(e) => {
                // The only recovery for a failed negotiation is to report
                // and exit.
                error!("Failed to negotiate GPU context: {e}");
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            info!("Close requested");
            if let Some(mut state) = self.state.take() {
                state.gpu.teardown();
            }
            event_loop.exit();
        }
    }
}
