//! Binds a panel and a renderer and runs fills against them

use tracing::{info, warn};

use holdlight_render::Renderer;

use crate::{
    error::{ControlError, Result},
    fill::Fill,
    runner::{RunReport, Runner, RunnerConfig, RunnerHandle, SharedPanel},
};

pub struct Controller {
    panel: SharedPanel,
    renderer: Option<Box<dyn Renderer>>,
    active: Option<RunnerHandle>,
}

impl Controller {
    pub fn new(panel: SharedPanel, renderer: Box<dyn Renderer>) -> Self {
        Self {
            panel,
            renderer: Some(renderer),
            active: None,
        }
    }

    pub fn panel(&self) -> SharedPanel {
        self.panel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(RunnerHandle::is_running)
    }

    pub fn active(&self) -> Option<&RunnerHandle> {
        self.active.as_ref()
    }

    /// Start `fill` on a new runner thread. A runner that already ended on
    /// its own is reaped first; a live one is an error.
    pub fn run(&mut self, fill: Box<dyn Fill>, config: RunnerConfig) -> Result<()> {
        if let Some(active) = &self.active {
            if active.is_running() {
                return Err(ControlError::AlreadyStarted(active.name().to_string()));
            }
        }
        if let Some(report) = self.stop() {
            if let Err(e) = &report.result {
                warn!("Previous runner ended with: {}", e);
            }
        }

        let renderer = self
            .renderer
            .take()
            .ok_or(ControlError::RendererUnavailable)?;
        let name = fill.name().to_string();
        let runner = Runner::new(name, self.panel.clone(), renderer, fill, config);

        let handle = match runner.start() {
            Ok(handle) => handle,
            Err(failed) => {
                self.renderer = failed.renderer;
                return Err(failed.error);
            }
        };
        info!("Controller started runner '{}'", handle.name());
        self.active = Some(handle);
        Ok(())
    }

    /// Stop the active runner and take its renderer back.
    pub fn stop(&mut self) -> Option<RunReport> {
        let handle = self.active.take()?;
        let (report, renderer) = handle.finish();
        if renderer.is_none() {
            warn!("Renderer lost with a panicked runner");
        }
        self.renderer = renderer;
        Some(report)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::CycleHue;
    use crate::runner::shared;
    use holdlight_core::{Address, Color, Location, Panel, Pixel};
    use holdlight_render::TextRenderer;

    fn panel() -> SharedPanel {
        let mut panel = Panel::new();
        panel.set(
            Location::new(0, 0),
            Pixel::new(Color::rgb(255, 0, 0), Address::new(0, 0), true, 0).unwrap(),
        );
        shared(panel)
    }

    fn fast() -> RunnerConfig {
        RunnerConfig {
            interval_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_and_stop() {
        let panel = panel();
        let mut controller =
            Controller::new(panel.clone(), Box::new(TextRenderer::new(std::io::sink(), false)));

        controller
            .run(Box::new(CycleHue::new(20.0)), fast())
            .unwrap();
        assert!(controller.is_running());
        while controller.active().map_or(0, RunnerHandle::frames) < 2 {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        let report = controller.stop().unwrap();
        assert!(report.result.is_ok());
        assert!(!controller.is_running());
        assert!(report.frames >= 1);
        assert_ne!(
            panel.lock().get(Location::new(0, 0)).unwrap().color,
            Color::rgb(255, 0, 0)
        );
    }

    #[test]
    fn test_second_run_while_active_is_rejected() {
        let mut controller =
            Controller::new(panel(), Box::new(TextRenderer::new(std::io::sink(), false)));
        controller
            .run(Box::new(CycleHue::new(20.0)), fast())
            .unwrap();

        let err = controller
            .run(Box::new(CycleHue::new(20.0)), fast())
            .unwrap_err();
        assert!(matches!(err, ControlError::AlreadyStarted(name) if name == "CycleHue"));
        assert!(controller.is_running());
    }

    #[test]
    fn test_renderer_is_reused_after_finished_run() {
        let mut controller =
            Controller::new(panel(), Box::new(TextRenderer::new(std::io::sink(), false)));
        let limited = RunnerConfig {
            max_frames: Some(2),
            ..fast()
        };
        controller
            .run(Box::new(CycleHue::new(20.0)), limited.clone())
            .unwrap();
        while controller.is_running() {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        controller
            .run(Box::new(CycleHue::new(20.0)), limited)
            .unwrap();
        let report = controller.stop().unwrap();
        assert!(report.result.is_ok());
    }

    #[test]
    fn test_failed_spawn_keeps_renderer() {
        let mut controller =
            Controller::new(panel(), Box::new(TextRenderer::new(std::io::sink(), false)));
        let impossible = RunnerConfig {
            stack_size: Some(usize::MAX / 2),
            ..fast()
        };
        let err = controller
            .run(Box::new(CycleHue::new(20.0)), impossible)
            .unwrap_err();
        assert!(matches!(err, ControlError::Spawn(_)));
        assert!(!controller.is_running());

        let limited = RunnerConfig {
            max_frames: Some(2),
            ..fast()
        };
        controller
            .run(Box::new(CycleHue::new(20.0)), limited)
            .unwrap();
        while controller.is_running() {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        let report = controller.stop().unwrap();
        assert_eq!(report.frames, 2);
        assert!(report.result.is_ok());
    }
}
