//! Frame loop
//!
//! A [`Runner`] owns a renderer and a fill and drives them from a dedicated
//! thread. Each iteration takes the panel lock, fills, renders, releases the
//! lock and sleeps for the configured interval:
//!
//! ```text
//!   Idle --start--> Running --flag cleared / frame limit / fatal error--> Stopped
//! ```
//!
//! The running flag is checked at the top of each iteration, so a stop takes
//! effect after the in-flight frame completes.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use holdlight_core::Panel;
use holdlight_render::Renderer;

use crate::{
    error::{ControlError, Result},
    fill::Fill,
};

/// Panel shared between the runner thread and everyone else.
pub type SharedPanel = Arc<Mutex<Panel>>;

pub fn shared(panel: Panel) -> SharedPanel {
    Arc::new(Mutex::new(panel))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Stopped,
}

/// Loop timing and failure policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Sleep between frames
    pub interval_ms: u64,
    /// Frames per FPS measurement
    pub fps_window: u32,
    /// Consecutive dropped frames before the loop gives up (0 = never)
    pub max_consecutive_failures: u32,
    /// Stop on its own after this many frames
    pub max_frames: Option<u64>,
    /// Runner thread stack size in bytes (platform default when unset)
    pub stack_size: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30,
            fps_window: 30,
            max_consecutive_failures: 10,
            max_frames: None,
            stack_size: None,
        }
    }
}

impl RunnerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Frames-per-second over a fixed window of ticks
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: u32,
    ticks: u32,
    window_start: Option<Instant>,
}

impl FpsCounter {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            ticks: 0,
            window_start: None,
        }
    }

    pub fn tick(&mut self) -> Option<f64> {
        self.tick_at(Instant::now())
    }

    /// Count one frame. Returns the rate once per completed window.
    pub fn tick_at(&mut self, now: Instant) -> Option<f64> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };
        self.ticks += 1;
        if self.ticks < self.window {
            return None;
        }
        self.ticks = 0;
        self.window_start = Some(now);
        let elapsed = now.duration_since(start).as_secs_f64();
        (elapsed > 0.0).then(|| self.window as f64 / elapsed)
    }
}

/// Outcome of a finished run
#[derive(Debug)]
pub struct RunReport {
    /// Iterations executed, dropped ones included
    pub frames: u64,
    pub dropped_frames: u64,
    pub result: Result<()>,
}

struct Shared {
    running: AtomicBool,
    state: Mutex<RunnerState>,
    frames: AtomicU64,
    last_fps: Mutex<Option<f64>>,
}

impl Shared {
    fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
        *self.state.lock() = RunnerState::Stopped;
    }
}

struct Finished {
    report: RunReport,
    renderer: Box<dyn Renderer>,
}

/// A runner whose thread never started. The renderer comes back with it.
pub struct StartError {
    pub error: ControlError,
    pub renderer: Option<Box<dyn Renderer>>,
}

impl fmt::Debug for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartError")
            .field("error", &self.error)
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .finish()
    }
}

impl From<StartError> for ControlError {
    fn from(failed: StartError) -> Self {
        failed.error
    }
}

pub struct Runner {
    name: String,
    panel: SharedPanel,
    renderer: Box<dyn Renderer>,
    fill: Box<dyn Fill>,
    config: RunnerConfig,
    shared: Arc<Shared>,
}

impl Runner {
    pub fn new(
        name: impl Into<String>,
        panel: SharedPanel,
        renderer: Box<dyn Renderer>,
        fill: Box<dyn Fill>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            panel,
            renderer,
            fill,
            config,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(RunnerState::Idle),
                frames: AtomicU64::new(0),
                last_fps: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunnerState {
        *self.shared.state.lock()
    }

    /// Move the loop onto its own thread.
    pub fn start(self) -> std::result::Result<RunnerHandle, StartError> {
        let Self {
            name,
            panel,
            renderer,
            fill,
            config,
            shared,
        } = self;

        shared.running.store(true, Ordering::SeqCst);
        *shared.state.lock() = RunnerState::Running;

        // Parked here so a failed spawn can hand it back.
        let slot = Arc::new(Mutex::new(Some(renderer)));
        let mut builder = thread::Builder::new().name(format!("runner-{}", name));
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }
        let spawned = builder.spawn({
            let name = name.clone();
            let panel = panel.clone();
            let shared = shared.clone();
            let slot = slot.clone();
            move || {
                let renderer = slot.lock().take()?;
                Some(run_loop(&name, &panel, renderer, fill, &config, &shared))
            }
        });

        match spawned {
            Ok(thread) => Ok(RunnerHandle {
                name,
                panel,
                shared,
                thread: Some(thread),
            }),
            Err(e) => {
                shared.finish();
                warn!("Runner '{}' failed to start: {}", name, e);
                Err(StartError {
                    error: ControlError::Spawn(e),
                    renderer: slot.lock().take(),
                })
            }
        }
    }
}

fn run_loop(
    name: &str,
    panel: &SharedPanel,
    mut renderer: Box<dyn Renderer>,
    mut fill: Box<dyn Fill>,
    config: &RunnerConfig,
    shared: &Shared,
) -> Finished {
    info!(
        "Runner '{}' started ({} -> {}, every {} ms)",
        name,
        fill.name(),
        renderer.name(),
        config.interval_ms
    );
    fill.init(&mut panel.lock());

    let interval = config.interval();
    let mut fps = FpsCounter::new(config.fps_window);
    let mut frames = 0u64;
    let mut dropped_frames = 0u64;
    let mut consecutive_failures = 0u32;

    let result = loop {
        if !shared.running.load(Ordering::SeqCst) {
            break Ok(());
        }
        if config.max_frames.is_some_and(|max| frames >= max) {
            break Ok(());
        }

        // The lock spans fill and render; it is released on every path out
        // of this block.
        let rendered = {
            let mut guard = panel.lock();
            fill.fill(&mut guard);
            renderer.render(&guard)
        };
        frames += 1;
        shared.frames.store(frames, Ordering::Relaxed);

        match rendered {
            Ok(()) => consecutive_failures = 0,
            Err(e) if e.is_transport() => {
                dropped_frames += 1;
                consecutive_failures += 1;
                warn!("Runner '{}' dropped frame {}: {}", name, frames, e);
                if config.max_consecutive_failures > 0
                    && consecutive_failures >= config.max_consecutive_failures
                {
                    error!(
                        "Runner '{}' giving up after {} consecutive failures",
                        name, consecutive_failures
                    );
                    break Err(ControlError::TooManyFailures {
                        count: consecutive_failures,
                        last: e,
                    });
                }
            }
            Err(e) => {
                error!("Runner '{}' stopped: {}", name, e);
                break Err(e.into());
            }
        }

        if let Some(rate) = fps.tick() {
            debug!("Runner '{}' at {:.1} fps", name, rate);
            *shared.last_fps.lock() = Some(rate);
        }

        thread::sleep(interval);
    };

    shared.finish();
    info!(
        "Runner '{}' stopped after {} frames ({} dropped)",
        name, frames, dropped_frames
    );

    Finished {
        report: RunReport {
            frames,
            dropped_frames,
            result,
        },
        renderer,
    }
}

/// Handle to a started runner
pub struct RunnerHandle {
    name: String,
    panel: SharedPanel,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<Option<Finished>>>,
}

impl RunnerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunnerState {
        *self.shared.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn panel(&self) -> SharedPanel {
        self.panel.clone()
    }

    /// Frames executed so far
    pub fn frames(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    /// Most recent FPS measurement
    pub fn last_fps(&self) -> Option<f64> {
        *self.shared.last_fps.lock()
    }

    /// Clear the running flag and wait for the loop to exit.
    pub fn stop(self) -> RunReport {
        self.finish().0
    }

    /// Wait for the loop to end on its own.
    pub fn join(mut self) -> RunReport {
        self.wait().0
    }

    pub(crate) fn finish(mut self) -> (RunReport, Option<Box<dyn Renderer>>) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.wait()
    }

    fn wait(&mut self) -> (RunReport, Option<Box<dyn Renderer>>) {
        let joined = self.thread.take().map(JoinHandle::join);
        match joined {
            Some(Ok(Some(finished))) => (finished.report, Some(finished.renderer)),
            _ => {
                self.shared.finish();
                let report = RunReport {
                    frames: self.frames(),
                    dropped_frames: 0,
                    result: Err(ControlError::Poisoned),
                };
                (report, None)
            }
        }
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shared.running.store(false, Ordering::SeqCst);
            let _ = self.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdlight_core::{Address, Color, Location, Pixel};
    use holdlight_render::RenderError;
    use std::collections::VecDeque;

    struct Noop;

    impl Fill for Noop {
        fn fill(&mut self, _panel: &mut Panel) {}

        fn name(&self) -> &str {
            "Noop"
        }
    }

    /// Plays back a script of outcomes, then succeeds.
    struct Scripted {
        outcomes: VecDeque<holdlight_render::Result<()>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<holdlight_render::Result<()>>) -> Self {
            Self {
                outcomes: outcomes.into(),
            }
        }
    }

    impl Renderer for Scripted {
        fn render(&mut self, _panel: &Panel) -> holdlight_render::Result<()> {
            self.outcomes.pop_front().unwrap_or(Ok(()))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn transport_error() -> holdlight_render::Result<()> {
        Err(RenderError::transport(
            "scripted",
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
        ))
    }

    fn config(max_frames: u64, max_failures: u32) -> RunnerConfig {
        RunnerConfig {
            interval_ms: 1,
            fps_window: 30,
            max_consecutive_failures: max_failures,
            max_frames: Some(max_frames),
            stack_size: None,
        }
    }

    fn run(renderer: Scripted, config: RunnerConfig) -> RunReport {
        let runner = Runner::new(
            "test",
            shared(Panel::new()),
            Box::new(renderer),
            Box::new(Noop),
            config,
        );
        runner.start().unwrap().join()
    }

    #[test]
    fn test_state_transitions() {
        let runner = Runner::new(
            "states",
            shared(Panel::new()),
            Box::new(Scripted::new(Vec::new())),
            Box::new(Noop),
            RunnerConfig {
                interval_ms: 1,
                ..Default::default()
            },
        );
        assert_eq!(runner.state(), RunnerState::Idle);

        let handle = runner.start().unwrap();
        assert_eq!(handle.state(), RunnerState::Running);
        assert!(handle.is_running());

        let shared = handle.shared.clone();
        let report = handle.stop();
        assert!(report.result.is_ok());
        assert_eq!(*shared.state.lock(), RunnerState::Stopped);
        assert!(!shared.running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_frame_limit_stops_loop() {
        let report = run(Scripted::new(Vec::new()), config(5, 10));
        assert_eq!(report.frames, 5);
        assert_eq!(report.dropped_frames, 0);
        assert!(report.result.is_ok());
    }

    #[test]
    fn test_transport_error_drops_frame_and_continues() {
        let script = vec![Ok(()), transport_error(), transport_error(), Ok(())];
        let report = run(Scripted::new(script), config(6, 3));
        assert_eq!(report.frames, 6);
        assert_eq!(report.dropped_frames, 2);
        assert!(report.result.is_ok());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let script = vec![
            transport_error(),
            transport_error(),
            Ok(()),
            transport_error(),
            transport_error(),
        ];
        let report = run(Scripted::new(script), config(8, 3));
        assert!(report.result.is_ok());
        assert_eq!(report.dropped_frames, 4);
    }

    #[test]
    fn test_consecutive_failures_stop_loop() {
        let script = (0..5).map(|_| transport_error()).collect();
        let report = run(Scripted::new(script), config(100, 3));
        assert_eq!(report.frames, 3);
        assert!(matches!(
            report.result,
            Err(ControlError::TooManyFailures { count: 3, .. })
        ));
    }

    #[test]
    fn test_zero_threshold_never_gives_up() {
        let script = (0..20).map(|_| transport_error()).collect();
        let report = run(Scripted::new(script), config(20, 0));
        assert_eq!(report.dropped_frames, 20);
        assert!(report.result.is_ok());
    }

    #[test]
    fn test_precondition_error_stops_immediately() {
        let script = vec![
            Ok(()),
            Err(RenderError::InvalidUniverseAccess {
                universe: 1,
                location: Location::new(0, 0),
            }),
        ];
        let report = run(Scripted::new(script), config(100, 10));
        assert_eq!(report.frames, 2);
        assert_eq!(report.dropped_frames, 0);
        assert!(matches!(
            report.result,
            Err(ControlError::Render(RenderError::InvalidUniverseAccess { .. }))
        ));
    }

    #[test]
    fn test_init_runs_once_before_first_frame() {
        struct Counting(Arc<Mutex<Vec<&'static str>>>);

        impl Fill for Counting {
            fn init(&mut self, panel: &mut Panel) {
                panel.set(
                    Location::new(0, 0),
                    Pixel::new(Color::BLACK, Address::new(0, 0), true, 0).unwrap(),
                );
                self.0.lock().push("init");
            }

            fn fill(&mut self, _panel: &mut Panel) {
                self.0.lock().push("fill");
            }

            fn name(&self) -> &str {
                "Counting"
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let panel = shared(Panel::new());
        let runner = Runner::new(
            "init",
            panel.clone(),
            Box::new(Scripted::new(Vec::new())),
            Box::new(Counting(log.clone())),
            config(3, 10),
        );
        runner.start().unwrap().join();

        assert_eq!(*log.lock(), vec!["init", "fill", "fill", "fill"]);
        assert_eq!(panel.lock().len(), 1);
    }

    #[test]
    fn test_fps_counter_reports_once_per_window() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(30);
        assert_eq!(counter.tick_at(start), None);

        let mut reports = Vec::new();
        for i in 1..=60u64 {
            let now = start + Duration::from_millis(i * 10);
            if let Some(rate) = counter.tick_at(now) {
                reports.push((i, rate));
            }
        }
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].0, 30);
        assert!((reports[0].1 - 100.0).abs() < 1e-6);
        assert_eq!(reports[1].0, 60);
    }

    #[test]
    fn test_fps_window_of_zero_is_treated_as_one() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(0);
        counter.tick_at(start);
        let rate = counter.tick_at(start + Duration::from_millis(500)).unwrap();
        assert!((rate - 2.0).abs() < 1e-6);
    }
}
