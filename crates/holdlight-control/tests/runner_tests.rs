use holdlight_control::{shared, AppState, Fill, Runner, RunnerConfig, SharedPanel};
use holdlight_core::{layout, Address, Color, Location, Panel, Pixel};
use holdlight_render::{Renderer, Result as RenderResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Critical sections observed across all runners: fill start to render end.
#[derive(Default)]
struct Intervals {
    open: Mutex<Option<Instant>>,
    closed: Mutex<Vec<(Instant, Instant)>>,
    overlaps: Mutex<u32>,
}

impl Intervals {
    fn enter(&self) {
        let mut open = self.open.lock();
        if open.is_some() {
            *self.overlaps.lock() += 1;
        }
        *open = Some(Instant::now());
    }

    fn exit(&self) {
        if let Some(start) = self.open.lock().take() {
            self.closed.lock().push((start, Instant::now()));
        }
    }
}

struct RecordingFill(Arc<Intervals>);

impl Fill for RecordingFill {
    fn fill(&mut self, panel: &mut Panel) {
        self.0.enter();
        for (_, pixel) in panel.iter_mut() {
            pixel.color = Color::WHITE;
        }
        thread::sleep(Duration::from_micros(200));
    }

    fn name(&self) -> &str {
        "Recording"
    }
}

struct RecordingRenderer(Arc<Intervals>);

impl Renderer for RecordingRenderer {
    fn render(&mut self, _panel: &Panel) -> RenderResult<()> {
        thread::sleep(Duration::from_micros(200));
        self.0.exit();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn runner(name: &str, panel: &SharedPanel, intervals: &Arc<Intervals>) -> Runner {
    Runner::new(
        name,
        panel.clone(),
        Box::new(RecordingRenderer(intervals.clone())),
        Box::new(RecordingFill(intervals.clone())),
        RunnerConfig {
            interval_ms: 0,
            max_frames: Some(50),
            ..Default::default()
        },
    )
}

#[test]
fn test_fill_and_render_never_overlap() {
    let mut panel = Panel::new();
    panel.set(
        Location::new(0, 0),
        Pixel::new(Color::BLACK, Address::new(0, 0), true, 0).unwrap(),
    );
    let panel = shared(panel);
    let intervals = Arc::new(Intervals::default());

    let a = runner("a", &panel, &intervals).start().unwrap();
    let b = runner("b", &panel, &intervals).start().unwrap();

    let report_a = a.join();
    let report_b = b.join();
    assert!(report_a.result.is_ok());
    assert!(report_b.result.is_ok());

    assert_eq!(*intervals.overlaps.lock(), 0);

    let mut closed = intervals.closed.lock().clone();
    assert_eq!(closed.len(), 100);
    closed.sort();
    for pair in closed.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "critical sections overlap");
    }
}

#[test]
fn test_layout_load_is_seen_by_running_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wall.txt");

    let mut replacement = Panel::new();
    for x in 0..3 {
        replacement.set(
            Location::new(x, 0),
            Pixel::new(Color::BLACK, Address::new(0, x * 3), true, 0).unwrap(),
        );
    }
    layout::write(&replacement, &path, 0).unwrap();

    let panel = shared(Panel::new());
    let intervals = Arc::new(Intervals::default());
    let handle = Runner::new(
        "loader",
        panel.clone(),
        Box::new(RecordingRenderer(intervals.clone())),
        Box::new(RecordingFill(intervals.clone())),
        RunnerConfig {
            interval_ms: 1,
            ..Default::default()
        },
    )
    .start()
    .unwrap();

    let mut state = AppState::new(handle.panel());
    assert_eq!(state.load(&path).unwrap(), 3);

    let frames = handle.frames();
    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.frames() < frames + 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    let report = handle.stop();
    assert!(report.result.is_ok());

    // The fill painted the loaded pixels.
    assert!(panel
        .lock()
        .iter()
        .all(|(_, pixel)| pixel.color == Color::WHITE));
    assert_eq!(panel.lock().len(), 3);
}
