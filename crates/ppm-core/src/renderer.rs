//! Marquee renderer task
//!
//! Owns the display and the frame buffer. Each cycle classifies the latest
//! reading, then sweeps the band's description across the bottom line one
//! character per frame. Every frame re-reads the shared state: the header
//! lines follow the live values, and a change of band abandons the sweep so
//! the next cycle starts the new description from its first character.
//!
//! With no network address, or with the display suppressed, the renderer
//! pushes a blank frame at a slow cadence instead.

use core::fmt::Debug;

use embassy_time::{Duration, Instant};
use embedded_graphics::Drawable;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use log::{debug, error, info};

use crate::config::MonitorConfig;
use crate::effects::EffectTable;
use crate::framebuffer::FrameBuffer;
use crate::marquee::Marquee;
use crate::shutdown::Shutdown;
use crate::state::{SharedState, Snapshot};
use crate::status_view::StatusView;

/// Shown on the marquee line until the first reading arrives
const WAITING_MESSAGE: &str = "Waiting for sensor...";

/// A monochrome panel that accepts whole frames.
pub trait Display {
    type Error: Debug;

    /// Transfer `frame` to the panel.
    fn push(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error>;
}

/// How a call to [`MarqueeRenderer::run_cycle`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every offset of the description was shown
    Completed,
    /// The reading moved to another effect band mid-pass
    Interrupted,
    /// Suppressed or offline: one blank frame was pushed
    Blank,
    /// No reading yet: one placeholder frame was pushed
    Waiting,
    /// Shutdown was requested
    Stopped,
}

/// Drives the marquee animation on a [`Display`].
pub struct MarqueeRenderer<'a, D> {
    display: D,
    frame: FrameBuffer,
    state: &'a SharedState,
    effects: &'a EffectTable,
    frame_interval: Duration,
    blank_interval: Duration,
    trend_window: Duration,
    dwell_frames: u8,
    padding: usize,
    columns: usize,
    suppress: bool,
}

impl<'a, D> MarqueeRenderer<'a, D>
where
    D: Display,
{
    pub fn new(
        display: D,
        state: &'a SharedState,
        effects: &'a EffectTable,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            display,
            frame: FrameBuffer::new(Size::new(config.display.width, config.display.height)),
            state,
            effects,
            frame_interval: config.frame_interval(),
            blank_interval: config.blank_interval(),
            trend_window: config.trend_window(),
            dwell_frames: config.dwell_frames,
            padding: config.marquee_padding,
            columns: config.marquee_columns(),
            suppress: config.display.suppress,
        }
    }

    /// Last frame drawn
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Render cycles until shutdown is requested, then blank the panel.
    pub async fn run(&mut self, shutdown: &Shutdown) {
        info!(
            "Renderer started: {} columns, {} ms per frame",
            self.columns,
            self.frame_interval.as_millis()
        );

        loop {
            match self.run_cycle(shutdown).await {
                CycleOutcome::Stopped => break,
                CycleOutcome::Interrupted => debug!("Effect band changed, restarting marquee"),
                CycleOutcome::Completed | CycleOutcome::Blank | CycleOutcome::Waiting => {}
            }
        }

        self.push_blank();
        info!("Renderer stopped");
    }

    /// Run one marquee pass, or one blank or placeholder frame.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> CycleOutcome {
        if shutdown.is_requested() {
            return CycleOutcome::Stopped;
        }

        let snapshot = self.state.snapshot();
        if self.suppress || snapshot.address.is_none() {
            self.push_blank();
            return Self::pause(shutdown, self.blank_interval, CycleOutcome::Blank).await;
        }

        let Some(reading) = snapshot.reading else {
            self.push_view(&snapshot, WAITING_MESSAGE);
            return Self::pause(shutdown, self.frame_interval, CycleOutcome::Waiting).await;
        };

        let effects = self.effects;
        let initial_band = effects.band_index(reading.concentration);
        let description = effects
            .band(initial_band)
            .map(|band| &*band.description)
            .unwrap_or_default();
        let marquee = Marquee::new(description, self.padding, self.columns, self.dwell_frames);

        for frame in marquee.sweep() {
            for _ in 0..frame.repeats {
                if shutdown.is_requested() {
                    return CycleOutcome::Stopped;
                }

                let snapshot = self.state.snapshot();
                let band = snapshot
                    .reading
                    .map(|reading| effects.band_index(reading.concentration));
                if band != Some(initial_band) {
                    return CycleOutcome::Interrupted;
                }

                self.push_view(&snapshot, &frame.text);
                if !shutdown.sleep(self.frame_interval).await {
                    return CycleOutcome::Stopped;
                }
            }
        }

        CycleOutcome::Completed
    }

    async fn pause(shutdown: &Shutdown, duration: Duration, outcome: CycleOutcome) -> CycleOutcome {
        if shutdown.sleep(duration).await {
            outcome
        } else {
            CycleOutcome::Stopped
        }
    }

    fn push_view(&mut self, snapshot: &Snapshot, marquee: &str) {
        let now = Instant::now();
        let trend = snapshot.trend;
        let view = StatusView {
            concentration: snapshot.reading.map(|reading| reading.concentration),
            trend: snapshot
                .reading
                .and_then(|_| trend.recent_direction(now, self.trend_window)),
            seconds_since_change: trend.seconds_since_change(now),
            marquee,
        };

        // Drawing into the frame buffer cannot fail.
        let _ = self.frame.clear(BinaryColor::Off);
        let _ = view.draw(&mut self.frame);
        self.push();
    }

    fn push_blank(&mut self) {
        let _ = self.frame.clear(BinaryColor::Off);
        self.push();
    }

    fn push(&mut self) {
        if let Err(e) = self.display.push(&self.frame) {
            error!("Display push failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectBand;
    use crate::sensors::Reading;
    use crate::state::HostAddress;
    use embassy_futures::block_on;

    /// Counts pushes and optionally records a new reading after a number of
    /// them, or rejects every `fail_every`-th push.
    struct RecordingDisplay<'a> {
        pushes: usize,
        blank_pushes: usize,
        failures: usize,
        state: &'a SharedState,
        change_after: Option<(usize, u32)>,
        fail_every: Option<usize>,
    }

    #[derive(Debug)]
    struct BusError;

    impl<'a> RecordingDisplay<'a> {
        fn new(state: &'a SharedState) -> Self {
            Self {
                pushes: 0,
                blank_pushes: 0,
                failures: 0,
                state,
                change_after: None,
                fail_every: None,
            }
        }
    }

    impl Display for RecordingDisplay<'_> {
        type Error = BusError;

        fn push(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error> {
            self.pushes += 1;
            if let Some(every) = self.fail_every
                && self.pushes % every == 0
            {
                self.failures += 1;
                return Err(BusError);
            }
            if frame.is_blank() {
                self.blank_pushes += 1;
            }
            if let Some((after, ppm)) = self.change_after
                && self.pushes == after
            {
                self.state.record(Reading::new(ppm, Instant::now()));
            }
            Ok(())
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            frame_interval_ms: 1,
            blank_interval_ms: 1,
            marquee_padding: 1,
            ..MonitorConfig::default()
        }
    }

    fn table() -> EffectTable {
        EffectTable::new(vec![EffectBand::new(0, "ab"), EffectBand::new(100, "xyz")]).unwrap()
    }

    fn online_state(ppm: u32) -> SharedState {
        let state = SharedState::new(Instant::now());
        let address: HostAddress = "10.0.0.2".try_into().unwrap();
        state.set_address(Some(address));
        state.record(Reading::new(ppm, Instant::now()));
        state
    }

    #[test]
    fn test_full_pass_pushes_dwell_plus_remaining_offsets() {
        let state = online_state(50);
        let effects = table();
        let shutdown = Shutdown::new();
        let mut renderer =
            MarqueeRenderer::new(RecordingDisplay::new(&state), &state, &effects, &config());

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Completed);
        // "ab" plus one space: offset 0 held for 5 frames, then offsets 1 and 2.
        assert_eq!(renderer.display().pushes, 7);
        assert_eq!(renderer.display().blank_pushes, 0);
    }

    #[test]
    fn test_band_change_interrupts_pass() {
        let state = online_state(50);
        let effects = table();
        let shutdown = Shutdown::new();
        let mut display = RecordingDisplay::new(&state);
        display.change_after = Some((5, 150));
        let mut renderer = MarqueeRenderer::new(display, &state, &effects, &config());

        assert_eq!(
            block_on(renderer.run_cycle(&shutdown)),
            CycleOutcome::Interrupted
        );
        assert_eq!(renderer.display().pushes, 5);

        // Next pass sweeps "xyz" plus one space from offset 0.
        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Completed);
        assert_eq!(renderer.display().pushes, 5 + 8);
    }

    #[test]
    fn test_change_within_band_keeps_sweeping() {
        let state = online_state(50);
        let effects = table();
        let shutdown = Shutdown::new();
        let mut display = RecordingDisplay::new(&state);
        display.change_after = Some((2, 60));
        let mut renderer = MarqueeRenderer::new(display, &state, &effects, &config());

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Completed);
        assert_eq!(renderer.display().pushes, 7);
    }

    #[test]
    fn test_push_failures_skip_frames_without_stopping() {
        let state = online_state(50);
        let effects = table();
        let shutdown = Shutdown::new();
        let mut display = RecordingDisplay::new(&state);
        display.fail_every = Some(2);
        let mut renderer = MarqueeRenderer::new(display, &state, &effects, &config());

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Completed);
        assert_eq!(renderer.display().pushes, 7);
        assert_eq!(renderer.display().failures, 3);

        // The next pass starts normally.
        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Completed);
        assert_eq!(renderer.display().pushes, 14);
    }

    #[test]
    fn test_offline_pushes_blank_frame() {
        let state = SharedState::new(Instant::now());
        state.record(Reading::new(50, Instant::now()));
        let effects = table();
        let shutdown = Shutdown::new();
        let mut renderer =
            MarqueeRenderer::new(RecordingDisplay::new(&state), &state, &effects, &config());

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Blank);
        assert_eq!(renderer.display().pushes, 1);
        assert_eq!(renderer.display().blank_pushes, 1);
    }

    #[test]
    fn test_suppressed_display_stays_blank() {
        let state = online_state(50);
        let effects = table();
        let shutdown = Shutdown::new();
        let mut config = config();
        config.display.suppress = true;
        let mut renderer =
            MarqueeRenderer::new(RecordingDisplay::new(&state), &state, &effects, &config);

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Blank);
        assert!(renderer.frame().is_blank());
    }

    #[test]
    fn test_waiting_frame_before_first_reading() {
        let state = SharedState::new(Instant::now());
        let address: HostAddress = "10.0.0.2".try_into().unwrap();
        state.set_address(Some(address));
        let effects = table();
        let shutdown = Shutdown::new();
        let mut renderer =
            MarqueeRenderer::new(RecordingDisplay::new(&state), &state, &effects, &config());

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Waiting);
        assert_eq!(renderer.display().pushes, 1);
        assert!(!renderer.frame().is_blank());
    }

    #[test]
    fn test_shutdown_stops_cycle_and_run_blanks_panel() {
        let state = online_state(50);
        let effects = table();
        let shutdown = Shutdown::new();
        shutdown.request();
        let mut renderer =
            MarqueeRenderer::new(RecordingDisplay::new(&state), &state, &effects, &config());

        assert_eq!(block_on(renderer.run_cycle(&shutdown)), CycleOutcome::Stopped);
        assert_eq!(renderer.display().pushes, 0);

        block_on(renderer.run(&shutdown));
        assert_eq!(renderer.display().pushes, 1);
        assert_eq!(renderer.display().blank_pushes, 1);
    }
}
