//! Host stand-ins for the SSD1306 panel.
//!
//! The terminal panel paints each frame with half-block characters, two
//! pixel rows per text row, redrawing in place from the top-left corner.
//! Redirect the log (`2>ppm.log`) to keep the preview readable.

use std::io::{self, Stdout, Write};

use log::trace;
use ppm_core::{Display, FrameBuffer};

use crate::settings::PanelKind;

const CURSOR_HOME: &str = "\x1b[H";
const CLEAR_SCREEN: &str = "\x1b[2J";

pub struct TerminalPanel {
    out: Stdout,
    last_frame: Option<Vec<u8>>,
}

impl TerminalPanel {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            last_frame: None,
        }
    }

    /// Text rendering of `frame`, one line per pair of pixel rows.
    pub fn render(frame: &FrameBuffer) -> String {
        let width = frame.width();
        let mut text = String::with_capacity((width as usize * 3 + 1) * frame.height() as usize / 2);
        for y in (0..frame.height()).step_by(2) {
            for x in 0..width {
                text.push(match (frame.is_on(x, y), frame.is_on(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            text.push('\n');
        }
        text
    }
}

impl Default for TerminalPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TerminalPanel {
    type Error = io::Error;

    fn push(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        if self.last_frame.as_deref() == Some(frame.as_bytes()) {
            return Ok(());
        }

        let mut out = self.out.lock();
        if self.last_frame.is_none() {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        out.write_all(CURSOR_HOME.as_bytes())?;
        out.write_all(Self::render(frame).as_bytes())?;
        out.flush()?;

        self.last_frame = Some(frame.as_bytes().to_vec());
        Ok(())
    }
}

/// Panel that only counts frames.
#[derive(Debug, Default)]
pub struct HeadlessPanel {
    frames: u64,
}

impl Display for HeadlessPanel {
    type Error = io::Error;

    fn push(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        self.frames += 1;
        trace!("Frame {}: {} pixels lit", self.frames, frame.lit_pixels());
        Ok(())
    }
}

/// Panel selected by the settings file.
pub enum Panel {
    Terminal(TerminalPanel),
    Headless(HeadlessPanel),
}

impl Panel {
    pub fn new(kind: PanelKind) -> Self {
        match kind {
            PanelKind::Terminal => Self::Terminal(TerminalPanel::new()),
            PanelKind::Headless => Self::Headless(HeadlessPanel::default()),
        }
    }
}

impl Display for Panel {
    type Error = io::Error;

    fn push(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        match self {
            Self::Terminal(panel) => panel.push(frame),
            Self::Headless(panel) => panel.push(frame),
        }
    }
}
