//! Four-line status view for a 128x32 monochrome panel
//!
//! ```text
//! Current PPM: 612 +
//! Changed: 4 seconds ago
//! Effects:
//! ent air     Normal backgr   <- marquee window
//! ```

use core::fmt::Write;

use embedded_graphics::Drawable;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::trend::Trend;

/// Glyph width of the status font in pixels
pub const CHAR_WIDTH_PX: u32 = 5;

/// Line pitch of the status font in pixels
pub const LINE_HEIGHT_PX: u32 = 8;

/// Header lines plus the marquee line
pub const STATUS_LINES: u32 = 4;

const MAX_LINE_LEN: usize = 48;

/// Minimum panel height that fits every status line
pub const fn status_view_height() -> u32 {
    STATUS_LINES * LINE_HEIGHT_PX
}

/// Everything the status view shows for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView<'a> {
    /// Current value, `None` until the sensor answered once
    pub concentration: Option<u32>,
    /// Direction of a recent change, `None` once the change is stale
    pub trend: Option<Trend>,
    pub seconds_since_change: u64,
    /// Visible part of the marquee
    pub marquee: &'a str,
}

impl StatusView<'_> {
    fn header(&self) -> heapless::String<MAX_LINE_LEN> {
        let mut line = heapless::String::new();
        // Overflow only truncates the line.
        let _ = match self.concentration {
            Some(ppm) => write!(line, "Current PPM: {ppm}"),
            None => write!(line, "Current PPM: --"),
        };
        if let Some(trend) = self.trend {
            let _ = write!(line, " {}", trend.arrow());
        }
        line
    }

    fn changed(&self) -> heapless::String<MAX_LINE_LEN> {
        let mut line = heapless::String::new();
        let _ = write!(line, "Changed: {} seconds ago", self.seconds_since_change);
        line
    }

    fn line_origin(index: u32) -> Point {
        Point::new(0, (index * LINE_HEIGHT_PX) as i32)
    }
}

impl Drawable for StatusView<'_> {
    type Color = BinaryColor;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        let header = self.header();
        let changed = self.changed();
        let lines = [header.as_str(), changed.as_str(), "Effects:", self.marquee];

        for (index, line) in (0u32..).zip(lines) {
            Text::with_baseline(line, Self::line_origin(index), style, Baseline::Top)
                .draw(target)?;
        }
        Ok(())
    }
}
