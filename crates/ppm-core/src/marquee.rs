//! Horizontally scrolling text
//!
//! A [`Marquee`] is a description followed by blank padding, viewed through a
//! window a fixed number of characters wide. The window position is a modulo
//! index into the padded text, so the tail of the text is followed by the
//! padding and then by its own head again.
//!
//! [`Marquee::sweep`] yields one [`MarqueeFrame`] per offset, starting at 0
//! and ending after the last character: a finite pass that can be restarted
//! by calling `sweep` again.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

/// Position of the scroll window within the padded text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollCursor {
    offset: usize,
}

impl ScrollCursor {
    pub const fn new() -> Self {
        Self { offset: 0 }
    }

    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Move one character forward in a text of `len` characters.
    ///
    /// Returns `true` when the cursor wrapped back to offset 0.
    pub fn advance(&mut self, len: usize) -> bool {
        self.offset += 1;
        if self.offset >= len {
            self.offset = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

/// One step of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarqueeFrame {
    pub offset: usize,
    /// Visible characters, exactly `columns` long
    pub text: String,
    /// Number of times to show this frame (the dwell at offset 0)
    pub repeats: u8,
}

/// Padded text plus window geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marquee {
    padded: Vec<char>,
    columns: usize,
    dwell_frames: u8,
}

impl Marquee {
    pub fn new(description: &str, padding: usize, columns: usize, dwell_frames: u8) -> Self {
        let mut padded: Vec<char> = description.chars().collect();
        padded.extend(core::iter::repeat_n(' ', padding));
        if padded.is_empty() {
            padded.push(' ');
        }

        Self {
            padded,
            columns,
            dwell_frames: dwell_frames.max(1),
        }
    }

    /// Number of frames in one full pass
    pub fn pass_len(&self) -> usize {
        self.padded.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Visible characters with the window starting at `offset`.
    pub fn window(&self, offset: usize) -> String {
        let len = self.padded.len();
        (0..self.columns)
            .map(|i| self.padded[(offset + i) % len])
            .collect()
    }

    /// Start a new pass at offset 0.
    pub fn sweep(&self) -> Sweep<'_> {
        Sweep {
            marquee: self,
            cursor: ScrollCursor::new(),
            finished: false,
        }
    }
}

/// Iterator over the frames of one pass.
pub struct Sweep<'a> {
    marquee: &'a Marquee,
    cursor: ScrollCursor,
    finished: bool,
}

impl Sweep<'_> {
    /// Offset of the next frame to be yielded (0 once the pass completed).
    pub fn cursor(&self) -> ScrollCursor {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Iterator for Sweep<'_> {
    type Item = MarqueeFrame;

    fn next(&mut self) -> Option<MarqueeFrame> {
        if self.finished {
            return None;
        }

        let offset = self.cursor.offset();
        let frame = MarqueeFrame {
            offset,
            text: self.marquee.window(offset),
            repeats: if offset == 0 {
                self.marquee.dwell_frames
            } else {
                1
            },
        };
        self.finished = self.cursor.advance(self.marquee.pass_len());
        Some(frame)
    }
}
