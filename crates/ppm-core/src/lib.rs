//! Hardware-independent core library for ppm
//!
//! This crate contains the platform-agnostic logic of the CO₂ marquee
//! monitor: effect classification, trend tracking, the shared reading
//! snapshot, the sensor polling loop, the marquee rendering loop and the
//! reading publisher.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on embedded
//! targets as well as on desktop hosts (for the monitor binary and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod effects;
pub mod framebuffer;
pub mod marquee;
pub mod poller;
pub mod publisher;
pub mod renderer;
pub mod sensors;
pub mod shutdown;
pub mod state;
pub mod status_view;
pub mod trend;

pub use config::{ConfigError, DisplayConfig, MonitorConfig};
pub use effects::{EffectBand, EffectTable};
pub use framebuffer::FrameBuffer;
pub use marquee::{Marquee, MarqueeFrame, ScrollCursor};
pub use poller::{AddressSource, PollOutcome, SensorPoller};
pub use publisher::{ReadingPublisher, Response, Status, request_head_complete};
pub use renderer::{CycleOutcome, Display, MarqueeRenderer};
pub use sensors::{Reading, Sensor, SensorError};
pub use shutdown::Shutdown;
pub use state::{HostAddress, SharedState, Snapshot};
pub use trend::{Trend, TrendState};
