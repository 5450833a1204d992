#![allow(clippy::upper_case_acronyms)]

pub mod apu;
pub mod bus;
pub mod gpu;
pub mod intf;
pub mod memory;
pub mod sink;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Master clock, one pulse per dot.
pub const CLOCK_FREQUENCY: u32 = 4_194_304;

mod bit;
mod clock;

pub use apu::{ApuConfig, APU};
pub use bus::MemoryBus;
pub use gpu::GPU;
pub use memory::{MemoryError, Mmu, Ram};
pub use sink::{AudioSink, FrameBuffer, PixelSource, SampleBuffer, VideoSink};
