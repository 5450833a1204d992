// Output side of the core. These calls are the only externally visible effects
// of ticking the video and audio state machines. Implementations must not
// block and must not call back into the core.

use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

// Palette register a colour index has to be looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelSource {
    // BGP, background and window.
    #[default]
    Background,
    // OBP0
    Sprite0,
    // OBP1
    Sprite1,
}

pub trait VideoSink {
    // One 2-bit colour index, left to right, top to bottom.
    fn write_pixel(&mut self, color: u8);
    fn end_of_line(&mut self);
    fn end_of_frame(&mut self);
    // Stands in for a pixel while the display is switched off.
    fn blank(&mut self);

    // What the pipeline actually calls. Sinks that map colours themselves
    // need the source, the rest can ignore it.
    fn write_source_pixel(&mut self, color: u8, _source: PixelSource) {
        self.write_pixel(color);
    }
}

pub trait AudioSink {
    // Sum of the channel outputs, 0-60.
    fn write_sample(&mut self, level: u8);
}

// Colour index used for positions produced while the LCD is off.
pub const BLANK_COLOR: u8 = 0;

// Collects colour indices for one frame at a time, plus the palette each
// index belongs to.
pub struct FrameBuffer {
    pub pixels: Box<[u8; SCREEN_WIDTH * SCREEN_HEIGHT]>,
    pub sources: Box<[PixelSource; SCREEN_WIDTH * SCREEN_HEIGHT]>,
    x: usize,
    y: usize,
    frames: u64,
    blanking: bool,
    blanked: bool,
    updated: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: Box::new([BLANK_COLOR; SCREEN_WIDTH * SCREEN_HEIGHT]),
            sources: Box::new([PixelSource::Background; SCREEN_WIDTH * SCREEN_HEIGHT]),
            x: 0,
            y: 0,
            frames: 0,
            blanking: false,
            blanked: false,
            updated: false,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn source(&self, x: usize, y: usize) -> PixelSource {
        self.sources[y * SCREEN_WIDTH + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH]
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    // True if the last completed frame was produced with the LCD off.
    pub fn blanked(&self) -> bool {
        self.blanked
    }

    // Check if a frame has completed since last call.
    pub fn check_updated(&mut self) -> bool {
        std::mem::replace(&mut self.updated, false)
    }

    fn put(&mut self, color: u8, source: PixelSource) {
        if self.x < SCREEN_WIDTH && self.y < SCREEN_HEIGHT {
            let i = self.y * SCREEN_WIDTH + self.x;
            self.pixels[i] = color;
            self.sources[i] = source;
        }
        self.x += 1;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSink for FrameBuffer {
    fn write_pixel(&mut self, color: u8) {
        self.put(color & 0b11, PixelSource::Background);
    }

    fn write_source_pixel(&mut self, color: u8, source: PixelSource) {
        self.put(color & 0b11, source);
    }

    fn end_of_line(&mut self) {
        self.x = 0;
        self.y += 1;
    }

    fn end_of_frame(&mut self) {
        self.x = 0;
        self.y = 0;
        self.frames += 1;
        self.blanked = std::mem::replace(&mut self.blanking, false);
        self.updated = true;
    }

    fn blank(&mut self) {
        self.blanking = true;
        self.put(BLANK_COLOR, PixelSource::Background);
    }
}

#[derive(Default)]
pub struct SampleBuffer {
    pub samples: Vec<u8>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.samples)
    }
}

impl AudioSink for SampleBuffer {
    fn write_sample(&mut self, level: u8) {
        self.samples.push(level);
    }
}
