use crate::sink::PixelSource;
use std::collections::VecDeque;

pub const FIFO_CAPACITY: usize = 16;
// A fresh tile row may only be queued while at most this many pixels remain.
pub const FIFO_LOW: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePixel {
    pub color: u8,
    pub palette: PixelSource,
    pub behind_bg: bool,
}

// One queue slot. The sprite layer is kept apart from the background until
// the pixel is shifted out, so LCDC bit 0 applies at output time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueuedPixel {
    pub bg: u8,
    pub sprite: Option<SpritePixel>,
}

impl QueuedPixel {
    // Final colour index and the palette it belongs to. With the background
    // off, its pixels read as colour 0 and every sprite shows over them.
    pub fn resolve(&self, bg_enabled: bool) -> (u8, PixelSource) {
        let bg = if bg_enabled { self.bg } else { 0 };
        match self.sprite {
            Some(sprite) if !(sprite.behind_bg && bg != 0) => (sprite.color, sprite.palette),
            _ => (bg, PixelSource::Background),
        }
    }
}

// Bounded queue of 2-bit colour indices between the fetcher and the LCD.
#[derive(Debug, Clone)]
pub struct PixelFifo {
    pixels: VecDeque<QueuedPixel>,
}

impl PixelFifo {
    pub fn new() -> Self {
        Self { pixels: VecDeque::with_capacity(FIFO_CAPACITY) }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    // Room for another row of 8.
    pub fn can_push(&self) -> bool {
        self.pixels.len() <= FIFO_LOW
    }

    // Queue one decoded tile row. Refused (returns false) while more than
    // FIFO_LOW pixels are still waiting.
    pub fn push(&mut self, row: &[u8; 8]) -> bool {
        if !self.can_push() {
            return false;
        }
        self.pixels.extend(row.iter().map(|p| QueuedPixel { bg: p & 0b11, sprite: None }));
        true
    }

    pub fn pop(&mut self) -> Option<QueuedPixel> {
        self.pixels.pop_front()
    }

    // Overlay a sprite pixel on the queued pixel `offset` places from the
    // front. Colour 0 is transparent, and a sprite behind the background only
    // shows over background colour 0. Sprites are mixed lowest X first, so a
    // slot that already holds an opaque sprite pixel keeps it. The queue
    // length never changes.
    pub fn mix(&mut self, offset: usize, pixel: u8, behind_bg: bool, palette: PixelSource) {
        debug_assert!(
            self.pixels.len() >= FIFO_LOW,
            "sprite mixed into a fifo holding {} pixels",
            self.pixels.len()
        );
        let Some(queued) = self.pixels.get_mut(offset) else {
            return;
        };
        let color = pixel & 0b11;
        if color == 0 || queued.sprite.is_some() {
            return;
        }
        queued.sprite = Some(SpritePixel { color, palette, behind_bg });
    }

    pub fn clear(&mut self) {
        self.pixels.clear();
    }
}

impl Default for PixelFifo {
    fn default() -> Self {
        Self::new()
    }
}
