use crate::bus::MemoryBus;
use crate::memory::OAM_START;

pub const OAM_ENTRIES: u8 = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;
// TODO: 8x16 sprites (LCDC bit 2) need the tile pair and a 16 line window.
pub const SPRITE_HEIGHT: u16 = 8;

// Byte 3 - Attributes.
// Bit7   OBJ-to-BG Priority (0=OBJ Above BG, 1=OBJ Behind BG color 1-3)
pub const SPRITE_BEHIND_BG: u8 = 1 << 7;
// Bit6   Y flip          (0=Normal, 1=Vertically mirrored)
pub const SPRITE_FLIP_Y: u8 = 1 << 6;
// Bit5   X flip          (0=Normal, 1=Horizontally mirrored)
pub const SPRITE_FLIP_X: u8 = 1 << 5;
// Bit4   Palette number  (0=OBP0, 1=OBP1)
pub const SPRITE_PALETTE: u8 = 1 << 4;

/*
OAM entry as seen by the search phase. Only the position is read up front,
tile index and attributes are left to the fetcher.
Byte 0 - Y position + 16.
Byte 1 - X position + 8.
Byte 2 - Tile index.
Byte 3 - Attributes.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub address: u16,
    pub y: u8,
    pub x: u8,
}

impl Sprite {
    pub fn read(mem: &(impl MemoryBus + ?Sized), index: u8) -> Self {
        let address = OAM_START + u16::from(index) * 4;
        Self {
            address,
            y: mem.read_byte(address),
            x: mem.read_byte(address + 1),
        }
    }

    // Whether any row of the sprite lands on scanline `ly`.
    pub fn on_line(&self, ly: u8) -> bool {
        let top = u16::from(self.y);
        let line = u16::from(ly) + 16;
        line >= top && line < top + SPRITE_HEIGHT
    }

    // Row of the sprite drawn on scanline `ly`, before any flip.
    pub fn line(&self, ly: u8) -> u8 {
        (u16::from(ly) + 16 - u16::from(self.y)) as u8
    }

    // Horizontally on screen at all.
    pub fn visible(&self) -> bool {
        self.x > 0 && self.x < 168
    }

    // Columns hidden past the left edge.
    pub fn offset(&self) -> u8 {
        8u8.saturating_sub(self.x)
    }
}

// Sprites selected for the current line, in OAM order.
#[derive(Debug, Default)]
pub struct LineSprites {
    sprites: Vec<Sprite>,
    found: usize,
}

impl LineSprites {
    pub fn new() -> Self {
        Self { sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE), found: 0 }
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.found = 0;
    }

    // One search step: look at a single OAM slot.
    pub fn search(&mut self, mem: &(impl MemoryBus + ?Sized), index: u8, ly: u8) {
        if self.found >= MAX_SPRITES_PER_LINE {
            return;
        }
        let sprite = Sprite::read(mem, index);
        if !sprite.on_line(ly) {
            return;
        }
        // Off-screen sprites still count towards the per-line limit.
        self.found += 1;
        if sprite.visible() {
            self.sprites.push(sprite);
        }
    }

    // Take the sprite starting at or before screen column `x` with the lowest
    // X, the first in OAM order on a tie. That is also draw priority, the
    // fifo keeps the first sprite pixel mixed into a slot.
    pub fn take_at(&mut self, x: u8) -> Option<Sprite> {
        let (idx, _) = self
            .sprites
            .iter()
            .enumerate()
            .filter(|(_, s)| u16::from(s.x) <= u16::from(x) + 8)
            .min_by_key(|(_, s)| s.x)?;
        Some(self.sprites.remove(idx))
    }

    pub fn pending_at(&self, x: u8) -> bool {
        self.sprites.iter().any(|s| u16::from(s.x) <= u16::from(x) + 8)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}
