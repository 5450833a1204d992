use crate::bit::Bit;

// LCDC (LCD control) (R/W) - FF40
// Main control register, its bits toggle what elements are displayed and how.
/*
|Bit| Name                          | Usage notes              |
| 7 | LCD and PPU enable            | 0=Off, 1=On              |
| 6 | Window tile map area          | 0=9800-9BFF, 1=9C00-9FFF |
| 5 | Window enable                 | 0=Off, 1=On              |
| 4 | BG and Window tile data area  | 0=8800-97FF, 1=8000-8FFF |
| 3 | BG tile map area              | 0=9800-9BFF, 1=9C00-9FFF |
| 2 | OBJ size                      | 0=8x8, 1=8x16            |
| 1 | OBJ enable                    | 0=Off, 1=On              |
| 0 | BG and Window enable/priority | 0=Off, 1=On              |
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LCDC(pub u8);

// Tile map base addresses selected by bits 3 and 6.
pub const TILE_MAPS: [u16; 2] = [0x9800, 0x9C00];

impl LCDC {
    // Value left behind by the boot ROM.
    pub fn new() -> Self {
        LCDC(0x91)
    }

    pub fn lcd_enable(&self) -> bool {
        self.0.bit(7)
    }

    pub fn window_tilemap(&self) -> u16 {
        TILE_MAPS[usize::from(self.0.bit(6))]
    }

    pub fn window_enable(&self) -> bool {
        self.0.bit(5)
    }

    // Tile data base and whether tile IDs are signed against it.
    pub fn tile_data(&self) -> (u16, bool) {
        if self.0.bit(4) {
            (0x8000, false)
        } else {
            (0x9000, true)
        }
    }

    pub fn bg_tilemap(&self) -> u16 {
        TILE_MAPS[usize::from(self.0.bit(3))]
    }

    pub fn sprite_size(&self) -> u8 {
        if self.0.bit(2) {
            16
        } else {
            8
        }
    }

    pub fn sprite_enable(&self) -> bool {
        self.0.bit(1)
    }

    pub fn bg_window_enable(&self) -> bool {
        self.0.bit(0)
    }
}

impl Default for LCDC {
    fn default() -> Self {
        Self::new()
    }
}
