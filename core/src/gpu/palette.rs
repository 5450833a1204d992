/*  Shades - B/W (u8)
    White   = 255,
    Light   = 192,
    Dark    = 96,
    Black   = 0
*/

pub const GREY_SHADES: [u8; 4] = [0xFF, 0xC0, 0x60, 0x00];
pub const CLASSIC_COLOURS: [u32; 4] = [0xe0f8d0, 0x88c070, 0x346856, 0x081820];

// Maps 2-bit colour indices through a BGP/OBP style register onto output
// colours. The core itself only ever emits raw indices.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    data: u8,
    colours: [u32; 4],
}

impl Palette {
    pub fn new(data: u8) -> Self {
        Self { data, colours: CLASSIC_COLOURS }
    }

    // Shade number (0 lightest, 3 darkest) for a colour index.
    pub fn shade(&self, idx: u8) -> u8 {
        self.data >> (2 * (idx & 3)) & 3
    }

    pub fn colour(&self, idx: u8) -> u32 {
        self.colours[usize::from(self.shade(idx))]
    }

    pub fn grey(&self, idx: u8) -> u8 {
        GREY_SHADES[usize::from(self.shade(idx))]
    }
}
