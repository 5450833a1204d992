use crate::bit::Bit;

// STAT (LCD status) (R/W) - FF41
/*
|Bit| Name                                 | Usage notes          |
| 6 | LYC=LY STAT Interrupt source         | 0=Off, 1=On          |
| 5 | Mode 2 OAM STAT Interrupt source     | 0=Off, 1=On          |
| 4 | Mode 1 VBlank STAT Interrupt source  | 0=Off, 1=On          |
| 3 | Mode 0 HBlank STAT Interrupt source  | 0=Off, 1=On          |
| 2 | LYC=LY Flag                          | 0=Different, 1=Equal |
|1-0| Mode Flag                            | Mode 0-3             |
*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    // Mode 2, one step per OAM entry.
    Search,
    // Mode 3, pixels are pushed to the LCD.
    Transfer,
    // Mode 0, HBlank.
    LineBlank,
    // Mode 1, VBlank.
    FrameBlank,
}

impl Mode {
    pub fn bits(self) -> u8 {
        match self {
            Mode::LineBlank => 0,
            Mode::FrameBlank => 1,
            Mode::Search => 2,
            Mode::Transfer => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct STAT(u8);

impl STAT {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn lyc_interrupt(&self) -> bool {
        self.0.bit(6)
    }

    // Whether entering `mode` should request a STAT interrupt.
    pub fn mode_interrupt(&self, mode: Mode) -> bool {
        match mode {
            Mode::Search => self.0.bit(5),
            Mode::FrameBlank => self.0.bit(4),
            Mode::LineBlank => self.0.bit(3),
            Mode::Transfer => false,
        }
    }

    pub fn coincidence(&self) -> bool {
        self.0.bit(2)
    }

    pub fn set_coincidence(&mut self, equal: bool) {
        if equal {
            self.0.set(2)
        } else {
            self.0.reset(2)
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.0 = (self.0 & !0b11) | mode.bits();
    }

    pub fn read(&self) -> u8 {
        0x80 | self.0
    }

    // Mode flag and LYC=LY flag are read only.
    pub fn write(&mut self, b: u8) {
        self.0 = (b & 0b0111_1000) | (self.0 & 0b0000_0111);
    }
}
