// Interrupt requests raised by the video core, collected by the driver.
// Bit layout matches IF (0xFF0F).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptSource {
    VBlank = 0b0000_0001,
    Stat   = 0b0000_0010,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intf(u8);

impl Intf {
    pub fn new() -> Self {
        Intf(0)
    }

    pub fn set_interrupt(&mut self, src: InterruptSource) {
        self.0 |= src as u8;
    }

    pub fn is_set(&self, src: InterruptSource) -> bool {
        self.0 & src as u8 != 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    // Hand pending requests over and clear them.
    pub fn take(&mut self) -> Intf {
        std::mem::take(self)
    }
}
