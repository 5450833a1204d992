// Units shared by the channels. All of them are clocked by the frame
// sequencer, never by the master clock directly.

use crate::bit::Bit;

// Silences the channel once `max - NRx1` frame sequencer length clocks have
// passed, when enabled by NRx4 bit 6.
#[derive(Debug, Clone)]
pub struct LengthCounter {
    counter: u16,
    max: u16,
    pub enabled: bool,
}

impl LengthCounter {
    pub fn new(max: u16) -> Self {
        Self { counter: 0, max, enabled: false }
    }

    pub fn load(&mut self, value: u8) {
        self.counter = self.max - (u16::from(value) % self.max);
    }

    // Returns true when the counter just ran out.
    pub fn clock(&mut self) -> bool {
        if !self.enabled || self.counter == 0 {
            return false;
        }
        self.counter -= 1;
        self.counter == 0
    }

    pub fn trigger(&mut self) {
        if self.counter == 0 {
            self.counter = self.max;
        }
    }

    pub fn remaining(&self) -> u16 {
        self.counter
    }
}

// Volume envelope programmed through NRx2.
// Bit 7-4 - Initial volume
// Bit 3   - Direction (0=Decrease, 1=Increase)
// Bit 2-0 - Sweep pace (0=No sweep)
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    pub volume: u8,
    timer: u8,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    // The DAC is off when both the initial volume and direction are zero.
    pub fn dac_enabled(nrx2: u8) -> bool {
        nrx2 & 0xF8 != 0
    }

    pub fn trigger(&mut self, nrx2: u8) {
        self.volume = nrx2 >> 4;
        self.timer = nrx2 & 0x07;
    }

    pub fn clock(&mut self, nrx2: u8) {
        let pace = nrx2 & 0x07;
        if pace == 0 {
            return;
        }
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return;
        }
        self.timer = pace;
        if nrx2.bit(3) {
            if self.volume < 15 {
                self.volume += 1;
            }
        } else if self.volume > 0 {
            self.volume -= 1;
        }
    }
}

// Channel 1 frequency sweep, programmed through NR10.
// Bit 6-4 - Pace
// Bit 3   - Direction (0=Addition, 1=Subtraction)
// Bit 2-0 - Individual step
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    enabled: bool,
    shadow: u16,
    timer: u8,
}

pub enum SweepEffect {
    None,
    Update(u16),
    Overflow,
}

impl Sweep {
    pub fn new() -> Self {
        Self::default()
    }

    fn pace(nr10: u8) -> u8 {
        (nr10 >> 4) & 0x07
    }

    fn reload(&mut self, nr10: u8) {
        self.timer = match Self::pace(nr10) {
            0 => 8,
            pace => pace,
        };
    }

    fn next(&self, nr10: u8) -> u16 {
        let delta = self.shadow >> (nr10 & 0x07);
        if nr10.bit(3) {
            self.shadow.wrapping_sub(delta)
        } else {
            self.shadow + delta
        }
    }

    // A trigger with a non-zero step checks for overflow straight away.
    pub fn trigger(&mut self, nr10: u8, frequency: u16) -> SweepEffect {
        self.shadow = frequency;
        self.reload(nr10);
        self.enabled = Self::pace(nr10) != 0 || nr10 & 0x07 != 0;
        if nr10 & 0x07 != 0 && self.next(nr10) > 0x7FF {
            return SweepEffect::Overflow;
        }
        SweepEffect::None
    }

    pub fn clock(&mut self, nr10: u8) -> SweepEffect {
        if !self.enabled {
            return SweepEffect::None;
        }
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return SweepEffect::None;
        }
        self.reload(nr10);
        if Self::pace(nr10) == 0 {
            return SweepEffect::None;
        }

        let frequency = self.next(nr10);
        if frequency > 0x7FF {
            return SweepEffect::Overflow;
        }
        if nr10 & 0x07 == 0 {
            return SweepEffect::None;
        }
        self.shadow = frequency;
        if self.next(nr10) > 0x7FF {
            return SweepEffect::Overflow;
        }
        SweepEffect::Update(frequency)
    }
}

// 11-bit frequency split across NRx3 (low) and NRx4 bits 2-0 (high). The
// field width keeps it at 2047 at most, so 2048 - x is never zero.
pub fn frequency(nrx3: u8, nrx4: u8) -> u16 {
    u16::from(nrx4 & 0x07) << 8 | u16::from(nrx3)
}

// Master clock pulses between two steps of a waveform with `steps` steps per
// period, for a channel running at `base / (2048 - x)` Hz.
pub fn step_period(base: u32, raw: u16, steps: u32) -> u32 {
    let frequency = base / (2048 - u32::from(raw & 0x7FF));
    crate::CLOCK_FREQUENCY / (frequency * steps)
}
