use super::components::{Envelope, LengthCounter};
use crate::bit::Bit;

const DIVISORS: [u32; 8] = [8, 16, 32, 48, 64, 80, 96, 112];

// 15-bit linear feedback shift register. In 7-bit mode the feedback is also
// written to bit 6, giving a short, more tonal sequence.
#[derive(Debug, Clone)]
pub struct Lfsr(u16);

impl Default for Lfsr {
    fn default() -> Self {
        Self(0x7FFF)
    }
}

impl Lfsr {
    pub fn clock(&mut self, short: bool) {
        let feedback = (self.0 ^ (self.0 >> 1)) & 1;
        self.0 = (self.0 >> 1) | (feedback << 14);
        if short {
            self.0 = (self.0 & !0x40) | (feedback << 6);
        }
    }

    // The channel is high while bit 0 is clear.
    pub fn high(&self) -> bool {
        self.0 & 1 == 0
    }
}

// FF20 NR41 - Bit 5-0 length load
// FF21 NR42 - Envelope
// FF22 NR43 - Bit 7-4 clock shift, bit 3 width (1=7 bits), bit 2-0 divisor
// FF23 NR44 - Bit 7 restart, bit 6 length enable
pub struct NoiseChannel {
    nrx1: u8,
    nrx2: u8,
    nrx3: u8,
    nrx4: u8,
    length: LengthCounter,
    envelope: Envelope,
    lfsr: Lfsr,
    enabled: bool,
    ticks: u32,
}

impl Default for NoiseChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseChannel {
    pub fn new() -> Self {
        Self {
            nrx1: 0,
            nrx2: 0,
            nrx3: 0,
            nrx4: 0,
            length: LengthCounter::new(64),
            envelope: Envelope::new(),
            lfsr: Lfsr::default(),
            enabled: false,
            ticks: 0,
        }
    }

    // Master clock pulses per shift.
    fn period(&self) -> u32 {
        DIVISORS[usize::from(self.nrx3 & 0x07)] << (self.nrx3 >> 4)
    }

    pub fn tick(&mut self) -> u8 {
        if self.nrx4.bit(7) {
            self.nrx4.reset(7);
            self.enabled = Envelope::dac_enabled(self.nrx2);
            self.ticks = 0;
            self.lfsr = Lfsr::default();
            self.length.trigger();
            self.envelope.trigger(self.nrx2);
        }

        if !self.enabled {
            return 0;
        }

        self.ticks += 1;
        if self.ticks >= self.period() {
            self.ticks = 0;
            self.lfsr.clock(self.nrx3.bit(3));
        }

        if self.lfsr.high() {
            self.envelope.volume
        } else {
            0
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn clock_length(&mut self) {
        if self.length.clock() {
            self.enabled = false;
        }
    }

    pub fn clock_envelope(&mut self) {
        if self.enabled {
            self.envelope.clock(self.nrx2);
        }
    }

    // Register 0 is the unused FF1F.
    pub fn read_register(&self, reg: u8) -> u8 {
        match reg {
            1 => self.nrx1,
            2 => self.nrx2,
            3 => self.nrx3,
            4 => self.nrx4,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, reg: u8, value: u8) {
        match reg {
            1 => {
                self.nrx1 = value;
                self.length.load(value & 0x3F);
            }
            2 => {
                self.nrx2 = value;
                if !Envelope::dac_enabled(value) {
                    self.enabled = false;
                }
            }
            3 => self.nrx3 = value,
            4 => {
                self.nrx4 = value;
                self.length.enabled = value.bit(6);
            }
            _ => {}
        }
    }

    pub fn power_off(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lfsr_sequences() {
        // Ones shift out before the first zero reaches bit 0.
        let mut lfsr = Lfsr::default();
        for _ in 0..14 {
            lfsr.clock(false);
            assert!(!lfsr.high());
        }
        lfsr.clock(false);
        assert!(lfsr.high());

        let mut lfsr = Lfsr::default();
        for _ in 0..6 {
            lfsr.clock(true);
            assert!(!lfsr.high());
        }
        lfsr.clock(true);
        assert!(lfsr.high());
    }

    #[test]
    fn shifts_at_divided_rate() {
        let mut ch = NoiseChannel::new();
        ch.write_register(2, 0xA0);
        // Divisor 16, shift 1: one clock every 32 pulses, 7-bit mode.
        ch.write_register(3, 0x19);
        ch.write_register(4, 0x80);
        for _ in 0..(32 * 7 - 1) {
            assert_eq!(ch.tick(), 0);
        }
        assert_eq!(ch.tick(), 10);
    }

    #[test]
    fn length_and_dac() {
        let mut ch = NoiseChannel::new();
        ch.write_register(1, 63);
        ch.write_register(2, 0xF0);
        ch.write_register(4, 0xC0);
        ch.tick();
        assert!(ch.enabled());
        ch.clock_length();
        assert!(!ch.enabled());

        ch.write_register(4, 0x80);
        ch.tick();
        assert!(ch.enabled());
        ch.write_register(2, 0x00);
        assert!(!ch.enabled());
        assert_eq!(ch.read_register(0), 0xFF);
    }
}
