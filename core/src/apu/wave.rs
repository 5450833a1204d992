use super::components::{frequency, step_period, LengthCounter};
use crate::bit::Bit;

// Base of the channel frequency, f = WAVE_RATE / (2048 - x) Hz.
pub const WAVE_RATE: u32 = 65_536;
pub const WAVE_SAMPLES: u32 = 32;

// Output level (NR32 bit 6-5) as a right shift: mute, 100%, 50%, 25%.
const VOLUME_SHIFT: [u8; 4] = [4, 0, 1, 2];

// Plays back 32 four bit samples from wave RAM.
//
// FF1A NR30 - Bit 7 channel on/off
// FF1B NR31 - Length load
// FF1C NR32 - Bit 6-5 output level
// FF1D NR33 - Frequency low
// FF1E NR34 - Bit 7 restart, bit 6 length enable, bit 2-0 frequency high
// FF30-FF3F - Wave pattern RAM, high nibble first
pub struct WaveChannel {
    nrx0: u8,
    nrx1: u8,
    nrx2: u8,
    nrx3: u8,
    nrx4: u8,
    pattern: [u8; 16],
    length: LengthCounter,
    enabled: bool,
    index: u8,
    ticks: u32,
    sample: u8,
}

impl Default for WaveChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveChannel {
    pub fn new() -> Self {
        Self {
            nrx0: 0,
            nrx1: 0,
            nrx2: 0,
            nrx3: 0,
            nrx4: 0,
            pattern: [0; 16],
            length: LengthCounter::new(256),
            enabled: false,
            index: 0,
            ticks: 0,
            sample: 0,
        }
    }

    // One master clock pulse. Returns the channel's current output level,
    // 0-15.
    pub fn tick(&mut self) -> u8 {
        if self.nrx4.bit(7) {
            self.nrx4.reset(7);
            self.restart();
        }

        if !self.enabled || !self.nrx0.bit(7) {
            return 0;
        }

        let period = step_period(WAVE_RATE, frequency(self.nrx3, self.nrx4), WAVE_SAMPLES);
        self.ticks += 1;
        if self.ticks >= period {
            self.ticks = 0;
            self.index = (self.index + 1) % WAVE_SAMPLES as u8;
            self.sample = self.nibble(self.index) >> self.volume_shift();
        }
        self.sample
    }

    fn restart(&mut self) {
        log::trace!("wave channel restart, frequency {:#05X}", frequency(self.nrx3, self.nrx4));
        self.enabled = true;
        self.index = 0;
        self.ticks = 0;
        self.length.trigger();
    }

    fn nibble(&self, index: u8) -> u8 {
        let byte = self.pattern[usize::from(index / 2)];
        if index % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    fn volume_shift(&self) -> u8 {
        VOLUME_SHIFT[usize::from((self.nrx2 >> 5) & 0x03)]
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn clock_length(&mut self) {
        if self.length.clock() {
            self.enabled = false;
        }
    }

    pub fn read_register(&self, reg: u8) -> u8 {
        match reg {
            0 => self.nrx0,
            1 => self.nrx1,
            2 => self.nrx2,
            3 => self.nrx3,
            4 => self.nrx4,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, reg: u8, value: u8) {
        log::trace!("NR3{} <- {:#04X}", reg, value);
        match reg {
            0 => self.nrx0 = value,
            1 => {
                self.nrx1 = value;
                self.length.load(value);
            }
            2 => self.nrx2 = value,
            3 => self.nrx3 = value,
            4 => {
                self.nrx4 = value;
                self.length.enabled = value.bit(6);
            }
            _ => {}
        }
    }

    pub fn read_pattern(&self, offset: u8) -> u8 {
        self.pattern[usize::from(offset & 0x0F)]
    }

    pub fn write_pattern(&mut self, offset: u8, value: u8) {
        self.pattern[usize::from(offset & 0x0F)] = value;
    }

    pub fn pattern(&self) -> &[u8; 16] {
        &self.pattern
    }

    // Power off clears the registers but leaves wave RAM alone.
    pub fn power_off(&mut self) {
        let pattern = self.pattern;
        *self = Self::new();
        self.pattern = pattern;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Ramp 0,1,...,15,15,14,...,0.
    const RAMP: [u8; 16] = [
        0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32,
        0x10,
    ];

    // Highest frequency, one sample every 2 pulses.
    fn channel(level: u8) -> WaveChannel {
        let mut ch = WaveChannel::new();
        for (i, b) in RAMP.iter().enumerate() {
            ch.write_pattern(i as u8, *b);
        }
        ch.write_register(0, 0x80);
        ch.write_register(2, level << 5);
        ch.write_register(3, 0xFF);
        ch.write_register(4, 0x87);
        ch
    }

    #[test]
    fn plays_pattern() {
        let mut ch = channel(1);
        let out: Vec<u8> = (0..8).map(|_| ch.tick()).collect();
        // Index starts at 0 and is advanced before being read.
        assert_eq!(out, vec![0, 1, 1, 2, 2, 3, 3, 4]);
        assert!(ch.enabled());
        // Restart bit self clears.
        assert_eq!(ch.read_register(4) & 0x80, 0);
    }

    #[test]
    fn wraps_after_32_samples() {
        let mut ch = channel(1);
        for _ in 0..64 {
            ch.tick();
        }
        assert_eq!(ch.index(), 0);
        ch.tick();
        assert_eq!(ch.tick(), 1);
    }

    #[test]
    fn volume_shift() {
        for (level, expected) in [(0, 0), (1, 0x0F), (2, 0x07), (3, 0x03)] {
            let mut ch = channel(level);
            // Index 15 holds 0xF.
            let mut last = 0;
            for _ in 0..30 {
                last = ch.tick();
            }
            assert_eq!(ch.index(), 15);
            assert_eq!(last, expected, "level {}", level);
        }
    }

    #[test]
    fn restart_resets_phase() {
        let mut ch = channel(1);
        for _ in 0..21 {
            ch.tick();
        }
        assert_eq!(ch.index(), 10);
        ch.write_register(4, 0x87);
        ch.tick();
        assert_eq!(ch.index(), 0);
        ch.tick();
        assert_eq!(ch.index(), 1);
    }

    #[test]
    fn silent_when_off() {
        let mut ch = channel(1);
        ch.write_register(0, 0x00);
        ch.write_register(4, 0x87);
        for _ in 0..16 {
            assert_eq!(ch.tick(), 0);
        }
        // Restart still latched.
        assert!(ch.enabled());
        assert_eq!(ch.index(), 0);

        let mut idle = WaveChannel::new();
        idle.write_register(0, 0x80);
        assert_eq!(idle.tick(), 0);
        assert!(!idle.enabled());
    }

    #[test]
    fn slow_frequency() {
        let mut ch = channel(1);
        ch.write_register(3, 0x00);
        ch.write_register(4, 0x80);
        for _ in 0..4095 {
            ch.tick();
        }
        assert_eq!(ch.index(), 0);
        ch.tick();
        assert_eq!(ch.index(), 1);
    }

    #[test]
    fn length_stops_channel() {
        let mut ch = channel(1);
        ch.write_register(1, 254);
        ch.write_register(4, 0xC7);
        ch.tick();
        ch.clock_length();
        assert!(ch.enabled());
        ch.clock_length();
        assert!(!ch.enabled());
        assert_eq!(ch.tick(), 0);
    }

    #[test]
    fn power_off_keeps_pattern() {
        let mut ch = channel(1);
        ch.tick();
        ch.power_off();
        assert_eq!(ch.pattern(), &RAMP);
        assert_eq!(ch.read_register(0), 0);
        assert!(!ch.enabled());
    }
}
