use super::components::{frequency, step_period, Envelope, LengthCounter, Sweep, SweepEffect};
use crate::bit::Bit;

// Base of the channel frequency, f = SQUARE_RATE / (2048 - x) Hz.
pub const SQUARE_RATE: u32 = 131_072;
const DUTY_STEPS: u32 = 8;

const DUTY_PATTERNS: [u8; 4] = [
    0b0000_0001, // 12.5%
    0b1000_0001, // 25%
    0b1000_0111, // 50%
    0b0111_1110, // 75%
];

// Square wave channel, channels 1 and 2. Only channel 1 carries the
// frequency sweep in NR10.
//
// NRx1 - Bit 7-6 duty, bit 5-0 length load
// NRx2 - Envelope
// NRx3 - Frequency low
// NRx4 - Bit 7 restart, bit 6 length enable, bit 2-0 frequency high
pub struct SquareChannel {
    nrx0: u8,
    nrx1: u8,
    nrx2: u8,
    nrx3: u8,
    nrx4: u8,
    length: LengthCounter,
    envelope: Envelope,
    sweep: Option<Sweep>,
    enabled: bool,
    duty_step: u8,
    ticks: u32,
}

impl SquareChannel {
    pub fn new(sweep: bool) -> Self {
        Self {
            nrx0: 0,
            nrx1: 0,
            nrx2: 0,
            nrx3: 0,
            nrx4: 0,
            length: LengthCounter::new(64),
            envelope: Envelope::new(),
            sweep: sweep.then(Sweep::new),
            enabled: false,
            duty_step: 0,
            ticks: 0,
        }
    }

    pub fn tick(&mut self) -> u8 {
        if self.nrx4.bit(7) {
            self.nrx4.reset(7);
            self.restart();
        }

        if !self.enabled {
            return 0;
        }

        let period = step_period(SQUARE_RATE, frequency(self.nrx3, self.nrx4), DUTY_STEPS);
        self.ticks += 1;
        if self.ticks >= period {
            self.ticks = 0;
            self.duty_step = (self.duty_step + 1) % DUTY_STEPS as u8;
        }

        let pattern = DUTY_PATTERNS[usize::from(self.nrx1 >> 6)];
        if pattern.bit(usize::from(7 - self.duty_step)) {
            self.envelope.volume
        } else {
            0
        }
    }

    fn restart(&mut self) {
        self.enabled = Envelope::dac_enabled(self.nrx2);
        self.ticks = 0;
        self.length.trigger();
        self.envelope.trigger(self.nrx2);
        let current = frequency(self.nrx3, self.nrx4);
        if let Some(sweep) = self.sweep.as_mut() {
            if let SweepEffect::Overflow = sweep.trigger(self.nrx0, current) {
                self.enabled = false;
            }
        }
    }

    fn set_frequency(&mut self, value: u16) {
        self.nrx3 = value as u8;
        self.nrx4 = (self.nrx4 & 0xF8) | ((value >> 8) as u8 & 0x07);
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

    pub fn clock_sweep(&mut self) {
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        match sweep.clock(self.nrx0) {
            SweepEffect::None => {}
            SweepEffect::Update(value) => self.set_frequency(value),
            SweepEffect::Overflow => self.enabled = false,
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
        match reg {
            0 => self.nrx0 = value,
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
        *self = Self::new(self.sweep.is_some());
    }
}
