mod components;
#[cfg(feature = "audio")]
pub mod mixer;
pub mod noise;
pub mod square;
pub mod wave;

use crate::bit::Bit;
use crate::bus::MemoryBus;
use crate::clock::Divider;
use crate::sink::AudioSink;
use crate::CLOCK_FREQUENCY;
use noise::NoiseChannel;
use square::SquareChannel;
use thiserror::Error;
use wave::WaveChannel;

const FRAME_SEQUENCER_RATE: u32 = 512;
const PULSES_PER_FRAME_STEP: u32 = CLOCK_FREQUENCY / FRAME_SEQUENCER_RATE;

// Highest mixed level, four channels at 15.
pub const MAX_LEVEL: u8 = 60;

// OR'd into reads of FF10-FF3F, unreadable bits return 1.
const READ_MASKS: [u8; 48] = [
    0x80, 0x3F, 0x00, 0xFF, 0xBF, // NR10-NR14
    0xFF, 0x3F, 0x00, 0xFF, 0xBF, // NR20-NR24
    0x7F, 0xFF, 0x9F, 0xFF, 0xBF, // NR30-NR34
    0xFF, 0xFF, 0x00, 0x00, 0xBF, // NR40-NR44
    0x00, 0x00, 0x70, // NR50-NR52
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // FF27-FF2F
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Wave RAM
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApuError {
    #[error("sample rate must be between 1 and {max} Hz, got {rate}")]
    SampleRate { rate: u32, max: u32 },
    #[error("pulses per sample must be non-zero")]
    ZeroPulses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApuConfig {
    pulses_per_sample: u32,
}

impl Default for ApuConfig {
    // 65536 Hz.
    fn default() -> Self {
        Self { pulses_per_sample: 64 }
    }
}

impl ApuConfig {
    pub fn new(pulses_per_sample: u32) -> Result<Self, ApuError> {
        if pulses_per_sample == 0 {
            return Err(ApuError::ZeroPulses);
        }
        Ok(Self { pulses_per_sample })
    }

    // Nearest whole number of pulses per sample, the real rate may differ.
    pub fn with_sample_rate(rate: u32) -> Result<Self, ApuError> {
        if rate == 0 || rate > CLOCK_FREQUENCY {
            return Err(ApuError::SampleRate { rate, max: CLOCK_FREQUENCY });
        }
        Self::new(CLOCK_FREQUENCY / rate)
    }

    pub fn pulses_per_sample(&self) -> u32 {
        self.pulses_per_sample
    }

    pub fn sample_rate(&self) -> u32 {
        CLOCK_FREQUENCY / self.pulses_per_sample
    }
}

// Which units a frame sequencer step clocks.
//
// Step   Length  Sweep  Envelope
// 0      x
// 2      x       x
// 4      x
// 6      x       x
// 7                     x
struct FrameSequencer {
    clock: Divider,
    step: u8,
}

impl FrameSequencer {
    fn new() -> Self {
        Self { clock: Divider::new(PULSES_PER_FRAME_STEP), step: 0 }
    }

    fn tick(&mut self) -> Option<u8> {
        if !self.clock.tick() {
            return None;
        }
        let step = self.step;
        self.step = (self.step + 1) % 8;
        Some(step)
    }
}

pub struct APU {
    ch1: SquareChannel,
    ch2: SquareChannel,
    ch3: WaveChannel,
    ch4: NoiseChannel,
    nr50: u8,
    nr51: u8,
    power: bool,
    sequencer: FrameSequencer,
    output: Divider,
    config: ApuConfig,
}

impl Default for APU {
    fn default() -> Self {
        Self::new(ApuConfig::default())
    }
}

impl APU {
    pub fn new(config: ApuConfig) -> Self {
        Self {
            ch1: SquareChannel::new(true),
            ch2: SquareChannel::new(false),
            ch3: WaveChannel::new(),
            ch4: NoiseChannel::new(),
            nr50: 0x77,
            nr51: 0xF3,
            power: true,
            sequencer: FrameSequencer::new(),
            output: Divider::new(config.pulses_per_sample),
            config,
        }
    }

    pub fn config(&self) -> ApuConfig {
        self.config
    }

    pub fn wave(&self) -> &WaveChannel {
        &self.ch3
    }

    // One master clock pulse. A powered off APU still emits silence at the
    // same rate.
    pub fn tick<S: AudioSink + ?Sized>(&mut self, sink: &mut S) {
        let level = if self.power { self.step() } else { 0 };
        if self.output.tick() {
            sink.write_sample(level);
        }
    }

    fn step(&mut self) -> u8 {
        let samples = [self.ch1.tick(), self.ch2.tick(), self.ch3.tick(), self.ch4.tick()];

        if let Some(step) = self.sequencer.tick() {
            if step % 2 == 0 {
                self.ch1.clock_length();
                self.ch2.clock_length();
                self.ch3.clock_length();
                self.ch4.clock_length();
            }
            if step == 2 || step == 6 {
                self.ch1.clock_sweep();
            }
            if step == 7 {
                self.ch1.clock_envelope();
                self.ch2.clock_envelope();
                self.ch4.clock_envelope();
            }
        }

        // A channel routed to neither terminal is left out of the mix.
        let routed = self.nr51 | (self.nr51 >> 4);
        samples
            .iter()
            .enumerate()
            .filter(|(i, _)| routed.bit(*i))
            .map(|(_, s)| s)
            .sum()
    }

    fn status(&self) -> u8 {
        let mut nr52: u8 = 0;
        if self.power {
            nr52.set(7);
        }
        for (i, on) in [self.ch1.enabled(), self.ch2.enabled(), self.ch3.enabled(), self.ch4.enabled()]
            .into_iter()
            .enumerate()
        {
            if on {
                nr52.set(i);
            }
        }
        nr52
    }

    fn power_off(&mut self) {
        log::debug!("apu powered off");
        self.ch1.power_off();
        self.ch2.power_off();
        self.ch3.power_off();
        self.ch4.power_off();
        self.nr50 = 0;
        self.nr51 = 0;
    }
}

impl MemoryBus for APU {
    fn read_byte(&self, addr: u16) -> u8 {
        let value = match addr {
            0xFF10..=0xFF14 => self.ch1.read_register((addr - 0xFF10) as u8),
            0xFF15..=0xFF19 => self.ch2.read_register((addr - 0xFF15) as u8),
            0xFF1A..=0xFF1E => self.ch3.read_register((addr - 0xFF1A) as u8),
            0xFF1F..=0xFF23 => self.ch4.read_register((addr - 0xFF1F) as u8),
            0xFF24 => self.nr50,
            0xFF25 => self.nr51,
            0xFF26 => self.status(),
            0xFF30..=0xFF3F => self.ch3.read_pattern((addr - 0xFF30) as u8),
            _ => return 0xFF,
        };
        value | READ_MASKS[usize::from(addr - 0xFF10)]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        log::trace!("apu {:#06X} <- {:#04X}", addr, value);
        match addr {
            0xFF26 => {
                let power = value.bit(7);
                if self.power && !power {
                    self.power_off();
                }
                self.power = power;
            }
            // Wave RAM stays writable while powered off.
            0xFF30..=0xFF3F => self.ch3.write_pattern((addr - 0xFF30) as u8, value),
            _ if !self.power => {}
            0xFF10..=0xFF14 => self.ch1.write_register((addr - 0xFF10) as u8, value),
            0xFF15..=0xFF19 => self.ch2.write_register((addr - 0xFF15) as u8, value),
            0xFF1A..=0xFF1E => self.ch3.write_register((addr - 0xFF1A) as u8, value),
            0xFF1F..=0xFF23 => self.ch4.write_register((addr - 0xFF1F) as u8, value),
            0xFF24 => self.nr50 = value,
            0xFF25 => self.nr51 = value,
            _ => {}
        }
    }
}
