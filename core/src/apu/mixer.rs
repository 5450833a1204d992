use super::MAX_LEVEL;
use crate::sink::AudioSink;
use blip_buf::BlipBuf;

// Input samples per blip frame.
const FRAME_LENGTH: u32 = 1024;
const AMPLITUDE: i32 = 512;

// Band-limited resampler from the APU's output rate to a host rate. Levels
// are centred on MAX_LEVEL / 2 so silence sits at zero.
pub struct BlipMixer {
    blip: BlipBuf,
    last: i32,
    time: u32,
    output: Vec<i16>,
}

impl BlipMixer {
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        // Room for a full frame at the output rate, with slack.
        let ratio = output_rate.div_ceil(input_rate.max(1));
        let mut blip = BlipBuf::new(FRAME_LENGTH * ratio.max(1) + 64);
        blip.set_rates(f64::from(input_rate), f64::from(output_rate));
        Self { blip, last: 0, time: 0, output: Vec::new() }
    }

    fn end_frame(&mut self) {
        self.blip.end_frame(self.time);
        self.time = 0;
        let avail = self.blip.samples_avail() as usize;
        let start = self.output.len();
        self.output.resize(start + avail, 0);
        let read = self.blip.read_samples(&mut self.output[start..], false);
        self.output.truncate(start + read);
    }

    // Pushes whatever is buffered through to the output.
    pub fn flush(&mut self) {
        if self.time > 0 {
            self.end_frame();
        }
    }

    pub fn take_samples(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.output)
    }
}

impl AudioSink for BlipMixer {
    fn write_sample(&mut self, level: u8) {
        let amplitude = (i32::from(level) - i32::from(MAX_LEVEL / 2)) * AMPLITUDE;
        let delta = amplitude - self.last;
        if delta != 0 {
            self.blip.add_delta(self.time, delta);
            self.last = amplitude;
        }
        self.time += 1;
        if self.time >= FRAME_LENGTH {
            self.end_frame();
        }
    }
}
