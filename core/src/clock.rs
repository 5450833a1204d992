// Every state machine in the core steps once per `factor` master clock pulses.
// The accumulator always stays in [0, factor).
#[derive(Debug, Clone)]
pub struct Divider {
    factor: u32,
    ticks: u32,
}

impl Divider {
    pub fn new(factor: u32) -> Self {
        assert!(factor > 0, "clock factor must be non-zero");
        Self { factor, ticks: 0 }
    }

    // Count one master pulse, returns true when a step should fire.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks < self.factor {
            return false;
        }
        self.ticks = 0;
        true
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}
