// Single-bit helpers for register bytes.

pub trait Bit {
    fn bit(&self, n: usize) -> bool;
    fn set(&mut self, n: usize);
    fn reset(&mut self, n: usize);
}

impl Bit for u8 {
    fn bit(&self, n: usize) -> bool {
        self & (1 << n) != 0
    }

    fn set(&mut self, n: usize) {
        *self |= 1 << n;
    }

    fn reset(&mut self, n: usize) {
        *self &= !(1 << n);
    }
}

#[cfg(test)]
mod test {
    use super::Bit;

    #[test]
    fn get() {
        let lcdc: u8 = 0b1001_0001;
        assert!(lcdc.bit(0));
        assert!(!lcdc.bit(1));
        assert!(lcdc.bit(4));
        assert!(lcdc.bit(7));
    }

    #[test]
    fn set_and_reset() {
        let mut nr34: u8 = 0;
        nr34.set(7);
        assert_eq!(nr34, 0x80);
        nr34.set(6);
        nr34.reset(7);
        assert_eq!(nr34, 0x40);
    }
}
