use crate::bus::MemoryBus;
use std::{ops::RangeInclusive, path::Path};
use thiserror::Error;

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_START: u16 = 0xFE00;
pub const OAM_SIZE: usize = 0xA0;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("image of {len} bytes does not fit in {capacity} bytes at {base:#06x}")]
    ImageTooLarge { len: usize, capacity: usize, base: u16 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, MemoryError>;

// Plain byte store mapped at a fixed base address.
#[derive(Clone)]
pub struct Ram {
    base: u16,
    bytes: Vec<u8>,
}

impl Ram {
    pub fn new(base: u16, len: usize) -> Self {
        assert!(
            len > 0 && base as usize + len <= 0x1_0000,
            "region {base:#06x}+{len} does not fit the address space"
        );
        Self { base, bytes: vec![0; len] }
    }

    pub fn vram() -> Self {
        Self::new(VRAM_START, VRAM_SIZE)
    }

    pub fn oam() -> Self {
        Self::new(OAM_START, OAM_SIZE)
    }

    pub fn range(&self) -> RangeInclusive<u16> {
        self.base..=self.base + (self.bytes.len() - 1) as u16
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    // Copy an image to the start of the region, leaving the rest untouched.
    pub fn load(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > self.bytes.len() {
            return Err(MemoryError::ImageTooLarge {
                len: image.len(),
                capacity: self.bytes.len(),
                base: self.base,
            });
        }
        self.bytes[..image.len()].copy_from_slice(image);
        log::debug!("loaded {} bytes at {:#06x}", image.len(), self.base);
        Ok(())
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let image = std::fs::read(path)?;
        self.load(&image)
    }

    fn offset(&self, address: u16) -> usize {
        (address.wrapping_sub(self.base) as usize) % self.bytes.len()
    }
}

impl MemoryBus for Ram {
    fn read_byte(&self, address: u16) -> u8 {
        self.bytes[self.offset(address)]
    }

    fn write_byte(&mut self, address: u16, b: u8) {
        let offset = self.offset(address);
        self.bytes[offset] = b;
    }
}

struct Region {
    range: RangeInclusive<u16>,
    bus: Box<dyn MemoryBus>,
}

/*
Address-range dispatch table. An access goes to the most recently added region
covering the address, so later regions shadow earlier ones.
Unmapped reads return 0xFF and unmapped writes are dropped.
*/
#[derive(Default)]
pub struct Mmu {
    regions: Vec<Region>,
}

impl Mmu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ram: Ram) {
        let range = ram.range();
        self.add_region(range, Box::new(ram));
    }

    pub fn add_region(&mut self, range: RangeInclusive<u16>, bus: Box<dyn MemoryBus>) {
        log::trace!("mapping {:#06x}..={:#06x}", range.start(), range.end());
        self.regions.push(Region { range, bus });
    }

    fn region(&self, address: u16) -> Option<&Region> {
        self.regions.iter().rev().find(|r| r.range.contains(&address))
    }

    fn region_mut(&mut self, address: u16) -> Option<&mut Region> {
        self.regions.iter_mut().rev().find(|r| r.range.contains(&address))
    }
}

impl MemoryBus for Mmu {
    fn read_byte(&self, address: u16) -> u8 {
        match self.region(address) {
            Some(region) => region.bus.read_byte(address),
            None => 0xFF,
        }
    }

    fn write_byte(&mut self, address: u16, b: u8) {
        match self.region_mut(address) {
            Some(region) => region.bus.write_byte(address, b),
            None => log::trace!("dropped write {b:#04x} to unmapped {address:#06x}"),
        }
    }
}
