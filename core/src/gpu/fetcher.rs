use super::fifo::PixelFifo;
use super::sprite::{Sprite, SPRITE_BEHIND_BG, SPRITE_FLIP_X, SPRITE_FLIP_Y, SPRITE_PALETTE};
use super::CLOCK_FACTOR;
use crate::bus::MemoryBus;
use crate::clock::Divider;
use crate::sink::PixelSource;

// Sprites always use the unsigned tile block.
const SPRITE_DATA: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    ReadTileId,
    ReadTileData0,
    ReadTileData1,
    PushToFifo,
    ReadSpriteId,
    ReadSpriteFlags,
    ReadSpriteData0,
    ReadSpriteData1,
    MixInFifo,
}

impl FetchState {
    // Successor once the current state has done its work. MixInFifo has no
    // fixed successor, it hands back to whatever the sprite interrupted.
    fn next(self) -> Option<FetchState> {
        use FetchState::*;
        match self {
            ReadTileId => Some(ReadTileData0),
            ReadTileData0 => Some(ReadTileData1),
            ReadTileData1 => Some(PushToFifo),
            PushToFifo => Some(ReadTileId),
            ReadSpriteId => Some(ReadSpriteFlags),
            ReadSpriteFlags => Some(ReadSpriteData0),
            ReadSpriteData0 => Some(ReadSpriteData1),
            ReadSpriteData1 => Some(MixInFifo),
            MixInFifo => None,
        }
    }
}

// Where to fetch a line of background or window tiles from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchContext {
    // Start address of the BG/window map row.
    pub map_addr: u16,
    // Tile data block, 0x8000 (unsigned IDs) or 0x9000 (signed IDs).
    pub data_addr: u16,
    // Column in the map row, wraps at 32.
    pub tile_offset: u8,
    // Row inside the tile, 0-7.
    pub tile_line: u8,
    pub signed_id: bool,
}

#[derive(Debug, Clone)]
struct SpriteFetch {
    sprite: Sprite,
    offset: u8,
    line: u8,
    id: u8,
    flags: u8,
    data: [u8; 8],
    resume: FetchState,
}

// Reads tile data from VRAM and pushes pixels to the FIFO, one state per
// divided tick.
#[derive(Debug, Clone)]
pub struct Fetcher {
    enabled: bool,
    clock: Divider,
    state: FetchState,
    ctx: FetchContext,
    tile_id: u8,
    tile_data: [u8; 8],
    sprite: Option<SpriteFetch>,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            enabled: false,
            clock: Divider::new(CLOCK_FACTOR),
            state: FetchState::ReadTileId,
            ctx: FetchContext::default(),
            tile_id: 0,
            tile_data: [0; 8],
            sprite: None,
        }
    }

    // Start fetching a line of pixels from the given context. Anything in
    // flight is dropped, including the queued pixels.
    pub fn start(&mut self, ctx: FetchContext, fifo: &mut PixelFifo) {
        self.ctx = FetchContext { tile_offset: ctx.tile_offset % 32, tile_line: ctx.tile_line & 7, ..ctx };
        self.state = FetchState::ReadTileId;
        self.sprite = None;
        self.clock.reset();
        self.enabled = true;
        fifo.clear();
    }

    pub fn stop(&mut self) {
        self.enabled = false;
        self.sprite = None;
    }

    // Pause background fetching to read a sprite row and mix it into the
    // FIFO. Only one sprite can be in flight.
    pub fn fetch_sprite(&mut self, sprite: Sprite, offset: u8, line: u8) {
        if !self.enabled || self.sprite.is_some() {
            log::warn!(
                "ignoring sprite fetch at {:#06x} (enabled: {}, busy: {})",
                sprite.address,
                self.enabled,
                self.sprite.is_some()
            );
            debug_assert!(false, "sprite fetch requested while fetcher unavailable");
            return;
        }
        self.sprite = Some(SpriteFetch {
            sprite,
            offset,
            line: line & 7,
            id: 0,
            flags: 0,
            data: [0; 8],
            resume: self.state,
        });
        self.state = FetchState::ReadSpriteId;
    }

    pub fn tick(&mut self, mem: &(impl MemoryBus + ?Sized), fifo: &mut PixelFifo) {
        if !self.enabled || !self.clock.tick() {
            return;
        }

        match self.state {
            FetchState::ReadTileId => {
                self.tile_id = mem.read_byte(self.ctx.map_addr + u16::from(self.ctx.tile_offset));
            }
            FetchState::ReadTileData0 | FetchState::ReadTileData1 => {
                let plane = u8::from(self.state == FetchState::ReadTileData1);
                let addr = tile_line_address(
                    self.ctx.data_addr,
                    self.tile_id,
                    self.ctx.signed_id,
                    self.ctx.tile_line,
                    false,
                );
                let byte = mem.read_byte(addr + u16::from(plane));
                decode_plane(byte, plane, false, &mut self.tile_data);
            }
            FetchState::PushToFifo => {
                if !fifo.push(&self.tile_data) {
                    return;
                }
                self.ctx.tile_offset = (self.ctx.tile_offset + 1) % 32;
            }
            FetchState::ReadSpriteId
            | FetchState::ReadSpriteFlags
            | FetchState::ReadSpriteData0
            | FetchState::ReadSpriteData1
            | FetchState::MixInFifo => {
                if !self.sprite_step(mem, fifo) {
                    return;
                }
            }
        }

        if let Some(next) = self.state.next() {
            self.state = next;
        }
    }

    // Returns true when the fixed successor state applies, false while
    // stalled or once the interrupted state has been restored.
    fn sprite_step(&mut self, mem: &(impl MemoryBus + ?Sized), fifo: &mut PixelFifo) -> bool {
        let Some(fetch) = self.sprite.as_mut() else {
            // Only reachable if the state was forced without a sprite.
            log::warn!("sprite state {:?} without a sprite, resuming tiles", self.state);
            self.state = FetchState::ReadTileId;
            return false;
        };

        match self.state {
            // X and Y were already read during the search.
            FetchState::ReadSpriteId => fetch.id = mem.read_byte(fetch.sprite.address + 2),
            FetchState::ReadSpriteFlags => fetch.flags = mem.read_byte(fetch.sprite.address + 3),
            FetchState::ReadSpriteData0 | FetchState::ReadSpriteData1 => {
                let plane = u8::from(self.state == FetchState::ReadSpriteData1);
                let addr = tile_line_address(
                    SPRITE_DATA,
                    fetch.id,
                    false,
                    fetch.line,
                    fetch.flags & SPRITE_FLIP_Y != 0,
                );
                let byte = mem.read_byte(addr + u16::from(plane));
                decode_plane(byte, plane, fetch.flags & SPRITE_FLIP_X != 0, &mut fetch.data);
            }
            FetchState::MixInFifo => {
                if fifo.len() < 8 {
                    return false;
                }
                // TODO: skip the first `offset` columns for sprites entering
                // from the left edge instead of mixing the whole row.
                log::trace!("mixing sprite {:#06x} offset {}", fetch.sprite.address, fetch.offset);
                let behind = fetch.flags & SPRITE_BEHIND_BG != 0;
                let palette = if fetch.flags & SPRITE_PALETTE != 0 {
                    PixelSource::Sprite1
                } else {
                    PixelSource::Sprite0
                };
                for (i, &pixel) in fetch.data.iter().enumerate() {
                    fifo.mix(i, pixel, behind, palette);
                }
                let resume = fetch.resume;
                self.sprite = None;
                self.state = resume;
                return false;
            }
            _ => unreachable!(),
        }
        true
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_fetching_sprite(&self) -> bool {
        self.sprite.is_some()
    }

    pub fn context(&self) -> FetchContext {
        self.ctx
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

// Address of the first plane byte for one row of a tile.
pub fn tile_line_address(data_addr: u16, tile_id: u8, signed_id: bool, line: u8, flip_y: bool) -> u16 {
    let tile = if signed_id {
        data_addr.wrapping_add_signed(i16::from(tile_id as i8) * 16)
    } else {
        data_addr.wrapping_add(u16::from(tile_id) * 16)
    };
    let line = if flip_y { 7 - (line & 7) } else { line & 7 };
    tile.wrapping_add(u16::from(line) * 2)
}

// Merge one bit-plane byte into a row of colour indices. Plane 0 replaces,
// plane 1 adds the high bit. Bit 7 is the leftmost column unless flipped.
pub fn decode_plane(byte: u8, plane: u8, flip_x: bool, row: &mut [u8; 8]) {
    for bit in 0..8 {
        let column = if flip_x { bit } else { 7 - bit };
        let value = (byte >> bit) & 1;
        if plane == 0 {
            row[column] = value;
        } else {
            row[column] |= value << 1;
        }
    }
}

pub fn decode_row(lo: u8, hi: u8, flip_x: bool) -> [u8; 8] {
    let mut row = [0; 8];
    decode_plane(lo, 0, flip_x, &mut row);
    decode_plane(hi, 1, flip_x, &mut row);
    row
}
