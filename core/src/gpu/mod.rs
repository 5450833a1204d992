pub mod fetcher;
pub mod fifo;
pub mod lcdc;
pub mod palette;
pub mod sprite;
pub mod stat;

use crate::bus::MemoryBus;
use crate::clock::Divider;
use crate::intf::{InterruptSource, Intf};
use crate::sink::{PixelSource, VideoSink};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

use fetcher::{FetchContext, Fetcher};
use fifo::PixelFifo;
use lcdc::LCDC;
use sprite::{LineSprites, OAM_ENTRIES};
use stat::{Mode, STAT};

// Master clock pulses (dots) per state machine step.
pub const CLOCK_FACTOR: u32 = 2;

/* The LCD controller operates on a 2^22 Hz = 4.194 MHz dot clock. An entire frame is 154 scanlines =
70224 dots = 16.74 ms. On scanlines 0 through 143, the PPU cycles through modes 2, 3, and 0 once
every 456 dots. Scanlines 144 through 153 are mode 1. */
pub const STEPS_PER_LINE: u32 = 456 / CLOCK_FACTOR;
pub const LINES_PER_FRAME: u8 = 154;
const VISIBLE_LINES: u8 = SCREEN_HEIGHT as u8;
const LINE_WIDTH: u8 = SCREEN_WIDTH as u8;
// One step per OAM entry.
const SEARCH_STEPS: u8 = OAM_ENTRIES;

pub struct GPU {
    fifo: PixelFifo,
    fetcher: Fetcher,
    clock: Divider,

    lcdc: LCDC,
    stat: STAT,
    mode: Mode,

    // 0xFF42 - SCY (scroll Y) | 0xFF43 - SCX (scroll X)
    scroll_y: u8,
    scroll_x: u8,
    // 0xFF44 - LY (LCD Y coord ie. current scanline) | 0xFF45 - LYC (LY compare)
    ly: u8,
    ly_compare: u8,
    // 0xFF4A - WY (window y position) | 0xFF4B - WX (window x position + 7)
    window_y: u8,
    window_x: u8,

    // 0xFF47 - BGP (BG palette data)
    // 0xFF48 - OBP0 (OBJ palette 0 data) | 0xFF49 - OBP1 (OBJ palette 1 data)
    // Stored for the sink side, the pipeline itself works on raw indices.
    bg_palette: u8,
    sprite_palette_0: u8,
    sprite_palette_1: u8,

    // Steps taken on the current line, 0..STEPS_PER_LINE.
    steps: u32,
    oam_index: u8,
    sprites: LineSprites,
    // Pixels sent to the LCD on the current line.
    x: u8,
    // Pixels still to be dropped from the queue (fine scroll).
    discard: u8,
    window_active: bool,
    window_line: u8,

    frames: u64,
    intf: Intf,
}

impl GPU {
    pub fn new() -> Self {
        let mut gpu = Self {
            fifo: PixelFifo::new(),
            fetcher: Fetcher::new(),
            clock: Divider::new(CLOCK_FACTOR),

            lcdc: LCDC::new(),
            stat: STAT::new(),
            mode: Mode::Search,

            scroll_y: 0,
            scroll_x: 0,
            ly: 0,
            ly_compare: 0,
            window_y: 0,
            window_x: 0,

            bg_palette: 0xFC,
            sprite_palette_0: 0xFF,
            sprite_palette_1: 0xFF,

            steps: 0,
            oam_index: 0,
            sprites: LineSprites::new(),
            x: 0,
            discard: 0,
            window_active: false,
            window_line: 0,

            frames: 0,
            intf: Intf::new(),
        };
        gpu.stat.set_mode(Mode::Search);
        gpu.stat.set_coincidence(true);
        gpu
    }

    // Advance by one master clock pulse. The fetcher runs on its own divider
    // ahead of the controller step, so within one step it reads before the
    // two pixels are shifted out and each fetch step is preceded by the
    // previous step's two pops.
    pub fn tick<M, S>(&mut self, mem: &M, sink: &mut S)
    where
        M: MemoryBus + ?Sized,
        S: VideoSink + ?Sized,
    {
        if self.mode == Mode::Transfer {
            self.fetcher.tick(mem, &mut self.fifo);
        }

        if !self.clock.tick() {
            return;
        }

        match self.mode {
            Mode::Search => self.search_step(mem),
            Mode::Transfer => self.transfer_step(sink),
            Mode::LineBlank | Mode::FrameBlank => {}
        }

        self.steps += 1;
        if self.steps >= STEPS_PER_LINE {
            self.steps = 0;
            self.next_line(sink);
        }
    }

    fn search_step<M: MemoryBus + ?Sized>(&mut self, mem: &M) {
        if self.ly == 0 && self.oam_index == 0 && self.lcdc.sprite_size() == 16 {
            log::debug!("8x16 sprites selected, drawing the top 8 lines only");
        }
        self.sprites.search(mem, self.oam_index, self.ly);
        self.oam_index += 1;
        if self.oam_index >= SEARCH_STEPS {
            self.start_transfer();
        }
    }

    fn start_transfer(&mut self) {
        let y = self.scroll_y.wrapping_add(self.ly);
        let (data_addr, signed_id) = self.lcdc.tile_data();
        let ctx = FetchContext {
            map_addr: self.lcdc.bg_tilemap() + u16::from(y / 8) * 32,
            data_addr,
            tile_offset: self.scroll_x / 8,
            tile_line: y % 8,
            signed_id,
        };
        self.fetcher.start(ctx, &mut self.fifo);
        self.x = 0;
        self.discard = self.scroll_x % 8;
        self.window_active = false;
        self.set_mode(Mode::Transfer);
    }

    fn window_due(&self) -> bool {
        !self.window_active
            && self.lcdc.window_enable()
            && self.ly >= self.window_y
            && u16::from(self.x) + 7 >= u16::from(self.window_x)
    }

    // Restart the fetcher on the window map. The queued background pixels are
    // thrown away.
    fn start_window(&mut self) {
        let (data_addr, signed_id) = self.lcdc.tile_data();
        let ctx = FetchContext {
            map_addr: self.lcdc.window_tilemap() + u16::from(self.window_line / 8) * 32,
            data_addr,
            tile_offset: 0,
            tile_line: self.window_line % 8,
            signed_id,
        };
        self.fetcher.start(ctx, &mut self.fifo);
        // WX below 7 pushes the window partly off the left edge.
        self.discard = 7u8.saturating_sub(self.window_x);
        self.window_active = true;
        log::trace!("window started at x={} line={}", self.x, self.window_line);
    }

    // Shift out up to two pixels, then hand over to the fetcher for the next
    // step.
    fn transfer_step<S: VideoSink + ?Sized>(&mut self, sink: &mut S) {
        for _ in 0..2 {
            if self.fetcher.is_fetching_sprite() {
                return;
            }
            if self.discard == 0 && self.window_due() {
                self.start_window();
                return;
            }
            if self.discard == 0 && self.lcdc.sprite_enable() && self.sprites.pending_at(self.x) {
                // The sprite row has to line up with a full tile row.
                if self.fifo.len() < 8 {
                    return;
                }
                if let Some(sprite) = self.sprites.take_at(self.x) {
                    self.fetcher.fetch_sprite(sprite, sprite.offset(), sprite.line(self.ly));
                }
                return;
            }

            let Some(pixel) = self.fifo.pop() else {
                return;
            };
            if self.discard > 0 {
                self.discard -= 1;
                continue;
            }

            if self.lcdc.lcd_enable() {
                let (color, source) = pixel.resolve(self.lcdc.bg_window_enable());
                sink.write_source_pixel(color, source);
            } else {
                sink.blank();
            }
            self.x += 1;

            if self.x >= LINE_WIDTH {
                self.end_transfer(sink);
                return;
            }
        }
    }

    fn end_transfer<S: VideoSink + ?Sized>(&mut self, sink: &mut S) {
        self.fetcher.stop();
        self.fifo.clear();
        if self.window_active {
            self.window_line += 1;
        }
        self.set_mode(Mode::LineBlank);
        sink.end_of_line();
    }

    fn next_line<S: VideoSink + ?Sized>(&mut self, sink: &mut S) {
        if self.mode == Mode::Transfer {
            // Only when a line ran out of steps before 160 pixels.
            log::warn!("line {} cut short at x={}", self.ly, self.x);
            self.end_transfer(sink);
        }

        self.ly += 1;
        if self.ly >= LINES_PER_FRAME {
            self.ly = 0;
        }
        self.compare_line();

        if self.ly == VISIBLE_LINES {
            self.set_mode(Mode::FrameBlank);
            self.intf.set_interrupt(InterruptSource::VBlank);
            self.frames += 1;
            log::debug!("frame {} complete", self.frames);
            sink.end_of_frame();
        } else if self.ly < VISIBLE_LINES {
            if self.ly == 0 {
                self.window_line = 0;
            }
            self.oam_index = 0;
            self.sprites.clear();
            self.set_mode(Mode::Search);
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.stat.set_mode(mode);
        if self.stat.mode_interrupt(mode) {
            self.intf.set_interrupt(InterruptSource::Stat);
        }
    }

    fn compare_line(&mut self) {
        let equal = self.ly == self.ly_compare;
        if equal && !self.stat.coincidence() && self.stat.lyc_interrupt() {
            self.intf.set_interrupt(InterruptSource::Stat);
        }
        self.stat.set_coincidence(equal);
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn lcdc(&self) -> LCDC {
        self.lcdc
    }

    // BGP, OBP0 or OBP1.
    pub fn palette(&self, source: PixelSource) -> u8 {
        match source {
            PixelSource::Background => self.bg_palette,
            PixelSource::Sprite0 => self.sprite_palette_0,
            PixelSource::Sprite1 => self.sprite_palette_1,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn take_interrupts(&mut self) -> Intf {
        self.intf.take()
    }
}

impl Default for GPU {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus for GPU {
    fn read_byte(&self, address: u16) -> u8 {
        match address {
            0xFF40 => self.lcdc.0,
            0xFF41 => self.stat.read(),
            0xFF42 => self.scroll_y,
            0xFF43 => self.scroll_x,
            0xFF44 => self.ly,
            0xFF45 => self.ly_compare,
            0xFF47 => self.bg_palette,
            0xFF48 => self.sprite_palette_0,
            0xFF49 => self.sprite_palette_1,
            0xFF4A => self.window_y,
            0xFF4B => self.window_x,
            _ => 0xFF,
        }
    }

    fn write_byte(&mut self, address: u16, b: u8) {
        log::trace!("GPU write {b:#04x} to {address:#06x}");
        match address {
            0xFF40 => self.lcdc = LCDC(b),
            0xFF41 => self.stat.write(b),
            0xFF42 => self.scroll_y = b,
            0xFF43 => self.scroll_x = b,
            // LY is read only.
            0xFF44 => {}
            0xFF45 => {
                self.ly_compare = b;
                self.compare_line();
            }
            0xFF47 => self.bg_palette = b,
            0xFF48 => self.sprite_palette_0 = b,
            0xFF49 => self.sprite_palette_1 = b,
            0xFF4A => self.window_y = b,
            0xFF4B => self.window_x = b,
            _ => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::{Mmu, Ram, OAM_START};
    use crate::sink::FrameBuffer;

    const DOTS_PER_LINE: u32 = STEPS_PER_LINE * CLOCK_FACTOR;

    #[derive(Default)]
    struct Recorder {
        pixels: Vec<u8>,
        blanks: usize,
        lines: usize,
        frames: usize,
    }

    impl VideoSink for Recorder {
        fn write_pixel(&mut self, color: u8) {
            self.pixels.push(color);
        }
        fn end_of_line(&mut self) {
            self.lines += 1;
        }
        fn end_of_frame(&mut self) {
            self.frames += 1;
        }
        fn blank(&mut self) {
            self.blanks += 1;
        }
    }

    fn mem() -> Mmu {
        let mut mmu = Mmu::new();
        mmu.add(Ram::vram());
        mmu.add(Ram::oam());
        mmu
    }

    fn run<S: VideoSink>(gpu: &mut GPU, mem: &Mmu, sink: &mut S, dots: u32) {
        for _ in 0..dots {
            gpu.tick(mem, sink);
        }
    }

    // Tile 1 is solid colour 3, tile 2 solid colour 1.
    fn solid_tiles(mem: &mut Mmu) {
        for row in 0..8 {
            mem.write_byte(0x8010 + row * 2, 0xFF);
            mem.write_byte(0x8011 + row * 2, 0xFF);
            mem.write_byte(0x8020 + row * 2, 0xFF);
        }
    }

    #[test]
    fn search_lasts_forty_steps() {
        let mem = mem();
        let mut gpu = GPU::new();
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, 39 * CLOCK_FACTOR);
        assert_eq!(gpu.mode(), Mode::Search);
        run(&mut gpu, &mem, &mut sink, CLOCK_FACTOR);
        assert_eq!(gpu.mode(), Mode::Transfer);
        assert_eq!(gpu.read_byte(0xFF41) & 0b11, 3);
    }

    #[test]
    fn line_of_160_pixels() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        // Alternate tiles 1 and 2 along the first map row.
        for col in 0..32 {
            mem.write_byte(0x9800 + col, 1 + (col as u8 & 1));
        }

        let mut gpu = GPU::new();
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);

        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert_eq!(sink.lines, 1);
        assert_eq!(&sink.pixels[..8], &[3; 8]);
        assert_eq!(&sink.pixels[8..16], &[1; 8]);
        assert_eq!(gpu.ly(), 1);
        assert_eq!(gpu.mode(), Mode::Search);
    }

    #[test]
    fn transfer_then_line_blank() {
        let mem = mem();
        let mut gpu = GPU::new();
        let mut sink = Recorder::default();
        // Search plus the initial fill and 80 steps of two pixels.
        run(&mut gpu, &mem, &mut sink, (40 + 4 + 80) * CLOCK_FACTOR);
        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert_eq!(gpu.mode(), Mode::LineBlank);
        assert_eq!(gpu.read_byte(0xFF41) & 0b11, 0);
    }

    #[test]
    fn scanline_bounds() {
        let mem = mem();
        let mut gpu = GPU::new();
        let mut sink = Recorder::default();

        let mut seen = Vec::new();
        for _ in 0..LINES_PER_FRAME {
            seen.push(gpu.ly());
            if gpu.ly() < VISIBLE_LINES {
                assert_ne!(gpu.mode(), Mode::FrameBlank);
            } else {
                assert_eq!(gpu.mode(), Mode::FrameBlank);
            }
            run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);
        }
        assert_eq!(seen, (0..LINES_PER_FRAME).collect::<Vec<_>>());
        assert_eq!(gpu.ly(), 0);
        assert_eq!(sink.frames, 1);
        assert_eq!(sink.lines, 144);
        assert_eq!(sink.pixels.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
    }

    #[test]
    fn end_of_frame_on_line_144_entry() {
        let mem = mem();
        let mut gpu = GPU::new();
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, 144 * DOTS_PER_LINE - 1);
        assert_eq!(sink.frames, 0);
        run(&mut gpu, &mem, &mut sink, 1);
        assert_eq!(sink.frames, 1);
        assert_eq!(gpu.ly(), 144);
        assert!(gpu.take_interrupts().is_set(InterruptSource::VBlank));

        run(&mut gpu, &mem, &mut sink, 10 * DOTS_PER_LINE - 1);
        assert_eq!(sink.frames, 1);
        assert_eq!(gpu.ly(), 153);
        run(&mut gpu, &mem, &mut sink, 1);
        assert_eq!(gpu.ly(), 0);
        assert_eq!(gpu.mode(), Mode::Search);
    }

    #[test]
    fn display_disabled_blanks_with_same_timing() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        mem.write_byte(0x9800, 1);

        let mut on = GPU::new();
        let mut off = GPU::new();
        off.write_byte(0xFF40, 0x11);
        let mut on_sink = Recorder::default();
        let mut off_sink = Recorder::default();

        for _ in 0..(70224 + 1000) {
            on.tick(&mem, &mut on_sink);
            off.tick(&mem, &mut off_sink);
            assert_eq!(on.ly(), off.ly());
            assert_eq!(on.mode(), off.mode());
        }
        assert!(off_sink.pixels.is_empty());
        assert_eq!(off_sink.blanks, on_sink.pixels.len());
        assert_eq!(off_sink.lines, on_sink.lines);
        assert_eq!(off_sink.frames, 1);
    }

    #[test]
    fn fine_scroll_discards() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        mem.write_byte(0x9800, 1);
        mem.write_byte(0x9801, 2);

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF43, 3);
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);
        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert_eq!(&sink.pixels[..6], &[3, 3, 3, 3, 3, 1]);
    }

    #[test]
    fn coarse_scroll_and_rows() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        // Second map row starts with tile 2.
        mem.write_byte(0x9820 + 1, 2);

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF42, 8);
        gpu.write_byte(0xFF43, 8);
        let mut fb = FrameBuffer::new();
        run(&mut gpu, &mem, &mut fb, DOTS_PER_LINE);
        assert_eq!(&fb.row(0)[..9], &[1, 1, 1, 1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn sprite_mixed_over_background() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        // Sprite 0 at screen (16, 0) using tile 2, sprite 1 at (40, 0)
        // behind the background using tile 1.
        for (i, (x, tile, flags)) in [(24u8, 2u8, 0u8), (48, 1, sprite::SPRITE_BEHIND_BG)].iter().enumerate() {
            let addr = OAM_START + i as u16 * 4;
            mem.write_byte(addr, 16);
            mem.write_byte(addr + 1, *x);
            mem.write_byte(addr + 2, *tile);
            mem.write_byte(addr + 3, *flags);
        }

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF40, 0x93);
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);

        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert_eq!(&sink.pixels[..16], &[0; 16]);
        assert_eq!(&sink.pixels[16..24], &[1; 8]);
        assert_eq!(&sink.pixels[24..40], &[0; 16]);
        // Background is colour 0 there, so the low priority sprite shows.
        assert_eq!(&sink.pixels[40..48], &[3; 8]);
        assert!(sink.pixels[48..].iter().all(|&p| p == 0));
    }

    fn place_sprites(mem: &mut Mmu, sprites: &[(u8, u8, u8)]) {
        for (i, &(x, tile, flags)) in sprites.iter().enumerate() {
            let addr = OAM_START + i as u16 * 4;
            mem.write_byte(addr, 16);
            mem.write_byte(addr + 1, x);
            mem.write_byte(addr + 2, tile);
            mem.write_byte(addr + 3, flags);
        }
    }

    #[test]
    fn background_off_emits_colour_0() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        for col in 0..32 {
            mem.write_byte(0x9800 + col, 1);
        }

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF40, 0x90);
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);

        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert!(sink.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn sprites_show_with_background_off() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        for col in 0..32 {
            mem.write_byte(0x9800 + col, 1);
        }
        // Even a behind-background sprite shows once the background is off.
        place_sprites(&mut mem, &[(24, 2, sprite::SPRITE_BEHIND_BG)]);

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF40, 0x92);
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);

        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert_eq!(&sink.pixels[..16], &[0; 16]);
        assert_eq!(&sink.pixels[16..24], &[1; 8]);
        assert!(sink.pixels[24..].iter().all(|&p| p == 0));
    }

    #[test]
    fn lower_x_sprite_wins_overlap() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        // OAM 0 at screen 16 (colour 1), OAM 1 at screen 12 (colour 3).
        place_sprites(&mut mem, &[(24, 2, 0), (20, 1, 0)]);

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF40, 0x93);
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);

        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert_eq!(&sink.pixels[..12], &[0; 12]);
        assert_eq!(&sink.pixels[12..20], &[3; 8]);
        assert_eq!(&sink.pixels[20..24], &[1; 4]);
        assert!(sink.pixels[24..].iter().all(|&p| p == 0));
    }

    #[test]
    fn pixels_tagged_with_palette() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        place_sprites(&mut mem, &[(16, 2, 0), (40, 2, sprite::SPRITE_PALETTE)]);

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF40, 0x93);
        let mut fb = FrameBuffer::new();
        run(&mut gpu, &mem, &mut fb, DOTS_PER_LINE);

        assert_eq!(fb.source(0, 0), PixelSource::Background);
        assert_eq!(fb.source(8, 0), PixelSource::Sprite0);
        assert_eq!(fb.source(32, 0), PixelSource::Sprite1);
        assert_eq!(fb.row(0)[32], 1);
        assert_eq!(fb.source(40, 0), PixelSource::Background);
    }

    #[test]
    fn sprites_ignored_when_disabled() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        mem.write_byte(OAM_START, 16);
        mem.write_byte(OAM_START + 1, 8);
        mem.write_byte(OAM_START + 2, 1);

        let mut gpu = GPU::new();
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);
        assert!(sink.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn window_replaces_background() {
        let mut mem = mem();
        solid_tiles(&mut mem);
        // Background map 0x9800 is all tile 0, window map 0x9C00 all tile 1.
        for col in 0..32 {
            mem.write_byte(0x9C00 + col, 1);
        }

        let mut gpu = GPU::new();
        gpu.write_byte(0xFF40, 0x91 | 0x20 | 0x40);
        gpu.write_byte(0xFF4A, 0);
        gpu.write_byte(0xFF4B, 7 + 80);
        let mut sink = Recorder::default();
        run(&mut gpu, &mem, &mut sink, DOTS_PER_LINE);

        assert_eq!(sink.pixels.len(), SCREEN_WIDTH);
        assert!(sink.pixels[..80].iter().all(|&p| p == 0));
        assert!(sink.pixels[80..].iter().all(|&p| p == 3));
    }

    #[test]
    fn lyc_coincidence() {
        let mem = mem();
        let mut gpu = GPU::new();
        let mut sink = Recorder::default();
        gpu.write_byte(0xFF41, 0x40);
        gpu.write_byte(0xFF45, 2);
        assert_eq!(gpu.read_byte(0xFF41) & 0b100, 0);

        run(&mut gpu, &mem, &mut sink, 2 * DOTS_PER_LINE);
        assert_eq!(gpu.ly(), 2);
        assert_eq!(gpu.read_byte(0xFF41) & 0b100, 0b100);
        assert!(gpu.take_interrupts().is_set(InterruptSource::Stat));
    }

    #[test]
    fn registers() {
        let mut gpu = GPU::new();
        for (addr, value) in [(0xFF42, 1), (0xFF43, 2), (0xFF45, 3), (0xFF47, 4), (0xFF48, 5), (0xFF49, 6), (0xFF4A, 7), (0xFF4B, 8)] {
            gpu.write_byte(addr, value);
            assert_eq!(gpu.read_byte(addr), value);
        }
        assert_eq!(gpu.palette(PixelSource::Background), 4);
        assert_eq!(gpu.palette(PixelSource::Sprite0), 5);
        assert_eq!(gpu.palette(PixelSource::Sprite1), 6);
        gpu.write_byte(0xFF44, 99);
        assert_eq!(gpu.read_byte(0xFF44), 0);
        gpu.write_byte(0xFF40, 0x00);
        assert!(!gpu.lcdc().lcd_enable());
        assert_eq!(gpu.read_byte(0xFF46), 0xFF);
    }
}
