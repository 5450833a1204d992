use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::{Path, PathBuf};

use dmg_av_core::{
    apu::mixer::BlipMixer,
    gpu::{fetcher::decode_row, palette::Palette},
    ApuConfig, FrameBuffer, MemoryBus, Mmu, Ram, APU, CLOCK_FREQUENCY, GPU, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};


const HOST_SAMPLE_RATE: u32 = 44_100;
// Tile data area, 0x8000-0x97FF.
const TILE_COUNT: usize = 384;
const TILES_PER_ROW: usize = 16;
// Triangle, 0 up to 15 and back down.
const DEFAULT_WAVE: &str = "0123456789ABCDEFFEDCBA9876543210";
const MAX_TONE_SECONDS: f64 = 600.0;

#[derive(Parser)]
#[command(about = "Cycle accurate Game Boy video and audio pipeline.")]
struct Args {
    #[arg(short, long, global = true, help = "Log filter, overrides RUST_LOG (e.g. debug)")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pixel pipeline over a VRAM dump and save the last frame.
    Render {
        #[arg(long, help = "VRAM image, loaded at 0x8000")]
        vram: PathBuf,
        #[arg(long, help = "OAM image, loaded at 0xFE00")]
        oam: Option<PathBuf>,
        #[arg(long, default_value = "0x91", value_parser = parse_byte)]
        lcdc: u8,
        #[arg(long, default_value = "0", value_parser = parse_byte)]
        scx: u8,
        #[arg(long, default_value = "0", value_parser = parse_byte)]
        scy: u8,
        #[arg(long, default_value = "0xE4", value_parser = parse_byte)]
        bgp: u8,
        #[arg(long, default_value = "0xE4", value_parser = parse_byte)]
        obp0: u8,
        #[arg(long, default_value = "0xE4", value_parser = parse_byte)]
        obp1: u8,
        #[arg(long, default_value_t = 1)]
        frames: u64,
        #[arg(short, long, help = "Output PNG")]
        out: PathBuf,
    },
    /// Dump every tile in a VRAM image, 16 to a row.
    Tiles {
        #[arg(long)]
        vram: PathBuf,
        #[arg(short, long, help = "Output PNG")]
        out: PathBuf,
    },
    /// Play a pattern on the wave channel and save it as a WAV.
    Tone {
        #[arg(long, help = "11-bit frequency register value", value_parser = parse_frequency)]
        freq: u16,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
        level: u8,
        #[arg(long, help = "32 hex digits, one per sample", default_value = DEFAULT_WAVE, value_parser = parse_wave)]
        wave: [u8; 16],
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,
        #[arg(short, long, help = "Output WAV")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.log_level {
        Some(filter) => env_logger::Builder::new().parse_filters(filter).init(),
        None => env_logger::Builder::from_env(Env::default().default_filter_or("info")).init(),
    }

    match args.command {
        Command::Render { vram, oam, lcdc, scx, scy, bgp, obp0, obp1, frames, out } => {
            ensure!(frames > 0, "at least one frame has to be rendered");
            let mem = load_memory(&vram, oam.as_deref())?;
            let mut gpu = GPU::new();
            let registers = [(0xFF40, lcdc), (0xFF42, scy), (0xFF43, scx), (0xFF47, bgp), (0xFF48, obp0), (0xFF49, obp1)];
            for (addr, value) in registers {
                gpu.write_byte(addr, value);
            }
            let fb = run_frames(&mut gpu, &mem, frames);
            frame_image(&fb, &gpu)
                .save(&out)
                .with_context(|| format!("failed writing {}", out.display()))?;
            log::info!("rendered {} frame(s) to {}", fb.frames(), out.display());
        }
        Command::Tiles { vram, out } => {
            let mut ram = Ram::vram();
            ram.load_file(&vram)
                .with_context(|| format!("failed loading VRAM from {}", vram.display()))?;
            tile_sheet(ram.bytes())
                .save(&out)
                .with_context(|| format!("failed writing {}", out.display()))?;
            log::info!("dumped {} tiles to {}", TILE_COUNT, out.display());
        }
        Command::Tone { freq, level, wave, seconds, out } => {
            let pulses = tone_pulses(seconds)?;
            let samples = synthesize(freq, level, &wave, pulses);
            write_wav(&out, &samples).with_context(|| format!("failed writing {}", out.display()))?;
            log::info!("wrote {} samples to {}", samples.len(), out.display());
        }
    }

    Ok(())
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{}' is not a byte: {}", s, e))
}

fn parse_frequency(s: &str) -> Result<u16, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("'{}' is not a number: {}", s, e))?;
    if value > 0x7FF {
        return Err(format!("{} does not fit in 11 bits", value));
    }
    Ok(value)
}

// 32 nibbles packed high first, the layout of wave RAM.
fn parse_wave(s: &str) -> Result<[u8; 16], String> {
    let digits = s
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| format!("'{}' is not hexadecimal", s))?;
    if digits.len() != 32 {
        return Err(format!("expected 32 samples, got {}", digits.len()));
    }
    let mut wave = [0; 16];
    for (byte, pair) in wave.iter_mut().zip(digits.chunks(2)) {
        *byte = pair[0] << 4 | pair[1];
    }
    Ok(wave)
}

fn load_memory(vram: &Path, oam: Option<&Path>) -> Result<Mmu> {
    let mut mem = Mmu::new();

    let mut ram = Ram::vram();
    ram.load_file(vram)
        .with_context(|| format!("failed loading VRAM from {}", vram.display()))?;
    mem.add(ram);

    let mut ram = Ram::oam();
    if let Some(path) = oam {
        ram.load_file(path)
            .with_context(|| format!("failed loading OAM from {}", path.display()))?;
    }
    mem.add(ram);

    Ok(mem)
}

// Runs until the sink has seen `frames` complete frames.
fn run_frames(gpu: &mut GPU, mem: &Mmu, frames: u64) -> FrameBuffer {
    let mut fb = FrameBuffer::new();
    while fb.frames() < frames {
        gpu.tick(mem, &mut fb);
    }
    fb
}

// Each pixel goes through the palette register it was drawn with.
fn frame_image(fb: &FrameBuffer, gpu: &GPU) -> RgbImage {
    RgbImage::from_fn(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let palette = Palette::new(gpu.palette(fb.source(x, y)));
        let [_, r, g, b] = palette.colour(fb.pixel(x, y)).to_be_bytes();
        Rgb([r, g, b])
    })
}

fn tile_sheet(vram: &[u8]) -> GrayImage {
    let identity = Palette::new(0xE4);
    let rows = TILE_COUNT / TILES_PER_ROW;
    let mut img = GrayImage::new((TILES_PER_ROW * 8) as u32, (rows * 8) as u32);
    for (tile, data) in vram.chunks_exact(16).take(TILE_COUNT).enumerate() {
        let (tx, ty) = (tile % TILES_PER_ROW * 8, tile / TILES_PER_ROW * 8);
        for (line, planes) in data.chunks_exact(2).enumerate() {
            for (px, colour) in decode_row(planes[0], planes[1], false).into_iter().enumerate() {
                img.put_pixel((tx + px) as u32, (ty + line) as u32, Luma([identity.grey(colour)]));
            }
        }
    }
    img
}

fn tone_pulses(seconds: f64) -> Result<u64> {
    ensure!(
        seconds.is_finite() && seconds > 0.0 && seconds <= MAX_TONE_SECONDS,
        "duration must be positive and at most {} seconds",
        MAX_TONE_SECONDS
    );
    Ok((seconds * f64::from(CLOCK_FREQUENCY)) as u64)
}

fn synthesize(freq: u16, level: u8, wave: &[u8; 16], pulses: u64) -> Vec<i16> {
    let config = ApuConfig::default();
    let mut apu = APU::new(config);
    for (i, byte) in wave.iter().enumerate() {
        apu.write_byte(0xFF30 + i as u16, *byte);
    }
    apu.write_byte(0xFF1A, 0x80);
    apu.write_byte(0xFF1C, (level & 0x03) << 5);
    // NR33 then NR34, the trigger lands with the high bits.
    apu.write_word(0xFF1D, 0x8000 | freq & 0x07FF);

    let mut mixer = BlipMixer::new(config.sample_rate(), HOST_SAMPLE_RATE);
    for _ in 0..pulses {
        apu.tick(&mut mixer);
    }
    mixer.flush();
    mixer.take_samples()
}

fn write_wav(path: &Path, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: HOST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}
