use std::path::PathBuf;

use imagebuf::config::DemoConfig;
use imagebuf::files::list_files;
use imagebuf::logging::{init_log, parse_level};
use imagebuf::util::{checksum, Rng};
use imagebuf::{PixelSurface, XformPalette, TRANSPARENT_PIXEL};

struct Args {
    config: Option<PathBuf>,
    list: Option<(PathBuf, String)>,
    log_level: Option<String>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        list: None,
        log_level: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            },
            "--list" | "-l" => {
                if i + 2 < args.len() {
                    parsed.list = Some((PathBuf::from(&args[i + 1]), args[i + 2].clone()));
                    i += 2;
                }
            },
            "--log-level" => {
                if i + 1 < args.len() {
                    parsed.log_level = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: imagebuf [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --config FILE, -c FILE     Load demo settings from JSON");
                println!("  --list DIR MASK, -l DIR MASK  List files matching MASK (e.g. '*.pal')");
                println!("  --log-level LEVEL          off, error, warn, info, debug, trace");
                println!("  --help                     Show this help message");
                std::process::exit(0);
            },
            other => eprintln!("ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    parsed
}

/// Palette used by the demo: a gray ramp with a few saturated entries on top
fn demo_palette() -> Vec<(u8, u8, u8)> {
    let mut palette: Vec<(u8, u8, u8)> = (0..240u32)
        .map(|i| {
            let v = (i * 255 / 239) as u8;
            (v, v, v)
        })
        .collect();
    palette.extend_from_slice(&[
        (255, 0, 0),
        (0, 255, 0),
        (0, 0, 255),
        (255, 255, 0),
        (0, 255, 255),
        (255, 0, 255),
        (255, 128, 0),
        (128, 0, 255),
    ]);
    while palette.len() < 256 {
        palette.push((255, 255, 255));
    }
    palette
}

/// Draw one frame touching every surface primitive
fn render_frame(surface: &mut dyn PixelSurface, palette: &[(u8, u8, u8)], rng: &mut Rng) {
    let w = surface.width() as i32;
    let h = surface.height() as i32;
    let saved_clip = surface.get_clip();

    surface.fill_static(0, 120, 239);
    surface.fill8_rect(60, w / 2, h / 2, w / 4, h / 4);

    // Sprite with a transparent border
    let sprite: Vec<u8> = (0..16 * 16)
        .map(|i| {
            let (x, y) = (i % 16, i / 16);
            if x == 0 || y == 0 || x == 15 || y == 15 {
                TRANSPARENT_PIXEL
            } else {
                240 + ((x + y) % 8) as u8
            }
        })
        .collect();
    for _ in 0..8 {
        let x = rng.range_i32(-8, w - 8);
        let y = rng.range_i32(-8, h - 8);
        surface.copy_transparent8(&sprite, 16, 16, x, y);
    }

    // Shadow and glass, clipped to the middle of the screen
    let shadow = XformPalette::blend(palette, (0, 0, 0), 160);
    let glass = XformPalette::blend(palette, (0, 0, 255), 96);
    surface.set_clip(w / 8, h / 8, w * 3 / 4, h * 3 / 4);
    surface.fill_translucent8(0, w / 3, h / 3, w / 2, h / 2, &shadow);
    let stripe: Vec<u8> = (0..w).map(|x| if x % 4 < 2 { 250 } else { 241 }).collect();
    let tables = [glass.clone()];
    for y in (0..h).step_by(6) {
        surface.copy_hline_translucent8(&stripe, w, 0, y, 250, 250, &tables);
    }
    surface.fill_hline_translucent8(0, w, 0, h / 2, &shadow);

    // Lines fanning out from the center, some through the glass table
    for i in 0..16 {
        let ex = rng.range_i32(-w / 2, w + w / 2);
        let ey = rng.range_i32(-h / 2, h + h / 2);
        let xform = (i % 2 == 0).then_some(&glass);
        surface.draw_line8(244, w / 2, h / 2, ex, ey, xform);
    }
    surface.set_clip(saved_clip.x, saved_clip.y, saved_clip.w, saved_clip.h);

    // Save/restore a corner through a scratch surface, then scroll a strip
    let mut scratch = surface.create_another(32, 32);
    surface.get(scratch.as_mut(), 0, 0);
    surface.fill_hline8(239, 32, 0, 0);
    surface.copy_hline8(&stripe, w.min(32), 0, 1);
    surface.put(scratch.as_ref(), 0, 0);
    surface.copy(0, h / 2, w, 8, 4, h / 2 - 4);

    if surface.supports_truecolor() {
        surface.fill16_rect(0xf800, 8, 8, w - 8, h - 8);
    }
}

fn main() -> Result<(), String> {
    let args = parse_args();

    let config = match &args.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    let level = parse_level(args.log_level.as_deref().unwrap_or(&config.log_level))?;
    init_log(level, config.log_file.as_deref())?;

    println!("=== imagebuf: {} ===", config.name);

    if let Some((dir, mask)) = &args.list {
        match list_files(dir, mask) {
            Ok(files) => {
                for f in &files {
                    println!("{}", f.display());
                }
                println!("{} file(s)", files.len());
            },
            Err(e) => {
                eprintln!("{} (code {})", e, e.code());
                std::process::exit(1);
            },
        }
        return Ok(());
    }

    if let Some(dir) = &config.palette_dir {
        match list_files(dir, &config.palette_mask) {
            Ok(files) => log::info!("{} palette file(s) in {}", files.len(), dir.display()),
            Err(e) => log::warn!("palette scan failed: {} (code {})", e, e.code()),
        }
    }

    let mut surface = config.surface.build();
    let palette = demo_palette();
    let mut rng = Rng::new(config.surface.static_seed);
    log::info!(
        "rendering {}x{} at {} bits, clip {:?}",
        surface.width(),
        surface.height(),
        surface.depth().bits(),
        surface.get_clip()
    );
    render_frame(surface.as_mut(), &palette, &mut rng);

    println!(
        "Surface: {}x{}, {} bits, line width {}",
        surface.width(),
        surface.height(),
        surface.depth().bits(),
        surface.line_width()
    );
    println!("Checksum: {:016x}", checksum(surface.bits()));
    Ok(())
}
