//! Check transcoder and caption font availability.

use matchcut_common::config::AppConfig;
use matchcut_export_engine::{resolve_fonts, PlatformFontResolver};

pub fn run() -> anyhow::Result<()> {
    println!("Matchcut System Check");
    println!("{}", "=".repeat(50));

    let config = AppConfig::load();

    for (name, configured) in [
        ("ffmpeg", config.ffmpeg_path.clone()),
        ("ffprobe", config.ffprobe_path.clone()),
    ] {
        match super::resolve_binary(name, configured) {
            Ok(path) => println!("[OK] {name}: {}", path.display()),
            Err(e) => println!("[MISSING] {e}"),
        }
    }

    let fonts = resolve_fonts(&PlatformFontResolver);
    match &fonts.bold {
        Some(path) => println!("[OK] Caption font (bold): {}", path.display()),
        None => println!("[WARN] No bold caption font; captions use the transcoder default"),
    }
    match &fonts.regular {
        Some(path) => println!("[OK] Caption font (regular): {}", path.display()),
        None => println!("[WARN] No regular caption font; captions use the transcoder default"),
    }

    match &config.output_dir {
        Some(dir) => println!("[OK] Default output directory: {}", dir.display()),
        None => println!("[--] No default output directory configured"),
    }

    Ok(())
}
