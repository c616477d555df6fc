use anyhow::{Context, Result};
use chroma_key::{ChromaKeyConfig, Effect, load_rgba};
use image::{Rgb, RgbImage};
use std::{fs, path::PathBuf, time::Instant};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let output_dir = PathBuf::from("./output");
    if !output_dir.exists() {
        fs::create_dir(&output_dir)?;
    }

    // White background with a red square in the middle
    let input_file = output_dir.join("chroma_key_input.png");
    RgbImage::from_fn(256, 256, |x, y| {
        if (64..192).contains(&x) && (64..192).contains(&y) {
            Rgb([220, 30, 30])
        } else {
            Rgb([250, 250, 250])
        }
    })
    .save(&input_file)?;

    for tolerance in [0, 10, 50, 100] {
        let mut img = load_rgba(&input_file)?;

        let start = Instant::now();
        ChromaKeyConfig::new()
            .with_target(Rgb([255, 255, 255]))
            .with_tolerance(tolerance)
            .apply(&mut img)?;
        log::info!("tolerance {tolerance} spent: {:?}", start.elapsed());

        let transparent = img.pixels().filter(|p| p[3] == 0).count();
        log::info!("transparent pixels: {transparent}");

        let output_path = output_dir.join(format!("chroma_key_tol_{tolerance}.png"));
        img.save(&output_path)
            .with_context(|| output_path.to_string_lossy().to_string())?;
        log::info!("Saving result to: {:?}", output_path);
    }

    Ok(())
}
