//! Command-line front end for the GAP codec: PNG/JPEG/etc in, `.gap`
//! container out, and back again.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use gap::error::GapResult;

#[derive(Parser)]
#[command(name = "gap", version, about = "Patch-wise gradient-aligned spectral image codec")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress an image into a `.gap` container.
    Encode {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Polylogarithmic spectral decay.
        #[arg(short, long, default_value_t = 0.1)]
        s: f32,
        /// Hard-threshold sparsification cutoff.
        #[arg(short, long, default_value_t = 0.5)]
        t: f32,
        /// Encode as single-channel grayscale instead of YCbCr.
        #[arg(long)]
        grayscale: bool,
    },
    /// Decompress a `.gap` container back into a PNG.
    Decode {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn install_thread_pool() {
    if let Ok(raw) = std::env::var("GAP_THREADS") {
        if let Ok(n) = raw.parse::<usize>() {
            if n > 0 {
                let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
            }
        }
    }
}

fn run(cli: Cli) -> GapResult<()> {
    match cli.command {
        Command::Encode { input, output, s, t, grayscale } => {
            log::debug!("loading {}", input.display());
            let bytes = if grayscale {
                let img = image::open(&input)?.to_luma8();
                let (width, height) = img.dimensions();
                gap::encode_gray(width, height, img.as_raw(), s, t)?
            } else {
                let img = image::open(&input)?.to_rgb8();
                let (width, height) = img.dimensions();
                gap::encode_rgb(width, height, img.as_raw(), s, t)?
            };
            std::fs::write(&output, &bytes)?;
            println!("{} {} -> {} ({} bytes)", "encoded".green().bold(), input.display(), output.display(), bytes.len());
            Ok(())
        }
        Command::Decode { input, output } => {
            log::debug!("loading {}", input.display());
            let data = std::fs::read(&input)?;
            let (_header, rgba) = gap::decode(&data)?;
            let image_buf =
                image::RgbaImage::from_raw(rgba.width as u32, rgba.height as u32, rgba.data).ok_or_else(|| {
                    gap::GapError::InputInvalid("decoded buffer dimensions do not match pixel count".into())
                })?;
            image_buf.save(&output)?;
            println!("{} {} -> {}", "decoded".green().bold(), input.display(), output.display());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    install_thread_pool();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
