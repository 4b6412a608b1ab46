use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{debug, warn, LevelFilter};

use image_watermark::{
    default_output_path, is_supported_image, preview, save_image, Anchor, FontDirectory,
    KindChoice, Result, WatermarkEngine, WatermarkSettings,
};

#[derive(Parser)]
#[command(
    name = "watermark",
    about = "Apply a text or logo watermark to an image",
    version,
    after_help = "Simple usage: watermark photo.jpg --text \"© Me\"  (writes photo_watermarked.jpg)\n\n\
                  Anchors: top-left, top-center, top-right, center-left, center,\n\
                  center-right, bottom-left, bottom-center, bottom-right"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file (PNG or JPEG)
    #[arg(required_unless_present = "list_fonts")]
    input: Option<PathBuf>,

    /// Output file (default: {name}_watermarked.{ext})
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long, conflicts_with = "logo")]
    text: Option<String>,

    /// Logo image to use instead of text
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Font family for text watermarks
    #[arg(short, long, default_value = "Arial")]
    font: String,

    /// Extra directory to search for fonts (searched before system fonts)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Font size, or logo side length, in pixels (1-1000)
    #[arg(short, long, default_value_t = 24, allow_negative_numbers = true)]
    size: i64,

    /// Text color as #RRGGBB or #RGB
    #[arg(short, long, default_value = "#feffff")]
    color: String,

    /// Watermark opacity (0-255)
    #[arg(long, default_value_t = 64, allow_negative_numbers = true)]
    opacity: i64,

    /// Counter-clockwise rotation in degrees (0-360)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    rotation: i64,

    /// Placement anchor
    #[arg(short, long, default_value = "center")]
    anchor: String,

    /// Repeat the watermark across the whole image
    #[arg(long)]
    tile: bool,

    /// Also write a preview (longest side 400px) to this path
    #[arg(long, value_name = "PATH")]
    preview: Option<PathBuf>,

    /// List available font families and exit
    #[arg(long)]
    list_fonts: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let fonts = cli
        .font_dirs
        .iter()
        .rev()
        .fold(FontDirectory::system(), |fonts, dir| fonts.with_dir_first(dir));
    debug!("font search path: {:?}", fonts.dirs());
    let engine = WatermarkEngine::new(fonts);

    if cli.list_fonts {
        for family in engine.list_available_fonts() {
            println!("{family}");
        }
        return Ok(());
    }

    // clap enforces `input` unless --list-fonts was given
    let Some(input) = cli.input.as_deref() else {
        return Ok(());
    };
    if !is_supported_image(input) {
        warn!("{} does not look like a PNG or JPEG file", input.display());
    }

    let settings = settings_from(cli);
    let config = settings.to_config()?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));

    let watermarked = engine.process_file(input, &output, &config)?;

    if let Some(path) = &cli.preview {
        save_image(&preview(&watermarked), path)?;
    }

    if !cli.quiet {
        eprintln!("[OK] {} -> {}", file_name(input), output.display());
        if let Some(path) = &cli.preview {
            eprintln!("  preview: {}", path.display());
        }
    }

    Ok(())
}

fn settings_from(cli: &Cli) -> WatermarkSettings {
    let mut settings = WatermarkSettings::new();

    if let Some(logo) = &cli.logo {
        settings.set_kind(KindChoice::Logo);
        settings.set_logo_path(logo);
    } else if let Some(text) = &cli.text {
        settings.set_text(text.as_str());
    }
    settings.set_font_family(cli.font.as_str());

    settings.set_size(cli.size);
    settings.set_opacity(cli.opacity);
    settings.set_rotation(cli.rotation);
    settings.set_tiled(cli.tile);

    if cli.anchor.parse::<Anchor>().is_err() {
        warn!("unknown anchor {:?}, using top-left", cli.anchor);
    }
    settings.set_anchor_name(&cli.anchor);

    if let Err(e) = settings.set_color(&cli.color) {
        warn!("{e}; keeping {}", image_watermark::to_hex(settings.color()));
    }

    if i64::from(settings.size_px()) != cli.size {
        warn!("size {} clamped to {}", cli.size, settings.size_px());
    }
    if i64::from(settings.opacity()) != cli.opacity {
        warn!("opacity {} clamped to {}", cli.opacity, settings.opacity());
    }
    if i64::from(settings.rotation_degrees()) != cli.rotation {
        warn!("rotation {} clamped to {}", cli.rotation, settings.rotation_degrees());
    }

    settings
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
