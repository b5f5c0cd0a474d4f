//! EPD Frame Control Tool
//!
//! Converts images to packed panel buffers, sends them to the render daemon
//! and drives a locally attached panel.

mod image_io;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use epd_frame_client::{RenderClient, Status, DEFAULT_SERVER};
use epd_frame_hw::epd::linux::{self, LinuxSession};
use epd_frame_hw::{pattern, pipeline, Dither, PaletteColor, PanelConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "epdframectl")]
#[command(about = "Image conversion and control tool for six-color e-paper panels")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    panel: PanelArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Local panel wiring, used by display, clear and pattern.
#[derive(Args)]
struct PanelArgs {
    /// SPI device node
    #[arg(long, global = true)]
    spi: Option<String>,

    /// GPIO character device
    #[arg(long, global = true)]
    gpio_chip: Option<String>,

    /// Busy line timeout in milliseconds
    #[arg(long, global = true)]
    busy_timeout_ms: Option<u64>,
}

impl PanelArgs {
    fn config(&self) -> PanelConfig {
        let mut config = PanelConfig::default();
        if let Some(spi) = &self.spi {
            config.spi = spi.clone();
        }
        if let Some(chip) = &self.gpio_chip {
            config.gpio_chip = chip.clone();
        }
        if let Some(ms) = self.busy_timeout_ms {
            config.busy_timeout_ms = ms;
        }
        config
    }
}

#[derive(Args)]
struct ImageArgs {
    /// Input image (or packed buffer with --raw)
    input: PathBuf,

    /// Dithering: atkinson, floyd-steinberg, none
    #[arg(long, default_value = "atkinson")]
    dither: Dither,

    /// Scale and crop images that are not 800x480 or 480x800
    #[arg(long)]
    fit: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternKind {
    /// One vertical band per palette color
    Stripes,
    /// Rectangular border on black
    Frame,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image to a packed panel buffer
    Convert {
        #[command(flatten)]
        image: ImageArgs,

        /// Output buffer path
        output: PathBuf,

        /// Also write a PNG of the dithered result
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Render a packed buffer as PNG
    Preview {
        /// Packed buffer
        input: PathBuf,

        /// Output PNG path
        output: PathBuf,
    },
    /// Send an image to the render daemon
    Send {
        #[command(flatten)]
        image: ImageArgs,

        /// Daemon address
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Input is an already packed buffer
        #[arg(long)]
        raw: bool,
    },
    /// Show an image on the local panel
    Display {
        #[command(flatten)]
        image: ImageArgs,

        /// Input is an already packed buffer
        #[arg(long)]
        raw: bool,
    },
    /// Clear the local panel to a solid color
    Clear {
        /// black, white, yellow, red, blue or green
        #[arg(long, default_value = "white")]
        color: PaletteColor,
    },
    /// Show a test pattern on the local panel
    Pattern {
        kind: PatternKind,

        /// Frame inset in pixels
        #[arg(long, default_value = "20")]
        margin: usize,

        /// Frame line width in pixels
        #[arg(long, default_value = "10")]
        thickness: usize,

        /// Frame color
        #[arg(long, default_value = "red")]
        color: PaletteColor,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let panel = cli.panel.config();

    match cli.command {
        Commands::Convert {
            image,
            output,
            preview,
        } => {
            let packed = prepare(&image, false)?;
            std::fs::write(&output, &packed)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} bytes to {}", packed.len(), output.display());
            if let Some(path) = preview {
                write_preview(&packed, &path)?;
            }
        }
        Commands::Preview { input, output } => {
            let packed = image_io::read_packed(&input)?;
            write_preview(&packed, &output)?;
        }
        Commands::Send { image, server, raw } => {
            let packed = prepare(&image, raw)?;
            let mut client = RenderClient::connect(&server)
                .await
                .context("Failed to connect to daemon. Is epdframed running?")?;
            let status = client.send(&packed).await?;
            match status {
                Status::Ok => println!("Displayed"),
                Status::Queued => println!("Queued for display"),
                Status::ImageSizeMismatch => bail!("Daemon rejected the payload size"),
            }
        }
        Commands::Display { image, raw } => {
            let packed = prepare(&image, raw)?;
            with_panel(panel, move |session| session.display(&packed)).await?;
            println!("Displayed {}", image.input.display());
        }
        Commands::Clear { color } => {
            with_panel(panel, move |session| session.clear(color)).await?;
            println!("Panel cleared to {}", color);
        }
        Commands::Pattern {
            kind,
            margin,
            thickness,
            color,
        } => {
            let raster = match kind {
                PatternKind::Stripes => pattern::stripes(),
                PatternKind::Frame => pattern::frame(margin, thickness, color)?,
            };
            let packed = pipeline::prepare(raster, Dither::None)?;
            with_panel(panel, move |session| session.display(&packed)).await?;
            println!("Pattern displayed");
        }
    }

    Ok(())
}

/// Loads a packed buffer as-is, or decodes and converts an image.
fn prepare(args: &ImageArgs, raw: bool) -> Result<Vec<u8>> {
    if raw {
        return image_io::read_packed(&args.input);
    }
    let raster = image_io::load_raster(&args.input, args.fit)?;
    let packed = pipeline::prepare(raster, args.dither)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;
    info!("Converted {} with {}", args.input.display(), args.dither);
    Ok(packed)
}

fn write_preview(packed: &[u8], path: &Path) -> Result<()> {
    let raster = pipeline::preview(packed)?;
    image_io::save_png(&raster, path)?;
    println!("Wrote preview to {}", path.display());
    Ok(())
}

/// Opens the local panel, runs one refresh and puts the panel to sleep.
async fn with_panel<F>(config: PanelConfig, op: F) -> Result<()>
where
    F: FnOnce(&mut LinuxSession) -> epd_frame_hw::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut session = linux::open(&config)
            .with_context(|| format!("Failed to open panel on {}", config.spi))?;
        op(&mut session).context("Panel refresh failed")?;
        session.close().context("Failed to put panel to sleep")?;
        Ok(())
    })
    .await
    .context("Panel task panicked")?
}
