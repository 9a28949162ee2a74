use clap::{Parser, Subcommand};
use sectormap::render::{render_png, resolve_viewport, SectorFile, ViewChoice};
use sectormap::{init_logging, LatLng, MapConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sectormap",
    version,
    about = "Radio sector map overlay toolkit"
)]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a sector snapshot to PNG
    Render {
        /// Sector snapshot JSON
        #[arg(short, long)]
        sectors: PathBuf,

        /// Output PNG path
        #[arg(short, long, default_value = "sectors.png")]
        output: PathBuf,

        /// Center latitude (fits all sectors when omitted)
        #[arg(long, requires = "lng")]
        lat: Option<f64>,

        /// Center longitude
        #[arg(long, requires = "lat")]
        lng: Option<f64>,

        /// Zoom level used with --lat/--lng
        #[arg(short, long, default_value_t = 13.0)]
        zoom: f64,

        /// Frame width in pixels
        #[arg(long, default_value_t = 1024)]
        width: u32,

        /// Frame height in pixels
        #[arg(long, default_value_t = 768)]
        height: u32,
    },

    /// Write the default configuration
    DefaultConfig {
        /// Destination (.toml or .json)
        #[arg(short, long, default_value = "sectormap.toml")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MapConfig::load_from_file(path)?,
        None => MapConfig::default(),
    };

    match cli.command {
        Command::Render {
            sectors,
            output,
            lat,
            lng,
            zoom,
            width,
            height,
        } => {
            let input = SectorFile::load(&sectors)?.into_scene_input();
            let view = match (lat, lng) {
                (Some(lat), Some(lng)) => ViewChoice::Fixed {
                    center: LatLng::new(lat, lng).validated()?,
                    zoom,
                },
                _ => ViewChoice::FitSectors,
            };
            let viewport = resolve_viewport(&config, &input, view, width, height);
            let summary = render_png(&config, input, viewport, &output)?;
            println!(
                "{} sprites at {} z{} -> {}",
                summary.drawn,
                summary.viewport.center(),
                summary.viewport.zoom(),
                output.display()
            );
        }
        Command::DefaultConfig { output } => {
            MapConfig::default().save_to_file(&output)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
