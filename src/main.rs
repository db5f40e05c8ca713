use std::path::PathBuf;

use clap::{Parser, Subcommand};
use poolviz::commands::{self, ExportOptions};
use poolviz::{init_logging, SceneFile, BUILD_DATE, BUILD_PROFILE, VERSION};

/// PoolViz headless tools.
#[derive(Parser, Debug)]
#[command(name = "poolviz", version, about = "Composite pool materials onto photos")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene over its photo at full resolution and save a PNG.
    Export {
        /// Source photo, or a directory searched for the scene's photo id.
        #[arg(long, value_name = "FILE")]
        photo: PathBuf,
        /// Scene file with masks and calibration.
        #[arg(long, value_name = "FILE")]
        scene: PathBuf,
        /// JSON array of materials.
        #[arg(long, value_name = "FILE")]
        materials: PathBuf,
        /// Output PNG.
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        /// Root for relative texture URLs (defaults to the materials file's directory).
        #[arg(long, value_name = "DIR")]
        textures: Option<PathBuf>,
        /// Engine configuration (.json or .toml).
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the area and perimeter of every mask as JSON.
    Measure {
        #[arg(long, value_name = "FILE")]
        scene: PathBuf,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = CliArgs::parse();
    tracing::debug!("poolviz {} ({} build, {})", VERSION, BUILD_PROFILE, BUILD_DATE);

    match args.command {
        Command::Export {
            photo,
            scene,
            materials,
            out,
            textures,
            config,
        } => {
            commands::export(&ExportOptions {
                photo,
                scene,
                materials,
                out,
                textures,
                config,
            })
            .await?;
        }
        Command::Measure { scene, config } => {
            let config = commands::load_config(config.as_deref())?;
            let scene = SceneFile::load_from_file(&scene)?;
            let measured = commands::measure(&scene, &config)?;
            println!("{}", serde_json::to_string_pretty(&measured)?);
        }
    }
    Ok(())
}
