use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use runtime::ViewportPose;
use serde::Serialize;
use tools::{
    SceneFile, frustum_report, load_json, pose_from_parts, project_report, run_overlay,
    sync_report,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and drive a map-synchronized 3D overlay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct PoseArgs {
    /// JSON viewport pose; replaces all other pose flags
    #[arg(long)]
    pose: Option<PathBuf>,

    #[arg(long, default_value_t = 512.0)]
    width: f64,

    #[arg(long, default_value_t = 512.0)]
    height: f64,

    #[arg(long, default_value_t = 0.0)]
    zoom: f64,

    /// Tilt in degrees, clamped to [0, 60]
    #[arg(long, default_value_t = 0.0)]
    pitch: f64,

    /// Rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    bearing: f64,

    /// Longitude of the view center
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    center_lon: f64,

    /// Latitude of the view center
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    center_lat: f64,
}

impl PoseArgs {
    fn resolve(&self) -> Result<ViewportPose, String> {
        if let Some(path) = &self.pose {
            return load_json(path);
        }
        Ok(pose_from_parts(
            self.width,
            self.height,
            self.center_lon,
            self.center_lat,
            self.zoom,
            self.pitch,
            self.bearing,
        ))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Near/far planes and projection for a pose
    Frustum {
        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Camera, projection and world anchor matrices for a pose
    Sync {
        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Project a coordinate into world space and onto the screen
    Project {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Meters above the ground
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        alt: f64,

        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Run the overlay headless with a pillar layer and report the last frame
    Render {
        /// JSON scene file with an optional pose and a pillar list
        #[arg(long)]
        scene: Option<PathBuf>,

        #[arg(long, default_value_t = 120)]
        frames: u64,

        /// Frame rate in Hz
        #[arg(long, default_value_t = 60.0)]
        rate: f64,

        #[command(flatten)]
        pose: PoseArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();
    debug!(command = ?cli.command, "parsed arguments");

    match cli.command {
        Command::Frustum { pose } => print_json(&frustum_report(&pose.resolve()?)),
        Command::Sync { pose } => print_json(&sync_report(pose.resolve()?)?),
        Command::Project {
            lon,
            lat,
            alt,
            pose,
        } => print_json(&project_report(pose.resolve()?, lon, lat, alt)?),
        Command::Render {
            scene,
            frames,
            rate,
            pose,
        } => {
            let scene: SceneFile = match scene {
                Some(path) => load_json(&path)?,
                None => SceneFile::default(),
            };
            let pose = match scene.pose {
                Some(p) => p,
                None => pose.resolve()?,
            };
            print_json(&run_overlay(pose, scene.pillars_or_demo(), frames, rate)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}
