//! Tessera CLI - inspect animation assets and simulate animators headlessly

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, simulate};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Layered animation runtime tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contents of a clip, controller or glTF file
    Inspect {
        /// Path to a .anim.toml, .controller.toml, .gltf or .glb file
        path: String,

        /// Directory of .anim.toml clips (required for controllers)
        #[arg(long)]
        clips: Option<String>,
    },

    /// Run a controller for a number of ticks and print the final transforms
    Simulate {
        /// Path to the controller file
        #[arg(long)]
        controller: String,

        /// Directory of .anim.toml clips
        #[arg(long)]
        clips: String,

        /// Optional animator settings file
        #[arg(long)]
        settings: Option<String>,

        /// Number of update ticks
        #[arg(long, default_value = "60")]
        ticks: u32,

        /// Seconds per tick
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// State to cross-fade into
        #[arg(long)]
        cross_fade: Option<String>,

        /// Tick at which the cross-fade starts
        #[arg(long, default_value = "0")]
        at: u32,

        /// Cross-fade duration as a fraction of the source clip length
        #[arg(long, default_value = "1.0")]
        duration: f32,

        /// Layer index the cross-fade applies to
        #[arg(long, default_value = "0")]
        layer: usize,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path, clips } => inspect::run(&path, clips.as_deref()),
        Commands::Simulate {
            controller,
            clips,
            settings,
            ticks,
            dt,
            cross_fade,
            at,
            duration,
            layer,
            format,
        } => simulate::run(simulate::SimulateArgs {
            controller,
            clips,
            settings,
            ticks,
            dt,
            cross_fade,
            at,
            duration,
            layer,
            format,
        }),
    }
}
