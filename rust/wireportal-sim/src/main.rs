use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use wireportal_sim::{replay, Scene};

#[derive(Parser, Debug)]
#[command(name = "wireportal-sim", version, about = "Replay a wire portal scene and report activations and teleports")]
struct Args {
    /// Scene file (JSON)
    #[arg(long = "scene", value_name = "PATH")]
    scene: PathBuf,

    /// Run exactly this many ticks instead of stopping once the timeline is drained
    #[arg(long = "ticks", value_name = "N")]
    ticks: Option<u64>,

    /// Write the report here instead of stdout
    #[arg(long = "out", value_name = "PATH")]
    out: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long = "json-logs", default_value_t = false)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    info!(core_version = %wireportal_core::version(), scene = %args.scene.display(), "starting wireportal-sim");

    let scene = Scene::load(&args.scene)?;
    let report = match replay(&scene, args.ticks) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "scene replay failed");
            return Err(e);
        }
    };
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;

    match &args.out {
        Some(path) => {
            let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            f.write_all(json.as_bytes())?;
            f.write_all(b"\n")?;
            info!(out = %path.display(), committed = report.committed(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
