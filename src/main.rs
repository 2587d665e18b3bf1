//! Applies the strokes of a TOML script to a flat in-memory world and reports what changed.
#![forbid(unsafe_code)]

mod host;
mod script;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use brushwork_blocks::BlockRegistry;
use brushwork_brush::heightmap::ImageHeightMapLoader;
use brushwork_brush::{BrushError, BrushLimits, Stroke};
use clap::Parser;
use log::{error, info, warn};

use crate::host::ScriptHost;
use crate::script::{BindEnv, Script};

#[derive(Parser, Debug)]
#[command(name = "brushwork", about = "Run brush strokes from a script against a test world")]
struct Args {
    /// Stroke script (TOML)
    script: PathBuf,
    /// Brush limits; built-in defaults when omitted
    #[arg(long)]
    limits: Option<PathBuf>,
    /// Block definitions
    #[arg(long, default_value = "assets/blocks.toml")]
    blocks: PathBuf,
    /// Base seed; click `i` uses `seed + i` unless it sets its own
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let limits = match &args.limits {
        Some(path) => BrushLimits::load_from_path(path)?,
        None => BrushLimits::default(),
    };
    let registry = BlockRegistry::load_from_path(&args.blocks)?;
    info!("loaded {} block types from {}", registry.len(), args.blocks.display());
    let script = Script::load_from_path(&args.script)?;
    let mut world = script.world.build(&registry)?;
    let loader = ImageHeightMapLoader::new(&limits.heightmap_dir);
    let mut host = ScriptHost::new(script.player.to_player());

    let mut click_no: u64 = 0;
    let mut total = 0usize;
    for (i, spec) in script.strokes.iter().enumerate() {
        let env = BindEnv {
            registry: &registry,
            loader: &loader,
            limits: &limits,
            world: &world,
        };
        let mut settings = match spec.bind(&env) {
            Ok(s) => s,
            Err(e) => {
                warn!("stroke {i}: not bound: {e}");
                continue;
            }
        };
        for click in &spec.clicks {
            let seed = click.seed.unwrap_or(args.seed.wrapping_add(click_no));
            click_no += 1;
            let since = world.stamp();
            let stroke = Stroke::new(click.target(), &mut host)
                .facing(click.facing())
                .action(click.action)
                .seed(seed);
            match settings.invoke(&mut world, &limits, stroke) {
                Ok(report) => {
                    total += report.changed;
                    let chunks = world.changed_chunks(since).len();
                    println!(
                        "stroke {i:>3} {:<18} at {:?}: {} changed in {chunks} chunks{}",
                        settings.brush().name(),
                        click.at,
                        report.changed,
                        describe_extras(&report)
                    );
                }
                Err(e) if recoverable(&e) => warn!("stroke {i}: {e}"),
                Err(e) => return Err(e.into()),
            }
        }
    }
    let stats = world.stats();
    println!(
        "{total} blocks changed; world holds {} blocks in {} chunks; {} commands logged",
        stats.blocks,
        stats.chunk_entries,
        host.commands.ran.len()
    );
    Ok(())
}

/// Errors a player would see as a message rather than a failure of the run.
fn recoverable(e: &BrushError) -> bool {
    e.is_limit()
        || matches!(
            e,
            BrushError::PermissionDenied(_)
                | BrushError::MissingCollaborator(_)
                | BrushError::Command { .. }
        )
}

fn describe_extras(report: &brushwork_brush::StrokeReport) -> String {
    let mut out = String::new();
    if let Some(r) = report.rotation {
        out.push_str(&format!(", rotation {r:.0}"));
    }
    if report.commands_run > 0 {
        out.push_str(&format!(", {} commands", report.commands_run));
    }
    if report.entities_removed > 0 {
        out.push_str(&format!(", {} entities removed", report.entities_removed));
    }
    out
}
