// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A simple front-end for analysing a trace file.
//!
//! For example, run using:
//!   cargo run --bin gantry-clock -- demos/ring.yaml --scene scene.yaml
//! --stdout --stdout-level debug

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use gantry_clock::{LogicalClock, SceneConfig};
use gantry_graph::GraphBuilder;
use gantry_models::schema::TraceFile;
use gantry_models::types::{TraceError, TraceTime};
use gantry_track::builder::{TrackerConfig, setup_tracker};
use gantry_track::entity::toplevel;

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Reconstruct and lay out the logical structure of a recorded trace")]
struct Cli {
    /// Trace file to analyse.
    trace: String,

    /// Write the computed scene as YAML to this file.
    #[arg(long)]
    scene: Option<String>,

    /// Scene geometry file (x_offset/y_offset/radius).
    #[arg(long)]
    geometry: Option<String>,

    /// Override the communication matching tolerance, in microseconds.
    #[arg(long)]
    tolerance_us: Option<u64>,

    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level
    /// set to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,
}

fn load_geometry(path: Option<&String>) -> Result<SceneConfig> {
    match path {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .map_err(|e| TraceError(format!("Unable to read {path}: {e}")))?;
            Ok(serde_yaml::from_str(&s)
                .map_err(|e| TraceError(format!("serde_yaml::from_str failed: {e}")))?)
        }
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let tracker = setup_tracker(&TrackerConfig {
        enable: args.stdout,
        level: args.stdout_level,
        filter_regex: &args.stdout_filter_regex,
        file: None,
    })?;
    let top = toplevel(&tracker, "gantry");

    let trace = TraceFile::from_file(Path::new(&args.trace))?.to_trace()?;
    println!(
        "Loaded trace: {} slots across {} locations, {} communications, {} collectives, \
         runtime {}.",
        trace.num_slots(),
        trace.slots().len(),
        trace.communications().len(),
        trace.collective_communications().len(),
        trace.duration()
    );

    let mut builder = GraphBuilder::new(&top);
    if let Some(us) = args.tolerance_us {
        builder = builder.with_tolerance(TraceTime::from_micros(us));
    }
    let graph = builder.build(&trace)?;

    let config = load_geometry(args.geometry.as_ref())?;
    let layout = LogicalClock::new(&top, &graph, config).run()?;
    println!(
        "Laid out {} node marks, {} edges, {} collective spans; {} columns.",
        layout.scene.nodes.len(),
        layout.scene.edges.len(),
        layout.scene.collectives.len(),
        layout.max_column()
    );

    if let Some(path) = &args.scene {
        let yaml = serde_yaml::to_string(&layout.scene)?;
        std::fs::write(path, yaml)?;
        println!("Wrote scene to {path}");
    }

    tracker.shutdown();
    Ok(())
}
