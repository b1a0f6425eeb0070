//! Demo console: load a display file, print its upstream contract, feed it
//! a simulated sample stream, and write an SVG snapshot.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Utc;
use opsview_engine::{DirectoryResolver, Display};
use opsview_model::config::ConsoleConfig;
use opsview_model::{
    parse_markup, AcquisitionStatus, MonitoringResult, ParameterSample, Value,
};
use rand::Rng;
use tracing::info;

struct Args {
    display: PathBuf,
    ticks: u32,
    out: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut display = None;
    let mut ticks = 20;
    let mut out = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => {
                let value = args.next().context("--ticks needs a number")?;
                ticks = value.parse().context("--ticks needs a number")?;
            }
            "--out" => {
                out = Some(PathBuf::from(args.next().context("--out needs a path")?));
            }
            "--help" | "-h" => {
                bail!("usage: opsview <display.uss> [--ticks N] [--out FILE.svg]");
            }
            other => display = Some(PathBuf::from(other)),
        }
    }

    let Some(display) = display else {
        bail!("usage: opsview <display.uss> [--ticks N] [--out FILE.svg]");
    };
    Ok(Args { display, ticks, out })
}

fn main() -> anyhow::Result<()> {
    // allow RUST_LOG override; default keeps engine warnings visible
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter.as_str())
        .init();

    let args = parse_args()?;
    let config = ConsoleConfig::load();

    // a bare name is looked up in the configured displays directory
    let path = if args.display.exists() {
        args.display.clone()
    } else {
        config.displays.dir.join(&args.display)
    };
    let xml = std::fs::read_to_string(&path)
        .with_context(|| format!("reading display {}", path.display()))?;
    let doc = parse_markup(&xml)?;

    let resolver_root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let resolver = DirectoryResolver::new(resolver_root);

    let mut display = Display::new();
    display.parse_and_draw(&doc, Some(&resolver))?;
    // `display`/`debug` are reserved idents inside tracing macros, so alias
    // the binding to avoid shadowing when logging its fields.
    let loaded = &display;
    info!(
        "loaded '{}' ({}x{}), {} widgets",
        loaded.title,
        loaded.width,
        loaded.height,
        loaded.widgets().len()
    );

    println!("subscription set:");
    for name in display.ops_names() {
        println!("  {}", name);
    }
    if !display.computations().is_empty() {
        println!(
            "computations: {}",
            serde_json::to_string_pretty(display.computations())?
        );
    }

    simulate(&mut display, args.ticks)?;

    let out = args.out.unwrap_or_else(|| {
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}.svg", stem))
    });
    std::fs::write(&out, display.to_svg())
        .with_context(|| format!("writing snapshot {}", out.display()))?;
    info!("snapshot written to {}", out.display());
    Ok(())
}

/// Drive the display with a synthetic sample stream: one delivery per tick
/// for every subscribed parameter, then a digest, the way a host would run
/// it on a frame timer.
fn simulate(display: &mut Display, ticks: u32) -> anyhow::Result<()> {
    let names: Vec<String> = display.ops_names().iter().cloned().collect();
    if names.is_empty() {
        info!("display has no parameter bindings, nothing to simulate");
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    let bases: Vec<f64> = names.iter().map(|_| rng.gen_range(10.0..100.0)).collect();

    for tick in 0..ticks {
        let samples: Vec<ParameterSample> = names
            .iter()
            .zip(&bases)
            .map(|(name, base)| {
                let phase = tick as f64 / 5.0;
                let value = base + base * 0.1 * phase.sin() + rng.gen_range(-0.5..0.5);
                let monitoring = match rng.gen_range(0..20) {
                    0 => MonitoringResult::Warning,
                    1 => MonitoringResult::Critical,
                    _ => MonitoringResult::InLimits,
                };
                ParameterSample {
                    ops_name: name.clone(),
                    raw_value: Value::Float(value * 100.0),
                    eng_value: Value::Float(value),
                    acquisition_status: AcquisitionStatus::Acquired,
                    monitoring_result: Some(monitoring),
                    generation_time: Utc::now() + chrono::Duration::milliseconds(tick as i64 * 500),
                }
            })
            .collect();

        display.process_parameter_samples(&samples);
        display.digest()?;
    }

    info!("simulated {} ticks over {} parameters", ticks, names.len());
    Ok(())
}
