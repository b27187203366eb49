use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use stirnubuks_feed::config::{FeedConfig, Preset, load_preset, save_preset};
use stirnubuks_feed::feed::{
    CancelToken, CycleReport, build_fetch_pool, run_awarding, run_polling, run_start_list,
    run_summary_cycle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Watch,
    Once,
    StartList,
    Podium,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mode = parse_mode(&args);
    let max_cycles = parse_value_arg(&args, "--cycles")
        .map(|raw| raw.parse::<u64>().context("--cycles expects a number"))
        .transpose()?;

    if let Some(path) = parse_value_arg(&args, "--init-preset") {
        let path = PathBuf::from(path);
        save_preset(&path, &Preset::default())?;
        println!("wrote preset template to {}", path.display());
        return Ok(());
    }

    let mut config = FeedConfig::from_env();
    if let Some(path) = parse_value_arg(&args, "--preset") {
        config.preset_path = Some(PathBuf::from(path));
    }
    let preset = match config.preset_path.as_deref() {
        Some(path) => load_preset(path)?,
        None => Default::default(),
    };

    match mode {
        Mode::Podium => {
            let report = run_awarding(&config, &preset)?;
            print_report("Awarding", &report);
        }
        Mode::StartList => {
            let pool = build_fetch_pool(config.fetch_parallelism);
            let report = run_start_list(&config, &pool)?;
            print_report("Start list", &report);
        }
        Mode::Once => {
            let pool = build_fetch_pool(config.fetch_parallelism);
            let report = run_summary_cycle(&config, &preset, &pool)?;
            print_report("Summary", &report);
        }
        Mode::Watch => {
            let missing = config.missing_requirements();
            if !missing.is_empty() {
                return Err(anyhow!("missing configuration: {}", missing.join(", ")));
            }
            let token = CancelToken::new();
            let mut done = 0u64;
            log::info!(
                "polling {} distance(s) every {}s",
                config.distances.len(),
                config.poll_interval.as_secs()
            );
            run_polling(&config, &preset, &token, |report| {
                done += 1;
                if let Ok(report) = &report {
                    print_report("Summary", report);
                }
                if max_cycles.is_some_and(|max| done >= max) {
                    token.cancel();
                }
            });
        }
    }

    Ok(())
}

fn print_report(label: &str, report: &CycleReport) {
    println!(
        "{label} @ {}: {} records",
        report.finished_at, report.records
    );
    for d in &report.distances {
        match &d.error {
            Some(err) => println!("  {}: error: {err}", d.distance),
            None => println!("  {}: {} participants", d.distance, d.participants),
        }
    }
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
}

fn parse_mode(args: &[String]) -> Mode {
    if args.iter().any(|a| a == "--podium") {
        Mode::Podium
    } else if args.iter().any(|a| a == "--startlist") {
        Mode::StartList
    } else if args.iter().any(|a| a == "--once") {
        Mode::Once
    } else {
        Mode::Watch
    }
}

fn parse_value_arg(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
