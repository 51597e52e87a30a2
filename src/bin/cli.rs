use std::env;
use std::sync::Arc;

use chrono::Utc;
use platewatch::config::PlateWatchConfig;
use platewatch::pipeline::RecognitionPipeline;
use platewatch::scanner::{PlateScanner, WatchEvent};
use platewatch::store::{
    check_violations, MemoryScanStore, MemorySearchHistoryStore, MemoryViolationStore,
    SearchHistoryStore,
};
use platewatch::testing::SyntheticCamera;
use platewatch::types::ImageFrame;
use platewatch::validation::validate_plate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    platewatch::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: platewatch-cli <command> [args]");
        eprintln!("Commands: validate, scan, check, watch");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "validate" => cmd_validate(&args),
        "scan" => cmd_scan(&args),
        "check" => cmd_check(&args),
        "watch" => cmd_watch(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_validate(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() < 3 {
        eprintln!("Usage: platewatch-cli validate <plate> [--json]");
        std::process::exit(1);
    }
    let plate = &args[2];
    let result = validate_plate(plate);

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", result.message);
        if let Some(format) = &result.format {
            println!("format: {}", format);
        }
        if let Some(suggestion) = &result.suggestion {
            println!("suggestion: {}", suggestion);
        }
    }
    Ok(())
}

fn cmd_scan(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() < 3 {
        eprintln!("Usage: platewatch-cli scan <image-path> [--seed <n>] [--json]");
        std::process::exit(1);
    }
    let path = &args[2];
    let seed = parse_flag(args, "--seed")?;

    let image = image::open(path)?;
    let frame = ImageFrame::from_dynamic_image(&image, "upload");
    log::info!("Loaded {} ({}x{})", path, frame.width, frame.height);

    let scanner = build_scanner(seed);
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(scanner.scan_frame(
        frame,
        platewatch::types::PlateSource::Upload,
        Some("cli"),
    ));

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&report)?);
    } else if let Some(candidate) = &report.candidate {
        println!(
            "plate: {} (confidence {:.2}, quality {:.2})",
            candidate.text, candidate.confidence, report.quality
        );
    } else {
        println!(
            "no plate recognized (quality {:.2}): {}",
            report.quality,
            report.message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() < 3 {
        eprintln!("Usage: platewatch-cli check <plate> [--json]");
        std::process::exit(1);
    }
    let plate = platewatch::normalize_plate(&args[2]);
    let config = PlateWatchConfig::load_or_default();

    let violations = MemoryViolationStore::with_sample_data();
    let history = MemorySearchHistoryStore::new();
    history.record_search("cli", &plate, Utc::now())?;
    let recent = history.recent_searches("cli", config.scanner.history_limit)?;
    log::debug!("{} plate(s) in search history", recent.len());

    let summary = check_violations(&violations, &plate)?;

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    if !summary.has_violations {
        println!("{}: no violations on record", plate);
        return Ok(());
    }

    println!("{}: {} violation(s)", plate, summary.violations.len());
    for violation in &summary.violations {
        println!(
            "  {} | {} | {} | {} VND | {}",
            violation.violation_date.format("%Y-%m-%d"),
            violation.violation_type,
            violation.location.as_deref().unwrap_or("unknown location"),
            violation.fine_amount.unwrap_or(0),
            violation.status.as_str()
        );
    }
    println!(
        "total fines: {} VND (unpaid: {} VND)",
        summary.total_fines, summary.unpaid_fines
    );
    Ok(())
}

fn cmd_watch(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let seed = parse_flag(args, "--seed")?;
    let interval_ms: Option<u64> = parse_flag(args, "--interval")?;

    let mut config = PlateWatchConfig::load_or_default();
    if let Some(interval) = interval_ms {
        config.scanner.poll_interval_ms = interval;
    }
    config
        .validate()
        .map_err(platewatch::PlateWatchError::ConfigError)?;

    let pipeline = match seed {
        Some(seed) => RecognitionPipeline::simulated_with_seed(config.pipeline.clone(), seed),
        None => RecognitionPipeline::simulated(config.pipeline.clone()),
    };
    let scanner = PlateScanner::new(
        Arc::new(pipeline),
        Arc::new(MemoryScanStore::new()),
        config.scanner,
    );
    let camera = Arc::new(SyntheticCamera::new(1280, 720));

    let (ctrlc_tx, mut ctrlc_rx) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(());
    })?;

    println!("watching synthetic camera, ctrl-c to stop");
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut session = scanner.start_watch(camera.clone(), Some("cli".to_string()));
        loop {
            tokio::select! {
                event = session.next_event() => match event {
                    Some(WatchEvent::Detected(candidate)) => {
                        println!(
                            "detected {} (confidence {:.2}) after {} frame(s)",
                            candidate.text,
                            candidate.confidence,
                            camera.captured()
                        );
                        break;
                    }
                    Some(WatchEvent::Error(message)) => {
                        eprintln!("capture error: {}", message);
                    }
                    None => {
                        println!("watch session ended");
                        break;
                    }
                },
                _ = ctrlc_rx.recv() => {
                    println!("stopping");
                    break;
                }
            }
        }
        session.stop().await;
    });
    Ok(())
}

fn build_scanner(seed: Option<u64>) -> PlateScanner {
    let config = PlateWatchConfig::load_or_default();
    let pipeline = match seed {
        Some(seed) => RecognitionPipeline::simulated_with_seed(config.pipeline.clone(), seed),
        None => RecognitionPipeline::simulated(config.pipeline.clone()),
    };
    PlateScanner::new(
        Arc::new(pipeline),
        Arc::new(MemoryScanStore::new()),
        config.scanner,
    )
}

fn parse_flag<T: std::str::FromStr>(
    args: &[String],
    flag: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T::Err: std::error::Error + 'static,
{
    if let Some(position) = args.iter().position(|a| a == flag) {
        let value = args
            .get(position + 1)
            .ok_or_else(|| format!("{} requires a value", flag))?;
        return Ok(Some(value.parse::<T>()?));
    }
    Ok(None)
}
