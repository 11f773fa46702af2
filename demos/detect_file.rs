//! Example: Detect speech boundaries in a single audio file
//!
//! Usage: detect_file [--json] [--vad] [--params params.json] [--range START END] <file>

use boundary_dsp::io::decode_file;
use boundary_dsp::{
    detect_boundaries_in_range, detect_boundaries_with_config, detect_intervals_with_config,
    CancellationToken, DetectionMode, DetectionResult, DetectorConfig, ParamSet, Side,
};
use std::env;

fn load_params(path: &str) -> Result<ParamSet, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_result(result: &DetectionResult) {
    let name = result.side.name();
    println!("{} ({}):", name, result.times.len());
    for t in &result.times {
        println!("  {:.4} s", t);
    }
    println!(
        "  clusters={} eps={:.2} runs={} skipped={} abandoned={} time={:.1} ms",
        result.metadata.num_clusters,
        result.metadata.eps,
        result.metadata.transitions_examined,
        result.metadata.transitions_skipped,
        result.metadata.transitions_abandoned,
        result.metadata.processing_time_ms
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut vad = false;
    let mut params = ParamSet::default();
    let mut range: Option<(f64, f64)> = None;
    let mut path: Option<String> = None;

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--vad" => vad = true,
            "--params" => {
                if args.is_empty() {
                    return Err("--params requires a file".into());
                }
                params = load_params(&args.remove(0))?;
            }
            "--range" => {
                if args.len() < 2 {
                    return Err("--range requires START and END seconds".into());
                }
                let start = args.remove(0).parse::<f64>()?;
                let end = args.remove(0).parse::<f64>()?;
                range = Some((start, end));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: detect_file [--json] [--vad] [--params FILE] [--range START END] <file>\n\
                     \n\
                     --json            Emit JSON instead of text\n\
                     --vad             Voice-activity mode: print speech intervals\n\
                     --params FILE     Onset/offset parameters as JSON\n\
                     --range START END Only search between two times (seconds)\n"
                );
                return Ok(());
            }
            _ => path = Some(a),
        }
    }

    let path = match path {
        Some(p) => p,
        None => {
            eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
            std::process::exit(2);
        }
    };

    let signal = decode_file(&path)?;
    eprintln!(
        "{}: {} samples at {} Hz ({:.2} s)",
        path,
        signal.samples.len(),
        signal.sample_rate,
        signal.duration_seconds()
    );

    let config = DetectorConfig {
        mode: if vad { DetectionMode::Vad } else { DetectionMode::General },
        ..DetectorConfig::default()
    };
    let token = CancellationToken::new();

    if vad {
        let intervals =
            detect_intervals_with_config(&signal.samples, signal.sample_rate, &params, &config, &token)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&intervals)?);
        } else {
            for interval in &intervals {
                println!("{:.4}\t{:.4}", interval.start, interval.end);
            }
        }
        return Ok(());
    }

    let mut results = Vec::new();
    for side in [Side::Onset, Side::Offset] {
        let result = match range {
            Some((start, end)) => detect_boundaries_in_range(
                &signal.samples,
                signal.sample_rate,
                &params,
                side,
                &config,
                start,
                end,
            )?,
            None => detect_boundaries_with_config(
                &signal.samples,
                signal.sample_rate,
                &params,
                side,
                &config,
                &token,
            )?,
        };
        results.push(result);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_result(result);
        }
    }

    Ok(())
}
