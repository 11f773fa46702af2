//! Example: Detect speech boundaries in many files in parallel
//!
//! Decodes every file, runs onset and offset detection on a rayon pool, and
//! prints one line (or one JSON object with `--json`) per file.

use boundary_dsp::batch::{default_jobs, detect_batch, BatchJob};
use boundary_dsp::io::decode_file;
use boundary_dsp::{CancellationToken, DetectorConfig, ParamSet};
use rayon::prelude::*;
use std::env;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut params = ParamSet::default();
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--params" => {
                let file = args.first().ok_or("--params requires a file")?.clone();
                args.remove(0);
                params = serde_json::from_str(&std::fs::read_to_string(file)?)?;
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: detect_batch [--jobs N] [--json] [--params FILE] <file1> <file2> ...\n\
                     \n\
                     --jobs N       Parallel workers (default: CPU-1)\n\
                     --json         Emit one JSON object per line (JSONL)\n\
                     --params FILE  Onset/offset parameters as JSON\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let t0 = Instant::now();

    // Decoding is independent per file as well
    let decoded: Vec<(String, Result<BatchJob, String>)> = paths
        .par_iter()
        .map(|path| {
            let job = decode_file(path)
                .map(|signal| BatchJob::new(path.clone(), signal))
                .map_err(|e| e.to_string());
            (path.clone(), job)
        })
        .collect();

    let mut batch = Vec::new();
    for (path, job) in decoded {
        match job {
            Ok(job) => batch.push(job),
            Err(e) => {
                if json {
                    println!("{}", serde_json::json!({ "path": path, "ok": false, "error": e }));
                } else {
                    println!("{}\tERROR\t{}", path, e);
                }
            }
        }
    }

    let outcomes = detect_batch(
        batch,
        &params,
        &DetectorConfig::default(),
        jobs,
        &CancellationToken::new(),
    )?;

    let mut failed = 0usize;
    for outcome in &outcomes {
        let ok = outcome.is_ok();
        if !ok {
            failed += 1;
        }
        let error = match (&outcome.onsets, &outcome.offsets) {
            (Err(e), _) | (_, Err(e)) => Some(e.to_string()),
            _ => None,
        };
        let onsets = outcome.onsets.as_ref().map(|r| r.times.clone()).unwrap_or_default();
        let offsets = outcome.offsets.as_ref().map(|r| r.times.clone()).unwrap_or_default();

        if json {
            println!(
                "{}",
                serde_json::json!({
                    "path": outcome.name,
                    "ok": ok,
                    "onsets": onsets,
                    "offsets": offsets,
                    "error": error,
                })
            );
        } else if let Some(e) = error {
            println!("{}\tERROR\t{}", outcome.name, e);
        } else {
            let fmt = |ts: &[f64]| {
                ts.iter()
                    .map(|t| format!("{:.4}", t))
                    .collect::<Vec<_>>()
                    .join(",")
            };
            println!("{}\ton=[{}]\toff=[{}]", outcome.name, fmt(&onsets), fmt(&offsets));
        }
    }

    eprintln!(
        "Done: {} files, {} failed, {:.2} s",
        outcomes.len(),
        failed,
        t0.elapsed().as_secs_f64()
    );

    Ok(())
}
