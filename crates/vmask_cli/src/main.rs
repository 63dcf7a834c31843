//! `video-mask`: blur a word wherever it appears in a screen recording.

mod cli;
mod progress;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use vmask_core::config::{ConfigManager, ConfigSection};
use vmask_core::logging::{init_tracing, init_tracing_with_file, LogConfig, LogLevel};
use vmask_core::ocr::TesseractEngine;
use vmask_core::orchestrator::{MaskRunner, RunResult};
use vmask_core::tools::{SystemExecutor, ToolExecutor};

use crate::cli::CliArgs;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<bool> {
    let args = CliArgs::parse();

    let mut config = ConfigManager::new(&args.config);
    config
        .load_or_create()
        .with_context(|| format!("loading {}", args.config.display()))?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let _guard = match config.ensure_dirs_exist() {
        Ok(()) => Some(init_tracing_with_file(level, &config.logs_folder())),
        Err(e) => {
            init_tracing(level);
            tracing::warn!("Log folder unavailable, logging to stderr only: {}", e);
            None
        }
    };
    tracing::debug!("video-mask {} using {}", vmask_core::version(), args.config.display());

    let mut settings = config.settings().clone();
    args.apply_overrides(&mut settings);
    let (input, output) = args.resolve_paths(&settings)?;

    if args.remember {
        let paths = &mut config.settings_mut().paths;
        paths.last_input_video = input.to_string_lossy().to_string();
        paths.last_output_video = output.to_string_lossy().to_string();
        config
            .update_section(ConfigSection::Paths)
            .context("saving remembered paths")?;
    }

    let executor: Arc<dyn ToolExecutor> = Arc::new(SystemExecutor);
    let engine = Arc::new(TesseractEngine::from_settings(
        Arc::clone(&executor),
        &settings.ocr,
        &settings.tools,
    ));

    let mut log_config = LogConfig::from_settings(&settings.logging);
    if args.verbose {
        log_config = log_config.verbose();
    }
    let runner = MaskRunner::new(settings.clone(), config.logs_folder(), executor, engine)
        .with_log_config(log_config);

    let bar = progress::step_bar();
    let job = settings.mask_job(input, output);
    let result = runner.run(
        job,
        Some(progress::log_callback(&bar)),
        Some(progress::progress_callback(&bar)),
    );
    bar.finish_and_clear();

    print_summary(&result);
    Ok(result.success)
}

fn print_summary(result: &RunResult) {
    println!();
    println!("Timings:");
    for timing in &result.state.timings {
        println!("  {:<8} {:>8.2}s", timing.step, timing.seconds());
    }
    let total: f64 = result.state.timings.iter().map(|t| t.seconds()).sum();
    println!("  {:<8} {:>8.2}s", "Total", total);

    if let Some(ref analysis) = result.state.analysis {
        println!();
        println!(
            "Frames: {} analyzed, {} with matches, {} region(s)",
            analysis.frames.len(),
            analysis.frames_with_regions(),
            analysis.total_regions()
        );
        for frame in analysis.detection_failures() {
            println!("  detection failed: {}", frame.filename);
        }
    }
    if let Some(ref masking) = result.state.masking {
        println!(
            "Masked {}, passed through {}, skipped {}, failed {}",
            masking.masked(),
            masking.passed_through(),
            masking.skipped(),
            masking.failed()
        );
    }
    for failure in &result.state.tool_failures {
        match failure.frame {
            Some(ref frame) => {
                println!("  {} failed on {}: {}", failure.step, frame, failure.message)
            }
            None => println!("  {} failed: {}", failure.step, failure.message),
        }
    }

    println!();
    match (&result.output_path, &result.error) {
        (Some(path), _) => println!("Output: {}", path.display()),
        (None, Some(error)) => println!("Failed: {}", error),
        (None, None) => println!("No output video was written"),
    }
    if let Some(ref path) = result.log_path {
        println!("Log:    {}", path.display());
    }
    if let Some(ref path) = result.report_path {
        println!("Report: {}", path.display());
    }
}
