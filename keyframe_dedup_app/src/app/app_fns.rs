use std::{error::Error, io::BufWriter};

use eyre::WrapErr;
use itertools::Itertools;
use keyframe_dedup_lib::*;
use serde::Serialize;

use super::{
    concat::{concat_videos, write_filelist},
    keyframes::extract_keyframes,
    relocate::move_duplicates,
};
use crate::app::*;

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.verbosity);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    match &cfg.command {
        AppCommand::Find(find_cfg) => run_find(find_cfg),
        AppCommand::Extract(extract_cfg) => run_extract(extract_cfg),
        AppCommand::MoveDups(move_cfg) => run_move_dups(move_cfg),
        AppCommand::Concat(concat_cfg) => run_concat(concat_cfg),
    }
}

fn log_progress(progress: Progress) {
    if progress.processed % 100 == 0 || progress.processed == progress.total {
        info!(
            target: "find",
            "Progress: {}/{} keyframes fingerprinted",
            progress.processed,
            progress.total
        );
    }
}

fn run_find(cfg: &FindCfg) -> eyre::Result<()> {
    let match_cfg = MatchCfg::new(cfg.distance_threshold, cfg.match_ratio).map_err(AppError::from)?;
    let pipeline_cfg = PipelineCfg::new(match_cfg)
        .with_policy(cfg.policy)
        .with_max_in_flight(cfg.max_in_flight)
        .map_err(AppError::from)?
        .with_frame_exts(cfg.frame_exts.iter().cloned());

    let report = find_duplicates_with_progress(&cfg.keyframes_dir, &pipeline_cfg, log_progress)
        .map_err(AppError::from)
        .wrap_err_with(|| format!("Failed to search {}", cfg.keyframes_dir.display()))?;

    report.groups().write_json(&cfg.output_path).map_err(AppError::from)?;

    let num_dups = report.groups().duplicates().count();
    info!(
        target: "find",
        "Found {} duplicate(s) in {} group(s). Written to {}",
        num_dups,
        report.groups().len(),
        cfg.output_path.display()
    );

    if !report.skipped().is_empty() {
        warn!(
            target: "find",
            "{} video(s) could not be checked: {}",
            report.skipped().len(),
            report.skipped().iter().map(SkippedAsset::asset_id).join(", ")
        );
    }

    print_report(&report, cfg.output_format)
}

#[allow(clippy::print_stdout)]
fn print_report(report: &DedupReport, format: OutputFormat) -> eyre::Result<()> {
    match format {
        OutputFormat::Normal => {
            for group in report.groups().iter().filter(|g| g.len() > 0) {
                println!("{}", group.root());
                for dup in group.duplicates() {
                    println!("{}", dup);
                }
                println!();
            }
        }

        OutputFormat::Json => {
            //Struct only exists to be serialized.
            #[derive(Serialize)]
            struct JsonStruct<'a> {
                groups: &'a DuplicateGroups,
                skipped: &'a [SkippedAsset],
            }

            let stdout = BufWriter::new(std::io::stdout());
            serde_json::to_writer_pretty(
                stdout,
                &JsonStruct {
                    groups: report.groups(),
                    skipped: report.skipped(),
                },
            )
            .wrap_err("Failed to print results")?;
            println!();
        }
    }

    Ok(())
}

fn run_extract(cfg: &ExtractCfg) -> eyre::Result<()> {
    let summary = extract_keyframes(cfg)?;

    info!(
        target: "extract",
        "Extracted keyframes from {} video(s) into {} ({} already present, {} failed)",
        summary.extracted.len(),
        cfg.keyframes_dir.display(),
        summary.already_present.len(),
        summary.failed.len()
    );

    Ok(())
}

fn run_move_dups(cfg: &MoveDupsCfg) -> eyre::Result<()> {
    let groups = DuplicateGroups::read_json(&cfg.groups_path).map_err(AppError::from)?;
    let summary = move_duplicates(&cfg.videos_dir, &groups, &cfg.video_ext)?;

    info!(
        target: "move-dups",
        "Moved {} duplicate(s), {} not found",
        summary.moved.len(),
        summary.missing.len()
    );

    Ok(())
}

fn run_concat(cfg: &ConcatCfg) -> eyre::Result<()> {
    let (filelist_path, videos) = write_filelist(&cfg.videos_dir, &cfg.video_ext, Some(&cfg.output_path))?;

    if !cfg.run_ffmpeg {
        return Ok(());
    }

    if videos.is_empty() {
        warn!(target: "concat", "No videos left to concatenate");
        return Ok(());
    }

    concat_videos(&filelist_path, &cfg.output_path)
        .wrap_err_with(|| format!("Failed to concatenate videos listed in {}", filelist_path.display()))
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}
