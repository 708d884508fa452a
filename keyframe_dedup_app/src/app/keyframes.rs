use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use itertools::Itertools;
use rayon::prelude::*;

use super::{ffmpeg::run_ffmpeg, video_dir::list_videos};
use crate::app::*;

pub const KEYFRAME_PATTERN: &str = "keyframe_%03d.jpg";
pub const DEFAULT_KEYFRAMES_DIR_NAME: &str = "keyframes";

#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub extracted: Vec<PathBuf>,
    pub already_present: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, AppError)>,
}

struct ExtractJob {
    video: PathBuf,
    out_dir: PathBuf,
}

/// Keyframes of each video land in a directory named after the video's file stem, so that the
/// directory name becomes the video's asset ID.
fn keyframe_dir_for(keyframes_dir: &Path, video: &Path) -> Option<PathBuf> {
    video.file_stem().map(|stem| keyframes_dir.join(stem))
}

fn ffmpeg_extract_args(video: &Path, out_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), video.into()];
    args.extend(["-vf", "select='eq(pict_type,PICT_TYPE_I)'", "-vsync", "vfr"].map(OsString::from));
    args.push(out_dir.join(KEYFRAME_PATTERN).into());
    args
}

struct ExtractPlan {
    jobs: Vec<ExtractJob>,
    already_present: Vec<PathBuf>,
    conflicts: Vec<(PathBuf, AppError)>,
}

//videos whose keyframe directory already exists are not extracted again. Videos that differ only
//by extension would write into the same directory, so none of them are extracted.
fn plan_extraction(cfg: &ExtractCfg) -> Result<ExtractPlan, AppError> {
    let mut by_out_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for video in list_videos(&cfg.videos_dir, &cfg.video_exts)? {
        let Some(out_dir) = keyframe_dir_for(&cfg.keyframes_dir, &video) else {
            continue;
        };
        by_out_dir.entry(out_dir).or_default().push(video);
    }

    let mut plan = ExtractPlan {
        jobs: vec![],
        already_present: vec![],
        conflicts: vec![],
    };

    for (out_dir, mut videos) in by_out_dir {
        if videos.len() > 1 {
            let names = videos.iter().map(|v| v.display()).join(", ");
            for video in videos {
                let e = AppError::SharedKeyframeDir {
                    dir: out_dir.clone(),
                    videos: names.clone(),
                };
                plan.conflicts.push((video, e));
            }
            continue;
        }

        let Some(video) = videos.pop() else {
            continue;
        };
        if out_dir.exists() {
            plan.already_present.push(video);
        } else {
            plan.jobs.push(ExtractJob { video, out_dir });
        }
    }

    Ok(plan)
}

fn extract_one(job: &ExtractJob) -> Result<(), AppError> {
    std::fs::create_dir_all(&job.out_dir).map_err(|e| AppError::io(&job.out_dir, e))?;

    let args = ffmpeg_extract_args(&job.video, &job.out_dir);
    let args = args.iter().map(OsString::as_os_str).collect::<Vec<&OsStr>>();

    if let Err(e) = run_ffmpeg(&args) {
        //a half-filled directory would be mistaken for a finished one on the next run.
        if let Err(rm_err) = std::fs::remove_dir_all(&job.out_dir) {
            warn!(target: "extract", "Failed to clean up {}: {}", job.out_dir.display(), rm_err);
        }
        return Err(e.into());
    }

    Ok(())
}

/// Sample the keyframes of every video in cfg.videos_dir into one directory per video under
/// cfg.keyframes_dir, running at most cfg.max_in_flight ffmpeg processes at once.
///
/// A failure to extract one video does not stop the others. Failures are listed in the summary.
pub fn extract_keyframes(cfg: &ExtractCfg) -> Result<ExtractSummary, AppError> {
    let ExtractPlan {
        jobs,
        already_present,
        conflicts,
    } = plan_extraction(cfg)?;

    for video in &already_present {
        debug!(target: "extract", "Keyframes already present for {}", video.display());
    }
    info!(target: "extract", "Processing {} videos...", jobs.len());

    std::fs::create_dir_all(&cfg.keyframes_dir).map_err(|e| AppError::io(&cfg.keyframes_dir, e))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.max_in_flight.max(1))
        .thread_name(|idx| format!("extract-{}", idx))
        .build()
        .map_err(|e| AppError::WorkerPool(e.to_string()))?;

    let total = jobs.len();
    let finished = AtomicUsize::new(0);

    let results = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let result = extract_one(job);
                let finished = finished.fetch_add(1, Ordering::SeqCst) + 1;
                info!(target: "extract", "Progress: {}/{} video keyframes extracted", finished, total);
                result
            })
            .collect::<Vec<_>>()
    });

    for (video, e) in &conflicts {
        warn!(target: "extract", "Not extracting keyframes from {}: {}", video.display(), e);
    }

    let mut summary = ExtractSummary {
        already_present,
        failed: conflicts,
        ..Default::default()
    };
    for (job, result) in jobs.into_iter().zip(results) {
        match result {
            Ok(()) => summary.extracted.push(job.video),
            Err(e) => {
                warn!(target: "extract", "Failed to extract keyframes from {}: {}", job.video.display(), e);
                summary.failed.push((job.video, e));
            }
        }
    }

    Ok(summary)
}
