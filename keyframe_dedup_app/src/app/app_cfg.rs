use std::path::PathBuf;

use keyframe_dedup_lib::ClusterPolicy;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindCfg {
    pub keyframes_dir: PathBuf,
    pub output_path: PathBuf,
    pub distance_threshold: u32,
    pub match_ratio: f64,
    pub max_in_flight: usize,
    pub frame_exts: Vec<String>,
    pub policy: ClusterPolicy,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractCfg {
    pub videos_dir: PathBuf,
    pub keyframes_dir: PathBuf,
    pub video_exts: Vec<String>,
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDupsCfg {
    pub videos_dir: PathBuf,
    pub groups_path: PathBuf,
    pub video_ext: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatCfg {
    pub videos_dir: PathBuf,
    pub output_path: PathBuf,
    pub video_ext: String,
    pub run_ffmpeg: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Find(FindCfg),
    Extract(ExtractCfg),
    MoveDups(MoveDupsCfg),
    Concat(ConcatCfg),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub command: AppCommand,
    pub verbosity: ReportVerbosity,
}
