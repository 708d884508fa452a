use std::path::PathBuf;

use keyframe_dedup_lib::*;
use thiserror::Error;

use super::ffmpeg::FfmpegError;

#[derive(Error, Debug)]
pub enum AppError {
    /////////////////////////////////
    //finding duplicates
    #[error(transparent)]
    Pipeline(#[from] PipelineErrorKind),

    #[error("Invalid search configuration: {0}")]
    Cfg(#[from] CfgErrorKind),

    #[error("Duplicates file error: {0}")]
    Groups(#[from] GroupsIoErrorKind),

    /////////////////////////////////
    //external tools
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("Failed to start worker threads: {0}")]
    WorkerPool(String),

    /////////////////////////////////
    //filesystem
    #[error("Filesystem error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {}", .0.display())]
    DirNotFound(PathBuf),

    #[error("{videos} would share keyframe directory {}", .dir.display())]
    SharedKeyframeDir { dir: PathBuf, videos: String },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub fn print_error_and_quit(e: eyre::Report) -> ! {
    #[allow(clippy::print_stderr)]
    let () = eprintln!("{:?}", e);
    std::process::exit(1);
}
