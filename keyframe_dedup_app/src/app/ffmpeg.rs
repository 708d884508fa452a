use std::{
    ffi::OsStr,
    process::{Command, Stdio},
};

use thiserror::Error;

/// Various causes of failure when running ffmpeg.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FfmpegError {
    /// ffmpeg was not found. Make sure it is installed and can be found on the command line.
    #[error("ffmpeg not found. Make sure ffmpeg is installed and visible on the command line")]
    FfmpegNotFound,

    /// Io error occurred while executing ffmpeg
    #[error("ffmpeg IO error: {0}")]
    Io(String),

    /// ffmpeg returned a nonzero exit code. ffmpeg sometimes prints very long error messages, so
    /// only the tail of stderr is kept.
    #[error("Internal ffmpeg failure: {0}")]
    FfmpegInternal(String),
}

const MAX_ERR_MSG_CHARS: usize = 500;

/// Run ffmpeg to completion with the given args.
pub fn run_ffmpeg(args: &[&OsStr]) -> Result<(), FfmpegError> {
    use FfmpegError::*;

    trace!(target: "ffmpeg", "ffmpeg {}", args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "));

    let output = Command::new("ffmpeg")
        .arg("-nostdin")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            //by far the most likely cause is that ffmpeg is not installed.
            std::io::ErrorKind::NotFound => FfmpegNotFound,
            _ => Io(format!("{:?}", e.kind())),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(FfmpegInternal(truncate_err_msg(&output.stderr)))
    }
}

//ffmpeg prints its banner first and the actual error last.
fn truncate_err_msg(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    let skip = text.chars().count().saturating_sub(MAX_ERR_MSG_CHARS);
    text.chars().skip(skip).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_truncate_keeps_the_tail() {
        let mut stderr = "x".repeat(2 * MAX_ERR_MSG_CHARS).into_bytes();
        stderr.extend_from_slice(b"input.mp4: No such file or directory\n");

        let msg = truncate_err_msg(&stderr);
        assert_eq!(msg.chars().count(), MAX_ERR_MSG_CHARS);
        assert!(msg.ends_with("No such file or directory"));
    }

    #[test]
    fn test_short_messages_are_kept_whole() {
        assert_eq!(truncate_err_msg(b"bad input\n"), "bad input");
    }
}
