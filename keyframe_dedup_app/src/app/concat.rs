use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use super::{
    ffmpeg::run_ffmpeg,
    video_dir::{list_videos, DUPLICATES_DIR_NAME},
};
use crate::app::*;

pub const FILELIST_NAME: &str = "filelist.txt";
pub const DEFAULT_CONCAT_OUTPUT: &str = "concatenated_video.mp4";

// ffmpeg's concat demuxer quotes with single quotes, and a literal quote is written as '\''
fn concat_entry(file_name: &str) -> String {
    format!("file '{}'", file_name.replace('\'', r"'\''"))
}

/// Names of the videos left in videos_dir once duplicates have been moved out, sorted.
/// exclude is left out as well (typically the output of a previous concatenation).
fn remaining_videos(videos_dir: &Path, video_ext: &str, exclude: Option<&Path>) -> Result<Vec<String>, AppError> {
    let dups_dir = videos_dir.join(DUPLICATES_DIR_NAME);

    let remaining = list_videos(videos_dir, &[video_ext.to_string()])?
        .into_iter()
        .filter(|path| Some(path.as_path()) != exclude)
        .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
        .filter(|name| !dups_dir.join(name).exists())
        .collect();

    Ok(remaining)
}

/// Write `<videos_dir>/filelist.txt` listing every remaining video in the format expected by
/// ffmpeg's concat demuxer. Returns the path of the list and the videos in it.
pub fn write_filelist(
    videos_dir: &Path,
    video_ext: &str,
    exclude: Option<&Path>,
) -> Result<(PathBuf, Vec<String>), AppError> {
    let videos = remaining_videos(videos_dir, video_ext, exclude)?;

    let contents = videos.iter().map(|name| concat_entry(name)).collect::<Vec<_>>().join("\n");
    let filelist_path = videos_dir.join(FILELIST_NAME);
    std::fs::write(&filelist_path, contents).map_err(|e| AppError::io(&filelist_path, e))?;

    info!(target: "concat", "Wrote {} video(s) to {}", videos.len(), filelist_path.display());
    Ok((filelist_path, videos))
}

/// Losslessly join the videos named in filelist_path into output_path.
pub fn concat_videos(filelist_path: &Path, output_path: &Path) -> Result<(), AppError> {
    let args: [&OsStr; 9] = [
        "-f".as_ref(),
        "concat".as_ref(),
        "-safe".as_ref(),
        "0".as_ref(),
        "-i".as_ref(),
        filelist_path.as_os_str(),
        "-c".as_ref(),
        "copy".as_ref(),
        output_path.as_os_str(),
    ];
    run_ffmpeg(&args)?;

    info!(target: "concat", "Videos have been concatenated into {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_filelist_skips_moved_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.mp4", "c.mp4", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join(DUPLICATES_DIR_NAME)).unwrap();
        std::fs::write(dir.path().join("duplicates/c.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("duplicates/d.mp4"), b"").unwrap();

        let (path, videos) = write_filelist(dir.path(), "mp4", None).unwrap();

        assert_eq!(path, dir.path().join(FILELIST_NAME));
        assert_eq!(videos, ["a.mp4", "b.mp4"]);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "file 'a.mp4'\nfile 'b.mp4'");
    }

    #[test]
    fn test_filelist_excludes_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp4", DEFAULT_CONCAT_OUTPUT] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let output = dir.path().join(DEFAULT_CONCAT_OUTPUT);
        let (_, videos) = write_filelist(dir.path(), "mp4", Some(&output)).unwrap();
        assert_eq!(videos, ["a.mp4"]);
    }

    #[test]
    fn test_empty_dir_gives_empty_filelist() {
        let dir = tempfile::tempdir().unwrap();
        let (path, videos) = write_filelist(dir.path(), "mp4", None).unwrap();
        assert!(videos.is_empty());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(concat_entry("it's.mp4"), r"file 'it'\''s.mp4'");
    }
}
