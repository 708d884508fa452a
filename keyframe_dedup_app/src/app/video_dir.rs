use std::path::{Path, PathBuf};

use crate::app::*;

pub const DUPLICATES_DIR_NAME: &str = "duplicates";

pub fn has_ext(path: &Path, exts: &[String]) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => exts.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// The video files directly inside dir, sorted by name. Subdirectories are not searched.
pub fn list_videos(dir: &Path, exts: &[String]) -> Result<Vec<PathBuf>, AppError> {
    if !dir.is_dir() {
        return Err(AppError::DirNotFound(dir.to_path_buf()));
    }

    let mut videos = vec![];
    for entry in std::fs::read_dir(dir).map_err(|e| AppError::io(dir, e))? {
        let path = entry.map_err(|e| AppError::io(dir, e))?.path();
        if path.is_file() && has_ext(&path, exts) {
            videos.push(path);
        }
    }
    videos.sort();

    Ok(videos)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_list_videos() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.MP4", "notes.txt", "c.mkv"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.mp4")).unwrap();

        let videos = list_videos(dir.path(), &["mp4".to_string()]).unwrap();
        let names = videos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a.MP4", "b.mp4"]);
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(list_videos(&missing, &[]), Err(AppError::DirNotFound(p)) if p == missing));
    }
}
