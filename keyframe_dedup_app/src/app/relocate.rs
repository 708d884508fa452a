use std::path::{Path, PathBuf};

use keyframe_dedup_lib::DuplicateGroups;

use super::video_dir::DUPLICATES_DIR_NAME;
use crate::app::*;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MoveSummary {
    pub moved: Vec<String>,
    pub missing: Vec<String>,
}

fn video_file_name(asset_id: &str, video_ext: &str) -> String {
    format!("{}.{}", asset_id, video_ext)
}

/// Move the video of every duplicate in groups into `<videos_dir>/duplicates/`. Roots stay where
/// they are.
///
/// Each asset appears in at most one group, so every duplicate is moved at most once. Duplicates
/// whose video is no longer in videos_dir (for example because an earlier run already moved it)
/// are reported as missing.
pub fn move_duplicates(videos_dir: &Path, groups: &DuplicateGroups, video_ext: &str) -> Result<MoveSummary, AppError> {
    if !videos_dir.is_dir() {
        return Err(AppError::DirNotFound(videos_dir.to_path_buf()));
    }

    let dups_dir = videos_dir.join(DUPLICATES_DIR_NAME);
    std::fs::create_dir_all(&dups_dir).map_err(|e| AppError::io(&dups_dir, e))?;

    let mut summary = MoveSummary::default();
    for group in groups {
        for dup in group.duplicates() {
            let file_name = video_file_name(dup, video_ext);
            let src_path = videos_dir.join(&file_name);

            if !src_path.is_file() {
                warn!(target: "move-dups", "Not moving {}: {} not found", dup, src_path.display());
                summary.missing.push(dup.to_string());
                continue;
            }

            let dst_path: PathBuf = dups_dir.join(&file_name);
            std::fs::rename(&src_path, &dst_path).map_err(|e| AppError::io(&src_path, e))?;
            info!(target: "move-dups", "Moved {} to duplicates (duplicate of {})", dup, group.root());
            summary.moved.push(dup.to_string());
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod test {
    use keyframe_dedup_lib::DuplicateGroup;

    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }

    #[test]
    fn test_moves_duplicates_and_keeps_roots() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["A.mp4", "B.mp4", "C.mp4", "D.mp4"]);

        let groups = DuplicateGroups::new([
            DuplicateGroup::new("A", ["B".to_string(), "C".to_string()]),
            DuplicateGroup::new("D", Vec::new()),
        ]);
        let summary = move_duplicates(dir.path(), &groups, "mp4").unwrap();

        assert_eq!(summary.moved, ["B", "C"]);
        assert!(summary.missing.is_empty());

        assert!(dir.path().join("A.mp4").is_file());
        assert!(dir.path().join("D.mp4").is_file());
        assert!(!dir.path().join("B.mp4").exists());
        assert_eq!(std::fs::read(dir.path().join("duplicates/B.mp4")).unwrap(), b"B.mp4");
        assert!(dir.path().join("duplicates/C.mp4").is_file());
    }

    #[test]
    fn test_missing_videos_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["A.mp4", "C.mp4"]);

        let groups = DuplicateGroups::new([DuplicateGroup::new("A", ["B".to_string(), "C".to_string()])]);
        let summary = move_duplicates(dir.path(), &groups, "mp4").unwrap();

        assert_eq!(
            summary,
            MoveSummary {
                moved: vec!["C".to_string()],
                missing: vec!["B".to_string()],
            }
        );
    }

    #[test]
    fn test_rerun_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["A.mp4", "B.mp4"]);
        let groups = DuplicateGroups::new([DuplicateGroup::new("A", ["B".to_string()])]);

        move_duplicates(dir.path(), &groups, "mp4").unwrap();
        let again = move_duplicates(dir.path(), &groups, "mp4").unwrap();

        assert!(again.moved.is_empty());
        assert_eq!(again.missing, ["B"]);
        assert!(dir.path().join("duplicates/B.mp4").is_file());
    }
}
