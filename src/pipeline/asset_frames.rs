use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::*;

/// One source video, identified by the name of its keyframe directory, and its frames in
/// sequence order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssetFrames {
    asset_id: String,
    frames: Vec<PathBuf>,
}

impl AssetFrames {
    pub fn new(asset_id: impl Into<String>, frames: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            asset_id: asset_id.into(),
            frames: frames.into_iter().collect(),
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> PipelineErrorKind + '_ {
    move |e| PipelineErrorKind::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Find every asset under keyframes_dir: one per sub-directory, holding the files whose
/// extension (compared case-insensitively) is one of the configured frame extensions.
///
/// Assets are returned sorted by ID and frames sorted by file name. Plain files directly inside
/// keyframes_dir are ignored. A sub-directory whose name is not valid UTF-8 cannot be given an
/// ID, and is returned as a [SkippedAsset] with [SkipReason::InvalidId] instead.
pub fn discover_assets(
    keyframes_dir: impl AsRef<Path>,
    cfg: &PipelineCfg,
) -> Result<(Vec<AssetFrames>, Vec<SkippedAsset>), PipelineErrorKind> {
    let keyframes_dir = keyframes_dir.as_ref();

    let mut assets = vec![];
    let mut skipped = vec![];
    for entry in fs::read_dir(keyframes_dir).map_err(io_err(keyframes_dir))? {
        let entry = entry.map_err(io_err(keyframes_dir))?;
        let asset_dir = entry.path();
        if !asset_dir.is_dir() {
            continue;
        }

        let asset_id = match entry.file_name().into_string() {
            Ok(asset_id) => asset_id,
            Err(raw_name) => {
                warn!(target: "pipeline", "Skipping {}: directory name is not valid UTF-8", asset_dir.display());
                skipped.push(SkippedAsset::new(raw_name.to_string_lossy(), SkipReason::InvalidId));
                continue;
            }
        };

        let frames = discover_frames(&asset_dir, cfg.frame_exts())?;
        trace!(target: "pipeline", "found asset {} with {} frame(s)", asset_id, frames.len());

        assets.push(AssetFrames::new(asset_id, frames));
    }

    assets.sort();
    skipped.sort_by(|a, b| a.asset_id().cmp(b.asset_id()));
    Ok((assets, skipped))
}

fn discover_frames(asset_dir: &Path, frame_exts: &[String]) -> Result<Vec<PathBuf>, PipelineErrorKind> {
    let is_frame = |path: &Path| {
        path.extension()
            .map(|ext| ext.to_string_lossy())
            .map_or(false, |ext| frame_exts.iter().any(|want| want.eq_ignore_ascii_case(&ext)))
    };

    let mut frames = vec![];
    for entry in fs::read_dir(asset_dir).map_err(io_err(asset_dir))? {
        let path = entry.map_err(io_err(asset_dir))?.path();
        if path.is_file() && is_frame(&path) {
            frames.push(path);
        }
    }

    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn test_discovery_order_and_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir(root.join("b_video")).unwrap();
        fs::create_dir(root.join("a_video")).unwrap();
        fs::write(root.join("stray.jpg"), b"").unwrap();

        fs::write(root.join("a_video/keyframe_002.jpg"), b"").unwrap();
        fs::write(root.join("a_video/keyframe_001.JPG"), b"").unwrap();
        fs::write(root.join("a_video/notes.txt"), b"").unwrap();

        let (assets, skipped) = discover_assets(root, &PipelineCfg::default()).unwrap();
        assert!(skipped.is_empty());

        assert_eq!(
            assets.iter().map(AssetFrames::asset_id).collect::<Vec<_>>(),
            ["a_video", "b_video"]
        );
        assert_eq!(
            assets[0].frames(),
            [
                root.join("a_video/keyframe_001.JPG"),
                root.join("a_video/keyframe_002.jpg")
            ]
        );
        assert_eq!(assets[1].len(), 0);
    }

    #[test]
    fn test_missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_assets(dir.path().join("missing"), &PipelineCfg::default());
        assert!(matches!(result, Err(PipelineErrorKind::Io { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_dir_names_are_skipped_not_merged() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        //both names would read as "clip\u{FFFD}" if converted lossily
        for raw_name in [&b"clip\xff"[..], &b"clip\xfe"[..]] {
            let asset_dir = root.join(OsStr::from_bytes(raw_name));
            fs::create_dir(&asset_dir).unwrap();
            fs::write(asset_dir.join("keyframe_001.jpg"), b"").unwrap();
        }
        fs::create_dir(root.join("clip_ok")).unwrap();

        let (assets, skipped) = discover_assets(root, &PipelineCfg::default()).unwrap();

        assert_eq!(
            assets.iter().map(AssetFrames::asset_id).collect::<Vec<_>>(),
            ["clip_ok"]
        );
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|s| *s.reason() == SkipReason::InvalidId));
    }
}
