use std::{
    collections::HashSet,
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use thiserror::Error;

/// One cluster root and the assets recorded as its duplicates, in the order they were discovered.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct DuplicateGroup {
    root: String,
    duplicates: Vec<String>,
}

impl DuplicateGroup {
    pub fn new(root: impl Into<String>, duplicates: impl IntoIterator<Item = String>) -> Self {
        Self {
            root: root.into(),
            duplicates: duplicates.into_iter().collect(),
        }
    }

    /// The asset chosen to represent this group.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The assets judged duplicates of the root.
    pub fn duplicates(&self) -> impl Iterator<Item = &str> {
        self.duplicates.iter().map(String::as_str)
    }

    /// The number of duplicates (not counting the root).
    pub fn len(&self) -> usize {
        self.duplicates.len()
    }

    /// The root followed by every duplicate.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.root.as_str()).chain(self.duplicates())
    }
}

/// The result of duplicate clustering: a mapping from each cluster root to its duplicates.
///
/// Every clustered asset appears exactly once, either as a root (possibly with no duplicates)
/// or inside exactly one root's duplicate list. Roots are kept in the order the resolver
/// processed them.
///
/// Serializes as a JSON object whose keys are the roots (in processing order) and whose values
/// are the lists of duplicates (in discovery order).
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct DuplicateGroups {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateGroups {
    pub fn new(groups: impl IntoIterator<Item = DuplicateGroup>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    /// The number of groups (equal to the number of roots).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter()
    }

    pub fn roots(&self) -> impl Iterator<Item = &str> + Clone {
        self.groups.iter().map(DuplicateGroup::root)
    }

    /// Every asset recorded as somebody's duplicate. These are the assets a downstream consumer
    /// may discard.
    pub fn duplicates(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flat_map(DuplicateGroup::duplicates)
    }

    /// The group rooted at `root`, if any.
    pub fn get(&self, root: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.root == root)
    }

    /// Whether the asset appears anywhere, as a root or as a duplicate.
    pub fn contains_asset(&self, asset_id: &str) -> bool {
        self.groups.iter().any(|g| g.members().any(|m| m == asset_id))
    }

    pub fn to_json_string(&self) -> Result<String, GroupsIoErrorKind> {
        serde_json::to_string_pretty(self).map_err(|e| GroupsIoErrorKind::Json {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// Write the groups as UTF-8 JSON with two-space indentation.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), GroupsIoErrorKind> {
        let path = path.as_ref();
        let io_err = |e: std::io::Error| GroupsIoErrorKind::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| GroupsIoErrorKind::Json {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        writer.flush().map_err(io_err)
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self, GroupsIoErrorKind> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GroupsIoErrorKind::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| GroupsIoErrorKind::Json {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Error type for reading and writing [DuplicateGroups] files.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GroupsIoErrorKind {
    #[error("I/O error at {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Malformed duplicate groups at {path:?}: {reason}")]
    Json { path: PathBuf, reason: String },
}

impl Serialize for DuplicateGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.root, &group.duplicates)?;
        }
        map.end()
    }
}

struct DuplicateGroupsVisitor;

impl<'de> Visitor<'de> for DuplicateGroupsVisitor {
    type Value = DuplicateGroups;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from asset id to a list of duplicate asset ids")
    }

    //keep the file's key order, and refuse files where an asset appears twice.
    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut seen = HashSet::new();
        let mut groups = vec![];

        while let Some((root, duplicates)) = access.next_entry::<String, Vec<String>>()? {
            for asset_id in std::iter::once(&root).chain(duplicates.iter()) {
                if !seen.insert(asset_id.clone()) {
                    return Err(de::Error::custom(format!("asset listed more than once: {}", asset_id)));
                }
            }
            groups.push(DuplicateGroup { root, duplicates });
        }

        Ok(DuplicateGroups { groups })
    }
}

impl<'de> Deserialize<'de> for DuplicateGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DuplicateGroupsVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> DuplicateGroups {
        DuplicateGroups::new([
            DuplicateGroup::new("zebra", vec!["apple".to_string(), "mango".to_string()]),
            DuplicateGroup::new("banana", vec![]),
        ])
    }

    #[test]
    fn test_json_shape_keeps_processing_order() {
        let expected = "{\n  \"zebra\": [\n    \"apple\",\n    \"mango\"\n  ],\n  \"banana\": []\n}";
        assert_eq!(sample().to_json_string().unwrap(), expected);
    }

    #[test]
    fn test_read_back_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duplicates.json");

        sample().write_json(&path).unwrap();
        let loaded = DuplicateGroups::read_json(&path).unwrap();

        assert_eq!(loaded, sample());
        assert_eq!(loaded.roots().collect::<Vec<_>>(), ["zebra", "banana"]);
    }

    #[test]
    fn test_rejects_assets_listed_twice() {
        let json = r#"{"a": ["b"], "c": ["b"]}"#;
        assert!(serde_json::from_str::<DuplicateGroups>(json).is_err());

        let json = r#"{"a": ["a"]}"#;
        assert!(serde_json::from_str::<DuplicateGroups>(json).is_err());
    }

    #[test]
    fn test_queries() {
        let groups = sample();
        assert_eq!(groups.len(), 2);
        assert!(groups.contains_asset("mango"));
        assert!(groups.contains_asset("banana"));
        assert!(!groups.contains_asset("kiwi"));
        assert_eq!(groups.duplicates().collect::<Vec<_>>(), ["apple", "mango"]);
        assert_eq!(groups.get("zebra").map(DuplicateGroup::len), Some(2));
        assert!(groups.get("apple").is_none());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DuplicateGroups::read_json(dir.path().join("nope.json")),
            Err(GroupsIoErrorKind::Io { .. })
        ));
    }
}
