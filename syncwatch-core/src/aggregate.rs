//! Collapsing a burst of changed paths into the smallest set of rescan requests
//!
//! Every changed path adds weight to the directories above it. A directory
//! whose accumulated weight crosses `dir_vs_files` is reported instead of the
//! individual entries below it, so a burst of edits in one subtree turns into
//! a single rescan of that subtree. Weight already claimed by a child
//! directory that is reported on its own does not push its parent over.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Weight above which a directory is reported instead of its entries
pub const DEFAULT_DIR_VS_FILES: u64 = 10;

/// How one tracked path is decided to contain another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorMatch {
    /// Whole path components must match (`/data/ab` does not contain `/data/abc`)
    #[default]
    Segment,
    /// Loose substring containment, kept for compatibility with older relays
    Substring,
}

impl AncestorMatch {
    /// Whether `ancestor` is `path` itself or one of its parents
    pub fn covers(self, ancestor: &Path, path: &Path) -> bool {
        match self {
            Self::Segment => path.starts_with(ancestor),
            Self::Substring => path.to_string_lossy().contains(ancestor.to_string_lossy().as_ref()),
        }
    }
}

/// Score of one tracked path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathScore {
    /// A changed path that is reported as-is and never merged further
    Leaf,
    /// A directory with the accumulated weight of the changes below it
    Directory(u64),
}

/// Paths chosen for one flush, relative to the watched root
///
/// An empty entry means the whole root. No entry is an ancestor of another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportSet {
    entries: Vec<String>,
}

impl ReportSet {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.entries.iter()
    }
}

impl IntoIterator for ReportSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReportSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Scores a batch of changed paths for one watched root and picks what to report
#[derive(Debug, Clone)]
pub struct Aggregator {
    root: PathBuf,
    dir_vs_files: u64,
    ancestor_match: AncestorMatch,
}

impl Aggregator {
    /// Create an aggregator for paths below `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: clean(root.as_ref()),
            dir_vs_files: DEFAULT_DIR_VS_FILES,
            ancestor_match: AncestorMatch::default(),
        }
    }

    /// Set the directory-vs-files threshold
    pub fn with_threshold(mut self, dir_vs_files: u64) -> Self {
        self.dir_vs_files = dir_vs_files;
        self
    }

    pub fn with_ancestor_match(mut self, ancestor_match: AncestorMatch) -> Self {
        self.ancestor_match = ancestor_match;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Score every changed path and every directory above it
    ///
    /// A path ending in a separator is a directory that changed itself and
    /// weighs `dir_vs_files`; any other path weighs 1 towards its parent.
    /// A path is counted once per batch, as a directory change if any of its
    /// occurrences was marked as one.
    pub fn score<S: AsRef<str>>(&self, batch: &[S]) -> BTreeMap<PathBuf, PathScore> {
        let mut changes: Vec<(PathBuf, bool)> = batch
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                (clean(Path::new(raw)), is_directory_marker(raw))
            })
            .collect();
        // Component order puts every directory right before its descendants
        changes.sort();
        changes.dedup_by(|later, kept| {
            let same = later.0 == kept.0;
            if same {
                kept.1 |= later.1;
            }
            same
        });

        let mut tracked = BTreeMap::new();
        for (path, is_dir) in changes {
            let (dir, weight) = if is_dir {
                (path.clone(), self.dir_vs_files)
            } else {
                (path.parent().map(Path::to_path_buf).unwrap_or_default(), 1)
            };
            self.add_weight(&mut tracked, &dir, weight);
            tracked.insert(path, PathScore::Leaf);
        }
        tracked
    }

    fn add_weight(&self, tracked: &mut BTreeMap<PathBuf, PathScore>, dir: &Path, weight: u64) {
        if self.ancestor_match == AncestorMatch::Substring {
            for (key, score) in tracked.iter_mut() {
                if let PathScore::Directory(total) = score {
                    if self.ancestor_match.covers(key, dir) {
                        *total += weight;
                    }
                }
            }
        }

        for ancestor in dir.ancestors().take_while(|a| a.starts_with(&self.root)) {
            match tracked.entry(ancestor.to_path_buf()) {
                Entry::Vacant(entry) => {
                    entry.insert(PathScore::Directory(weight));
                }
                Entry::Occupied(mut entry) => {
                    // Substring mode already credited every covering key above
                    if self.ancestor_match == AncestorMatch::Segment {
                        if let PathScore::Directory(total) = entry.get_mut() {
                            *total += weight;
                        }
                    }
                }
            }
        }
    }

    /// Collapse a batch of changed paths into the report set for one flush
    pub fn collapse<S: AsRef<str>>(&self, batch: &[S]) -> ReportSet {
        let tracked = self.score(batch);

        // A directory with a single tracked child only forwards that child's
        // weight; reporting the child covers the same changes. Weight from
        // child directories that cross the threshold on their own is claimed
        // by them and does not count towards the parent.
        let mut children: HashMap<&Path, usize> = HashMap::new();
        let mut claimed: HashMap<&Path, u64> = HashMap::new();
        for (key, score) in &tracked {
            if let Some(parent) = key.parent() {
                *children.entry(parent).or_default() += 1;
                if let PathScore::Directory(weight) = *score {
                    if weight > self.dir_vs_files {
                        *claimed.entry(parent).or_default() += weight;
                    }
                }
            }
        }

        let mut selected: Option<&Path> = None;
        let mut entries = Vec::new();
        for (key, score) in &tracked {
            if selected.is_some_and(|last| self.ancestor_match.covers(last, key)) {
                continue;
            }
            if let PathScore::Directory(weight) = *score {
                let taken = claimed.get(key.as_path()).copied().unwrap_or_default();
                if weight.saturating_sub(taken) <= self.dir_vs_files {
                    continue;
                }
                if children.get(key.as_path()).copied().unwrap_or_default() == 1 {
                    continue;
                }
            }
            selected = Some(key);
            entries.push(self.relative(key));
        }

        ReportSet { entries }
    }

    fn relative(&self, path: &Path) -> String {
        let sub = path.strip_prefix(&self.root).unwrap_or(path);
        sub.to_string_lossy().trim_start_matches(['/', MAIN_SEPARATOR]).to_string()
    }
}

/// Drop `.` segments plus repeated and trailing separators
fn clean(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

fn is_directory_marker(raw: &str) -> bool {
    raw.len() > 1 && (raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR))
}
