//! File naming under the data root
//!
//! ```text
//! <root>/<split>_initial_state.txt
//! <root>/<split>/<id>.txt                       raw trajectory
//! <root>/<split>/{input,output}_<id>.txt        Stage A
//! <root>/{input,output}_<split>_concatenated.txt  Stage B
//! ```
//!
//! Stage A writes a disjoint file set per `(split, id)` and Stage B per
//! `(split, kind)`, so no two tasks ever touch the same path.

use std::path::{Path, PathBuf};

use crate::config::{Split, TableKind};

/// Path builder rooted at the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Create a layout rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one split's records
    #[must_use]
    pub fn split_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.as_str())
    }

    /// Raw trajectory `<split>/<id>.txt`
    #[must_use]
    pub fn raw_path(&self, split: Split, id: usize) -> PathBuf {
        self.split_dir(split).join(format!("{id}.txt"))
    }

    /// Derived table `<split>/<kind>_<id>.txt`
    #[must_use]
    pub fn derived_path(&self, split: Split, kind: TableKind, id: usize) -> PathBuf {
        self.split_dir(split).join(format!("{kind}_{id}.txt"))
    }

    /// Stage B output `<kind>_<split>_concatenated.txt`
    #[must_use]
    pub fn concatenated_path(&self, kind: TableKind, split: Split) -> PathBuf {
        self.root.join(format!("{kind}_{split}_concatenated.txt"))
    }

    /// Parquet copy `<kind>_<split>_concatenated.parquet`
    #[must_use]
    pub fn parquet_path(&self, kind: TableKind, split: Split) -> PathBuf {
        self.root.join(format!("{kind}_{split}_concatenated.parquet"))
    }

    /// Generator's initial states `<split>_initial_state.txt`
    #[must_use]
    pub fn initial_state_path(&self, split: Split) -> PathBuf {
        self.root.join(format!("{split}_initial_state.txt"))
    }
}
