//! Providers of raw profile streams
//!
//! Profile dumps on disk are named
//! `<direction>_<speed>_<depth>out<Component>.txt`, where every code is
//! shifted by a fixed offset (default 100) to keep names fixed-width and
//! lexically sortable. The direction code uses the axis *index*, speed and
//! depth codes use the axis *values*.
use super::ConfigurationKey;
use crate::error::{Error, Result};
use crate::profile::read::read_samples;
use crate::Real;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Velocity component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Horizontal velocity along the approach direction
    U,
    /// Horizontal velocity across the approach direction
    V,
}

impl Component {
    /// Both components, in evaluation order
    pub const ALL: [Component; 2] = [Component::U, Component::V];

    /// Suffix used in file names
    pub fn label(self) -> &'static str {
        match self {
            Component::U => "U",
            Component::V => "V",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Yield the raw sample stream of one component for one configuration.
#[enum_dispatch]
pub trait ProfileSource {
    /// Flat sample stream
    ///
    /// # Errors
    /// `MissingInput` if the stream does not exist
    fn fetch(&self, key: &ConfigurationKey, component: Component) -> Result<Vec<Real>>;
}

/// Collection of profile sources
#[enum_dispatch(ProfileSource)]
#[derive(Debug, Clone)]
pub enum Source {
    /// Profile dumps in a directory
    DirectorySource,
    /// Streams held in memory
    MemorySource,
}

/// File identifier scheme
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNaming {
    /// Added to every code
    pub offset: i64,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self { offset: 100 }
    }
}

impl FileNaming {
    /// File name of a component dump, e.g. `101_105_120outU.txt`
    ///
    /// ```
    /// use flowrelax::{Axes, Component, FileNaming};
    /// let axes = Axes::new(vec![5.], vec![20.], vec![0., 45.]).unwrap();
    /// let key = axes.key(0, 0, 1);
    /// let name = FileNaming::default().file_name(&key, Component::V);
    /// assert_eq!(name, "101_105_120outV.txt");
    /// ```
    pub fn file_name(&self, key: &ConfigurationKey, component: Component) -> String {
        format!(
            "{}_{}_{}out{}.txt",
            self.code(key.direction_index as Real),
            self.code(key.speed),
            self.code(key.depth),
            component.label()
        )
    }

    fn code(&self, value: Real) -> String {
        format!("{}", self.offset as Real + value)
    }
}

/// Profile dumps below a root directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    naming: FileNaming,
}

impl DirectorySource {
    /// Return source reading from `root`
    pub fn new<P: AsRef<Path>>(root: P, naming: FileNaming) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            naming,
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a component dump
    pub fn path(&self, key: &ConfigurationKey, component: Component) -> PathBuf {
        self.root.join(self.naming.file_name(key, component))
    }
}

impl ProfileSource for DirectorySource {
    fn fetch(&self, key: &ConfigurationKey, component: Component) -> Result<Vec<Real>> {
        read_samples(self.path(key, component))
    }
}

/// In-memory streams, addressed by grid index
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    streams: HashMap<([usize; 3], Component), Vec<Real>>,
}

impl MemorySource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Store stream for a configuration and component
    pub fn insert(&mut self, key: &ConfigurationKey, component: Component, samples: Vec<Real>) {
        self.streams.insert((key.index(), component), samples);
    }

    /// Drop stream, if present
    pub fn remove(&mut self, key: &ConfigurationKey, component: Component) -> Option<Vec<Real>> {
        self.streams.remove(&(key.index(), component))
    }

    /// Number of stored streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl ProfileSource for MemorySource {
    fn fetch(&self, key: &ConfigurationKey, component: Component) -> Result<Vec<Real>> {
        self.streams
            .get(&(key.index(), component))
            .cloned()
            .ok_or_else(|| Error::MissingInput {
                path: PathBuf::from(FileNaming::default().file_name(key, component)),
            })
    }
}
