//! Run configuration
//!
//! ```toml
//! data_dir = "data"
//! tolerance = 0.01
//! node_count = 41
//! parallel = false
//!
//! [axes]
//! speeds = [5.0, 10.0, 15.0]
//! depths = [20.0, 40.0]
//! directions = [0.0, 45.0, 90.0]
//!
//! [naming]
//! offset = 100
//! ```
use crate::convergence::ConvergenceDetector;
use crate::error::{Error, Result};
use crate::grid::source::{DirectorySource, FileNaming, Source};
use crate::grid::{Axes, GridRunner, NodeCount};
use crate::Real;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Values of the three configuration axes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxesTable {
    /// Flow speeds
    pub speeds: Vec<Real>,
    /// Water depths
    pub depths: Vec<Real>,
    /// Approach directions
    pub directions: Vec<Real>,
}

/// Everything needed to evaluate a grid from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding the profile dumps
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Tolerance on the integrated squared deviation
    #[serde(default = "default_tolerance")]
    pub tolerance: Real,
    /// Depth nodes, single value or one per depth
    #[serde(default = "default_node_count")]
    pub node_count: NodeCount,
    /// Evaluate cells on all cores
    #[serde(default)]
    pub parallel: bool,
    /// Configuration axes
    pub axes: AxesTable,
    /// File identifier scheme
    #[serde(default)]
    pub naming: FileNaming,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_tolerance() -> Real {
    0.01
}

fn default_node_count() -> NodeCount {
    NodeCount::Uniform(41)
}

impl RunConfig {
    /// Parse and validate configuration from toml text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config = Self::parse(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate configuration file
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let config = Self::read(filename)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse toml text without validation
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read configuration file without validation
    pub fn read<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let text = std::fs::read_to_string(filename)?;
        Self::parse(&text)
    }

    /// Apply command line overrides, then validate the result.
    ///
    /// `parallel` only switches parallel evaluation on.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        tolerance: Option<Real>,
        parallel: bool,
    ) -> Result<Self> {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(tol) = tolerance {
            self.tolerance = tol;
        }
        self.parallel |= parallel;
        self.validate()?;
        Ok(self)
    }

    /// Check tolerance, axes and node counts
    pub fn validate(&self) -> Result<()> {
        let axes = self.axes()?;
        ConvergenceDetector::new(self.tolerance)?;
        self.node_count.validate(&axes)?;
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("data_dir is empty".to_string()));
        }
        Ok(())
    }

    /// Validated axes
    pub fn axes(&self) -> Result<Axes> {
        Axes::new(
            self.axes.speeds.clone(),
            self.axes.depths.clone(),
            self.axes.directions.clone(),
        )
    }

    /// Runner for this configuration
    pub fn runner(&self) -> Result<GridRunner> {
        GridRunner::new(
            self.axes()?,
            ConvergenceDetector::new(self.tolerance)?,
            self.node_count.clone(),
        )
    }

    /// Dumps in `data_dir`
    pub fn directory(&self) -> DirectorySource {
        DirectorySource::new(&self.data_dir, self.naming)
    }

    /// Source the grid is read from
    pub fn source(&self) -> Source {
        Source::from(self.directory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        data_dir = "runs/2021"
        tolerance = 0.02
        node_count = [41, 61]

        [axes]
        speeds = [5.0, 10.0]
        depths = [20.0, 40.0]
        directions = [0.0, 45.0, 90.0]

        [naming]
        offset = 200
    "#;

    #[test]
    fn test_parse_config() {
        let config = RunConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("runs/2021"));
        assert_eq!(config.tolerance, 0.02);
        assert_eq!(config.node_count, NodeCount::ByDepth(vec![41, 61]));
        assert!(!config.parallel);
        assert_eq!(config.naming.offset, 200);
        let runner = config.runner().unwrap();
        assert_eq!(runner.axes().shape(), (2, 2, 3));
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_toml(
            "[axes]\nspeeds = [1.0]\ndepths = [2.0]\ndirections = [3.0]\n",
        )
        .unwrap();
        assert_eq!(config.tolerance, 0.01);
        assert_eq!(config.node_count, NodeCount::Uniform(41));
        assert_eq!(config.naming, FileNaming::default());
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_invalid_config() {
        let empty_axis = "[axes]\nspeeds = []\ndepths = [2.0]\ndirections = [3.0]\n";
        assert!(matches!(
            RunConfig::from_toml(empty_axis),
            Err(Error::InvalidAxes(_))
        ));
        let bad_tol =
            "tolerance = -1.0\n[axes]\nspeeds = [1.0]\ndepths = [2.0]\ndirections = [3.0]\n";
        assert!(matches!(
            RunConfig::from_toml(bad_tol),
            Err(Error::InvalidTolerance(_))
        ));
        let bad_nodes =
            "node_count = [41, 41]\n[axes]\nspeeds = [1.0]\ndepths = [2.0]\ndirections = [3.0]\n";
        assert!(matches!(
            RunConfig::from_toml(bad_nodes),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RunConfig::from_toml("tolerance = \"x\""),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_overrides_validated_once() {
        let bad_tol =
            "tolerance = 0.0\n[axes]\nspeeds = [1.0]\ndepths = [2.0]\ndirections = [3.0]\n";
        let config = RunConfig::parse(bad_tol).unwrap();
        assert_eq!(config.tolerance, 0.0);
        let config = config
            .with_overrides(Some(PathBuf::from("elsewhere")), Some(0.05), true)
            .unwrap();
        assert_eq!(config.tolerance, 0.05);
        assert_eq!(config.data_dir, PathBuf::from("elsewhere"));
        assert!(config.parallel);

        let config = RunConfig::from_toml(CONFIG).unwrap();
        assert!(matches!(
            config.clone().with_overrides(None, Some(f64::NAN), false),
            Err(Error::InvalidTolerance(_))
        ));
        assert!(matches!(
            config.with_overrides(Some(PathBuf::new()), None, false),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, CONFIG.replace("0.02", "-1.0")).unwrap();
        assert!(RunConfig::from_file(&path).is_err());
        let config = RunConfig::read(&path)
            .unwrap()
            .with_overrides(None, Some(0.02), false)
            .unwrap();
        assert_eq!(config, RunConfig::from_toml(CONFIG).unwrap());
    }

    #[test]
    fn test_source_reads_data_dir() {
        let config = RunConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.directory().root(), Path::new("runs/2021"));
        match config.source() {
            Source::DirectorySource(dir) => assert_eq!(dir.root(), config.directory().root()),
            other => panic!("expected DirectorySource, got {:?}", other),
        }
    }
}
