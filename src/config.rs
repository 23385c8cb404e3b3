//! Experiment configuration, read from an optional JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifiers::ClassifierKind;
use crate::data::loader::{DEFAULT_DATA_DIR, DEFAULT_DATA_FILE};
use crate::data::split::SplitOptions;
use crate::error::{HarnessError, Result};
use crate::network::{Estimator, ScoreKind};

/// Everything `cmc-bayes run` needs. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub data_dir: PathBuf,
    pub data_file: String,
    /// Column to predict: `class` or `n_children`.
    pub target: String,
    pub split: SplitOptions,
    pub discretize: bool,
    pub n_bins: usize,
    pub continuous_columns: Vec<String>,
    /// `MaximumLikelihoodEstimator` or `BayesianEstimator`.
    pub estimator: String,
    pub baselines: Vec<String>,
    /// JSON topology; when absent the network is learned (`learn`) or a
    /// naive Bayes star around the target.
    pub network: Option<PathBuf>,
    /// Structure score for hill climbing (`BicScore`, `K2Score`, `BDeuScore`).
    pub learn: Option<String>,
    pub max_indegree: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            data_file: DEFAULT_DATA_FILE.to_string(),
            target: "class".to_string(),
            split: SplitOptions::default(),
            discretize: true,
            n_bins: 10,
            continuous_columns: vec!["wife_age".to_string(), "n_children".to_string()],
            estimator: "BayesianEstimator".to_string(),
            baselines: ClassifierKind::ALL
                .iter()
                .map(|k| k.label().to_string())
                .collect(),
            network: None,
            learn: None,
            max_indegree: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        log::info!("Loaded experiment config from {}", path.display());
        Ok(config)
    }

    pub fn estimator(&self) -> Result<Estimator> {
        self.estimator.parse()
    }

    pub fn score(&self) -> Result<Option<ScoreKind>> {
        self.learn.as_deref().map(str::parse).transpose()
    }

    pub fn baseline_kinds(&self) -> Result<Vec<ClassifierKind>> {
        self.baselines.iter().map(|b| b.parse()).collect()
    }

    /// Resolve every label and check the numeric settings, so a bad config
    /// fails before any data is read.
    pub fn validate(&self) -> Result<()> {
        self.estimator()?;
        self.score()?;
        self.baseline_kinds()?;
        if self.network.is_some() && self.learn.is_some() {
            return Err(HarnessError::InvalidParameter(
                "'network' and 'learn' are mutually exclusive".to_string(),
            ));
        }
        if self.n_bins < 2 {
            return Err(HarnessError::InvalidParameter(format!(
                "n_bins must be at least 2, got {}",
                self.n_bins
            )));
        }
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            return Err(HarnessError::InvalidParameter(format!(
                "test_size must lie in (0, 1), got {}",
                self.split.test_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ExperimentConfig::default();
        config.validate().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("../data"));
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.estimator().unwrap(), Estimator::default());
        assert_eq!(config.score().unwrap(), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"target": "n_children", "split": {{"stratify": true}}, "learn": "K2Score"}}"#
        )
        .unwrap();

        let config = ExperimentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.target, "n_children");
        assert!(config.split.stratify);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.score().unwrap(), Some(ScoreKind::K2));
        assert_eq!(config.n_bins, 10);
    }

    #[test]
    fn bad_labels_fail_validation() {
        let config = ExperimentConfig {
            baselines: vec!["Foo".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HarnessError::UnknownClassifier(_))
        ));

        let config = ExperimentConfig {
            estimator: "Magic".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HarnessError::UnknownEstimator(_))
        ));

        let config = ExperimentConfig {
            network: Some("net.json".into()),
            learn: Some("BicScore".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidParameter(_))
        ));
    }
}
