use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SrError};
use crate::network::network::Network;

/// Persisted model parameters plus enough context to identify the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub model_name: String,
    pub trial: Option<usize>,
    pub learning_rate: f64,
    pub epochs_completed: usize,
    pub saved_at: DateTime<Utc>,
    pub network: Network,
}

/// `<model_name>_<trial>`
pub fn trial_checkpoint_name(model_name: &str, trial: usize) -> String {
    format!("{model_name}_{trial}")
}

pub fn checkpoint_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

impl Checkpoint {
    /// Writes the checkpoint through a temporary file and a rename so a
    /// failed save never leaves a truncated checkpoint behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let file = std::fs::File::create(&tmp)?;
            let writer = std::io::BufWriter::new(file);
            serde_json::to_writer(writer, self)?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Fails with `CheckpointNotFound` when `path` does not exist; a file
    /// that exists but does not parse is a serialization error.
    pub fn load(path: &Path) -> Result<Checkpoint> {
        if !path.is_file() {
            return Err(SrError::CheckpointNotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;
    use rand::SeedableRng;

    fn checkpoint() -> Checkpoint {
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        Checkpoint {
            model_name: "m".to_string(),
            trial: Some(2),
            learning_rate: 0.01,
            epochs_completed: 4,
            saved_at: Utc::now(),
            network: Network::from_spec(NetworkSpec::for_patches(2, 2, &[3]), &mut rng),
        }
    }

    #[test]
    fn test_save_creates_directory_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(&dir.path().join("models"), &trial_checkpoint_name("m", 2));
        let ckpt = checkpoint();
        ckpt.save(&path).unwrap();

        assert!(path.ends_with("models/m_2.json"));
        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.trial, Some(2));
        assert_eq!(loaded.network.layers[0].weights, ckpt.network.layers[0].weights);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checkpoint::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SrError::CheckpointNotFound(_)));
    }

    #[test]
    fn test_corrupt_checkpoint_is_not_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Checkpoint::load(&path), Err(SrError::Serde(_))));
    }
}
