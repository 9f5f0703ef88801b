//! Application configuration

use super::{default_data_dir, Migrate};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	/// Config schema version
	pub version: u32,

	/// Data directory path
	pub data_dir: PathBuf,

	/// Logging level
	pub log_level: String,

	/// Identity matching parameters
	pub matching: MatchingConfig,

	/// Visit session lifecycle parameters
	pub lifecycle: LifecycleConfig,

	/// Frame ingestion parameters
	#[serde(default)]
	pub ingest: IngestConfig,

	/// Storage locations
	#[serde(default)]
	pub storage: StorageConfig,
}

/// Parameters for embedding-distance identity matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
	/// Euclidean distance below which an embedding matches a stored
	/// reference. A distance exactly equal to the threshold does NOT match.
	pub similarity_threshold: f32,

	/// Expected embedding vector length, used to validate observations
	pub embedding_dim: usize,
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			similarity_threshold: 0.6,
			embedding_dim: 512,
		}
	}
}

/// Parameters for visit session tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
	/// Number of processed frames a visitor may go unseen before an exit
	/// is emitted. The gap must strictly exceed this value.
	pub exit_threshold_frames: u64,

	/// Whether shutdown closes all open sessions with a final exit sweep
	pub final_sweep_on_shutdown: bool,
}

impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			exit_threshold_frames: 50,
			final_sweep_on_shutdown: true,
		}
	}
}

/// Parameters for per-frame observation intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
	/// Detections below this confidence are skipped without being resolved
	pub min_confidence: f32,
}

impl Default for IngestConfig {
	fn default() -> Self {
		Self {
			min_confidence: 0.5,
		}
	}
}

/// Database file names, relative to the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
	/// Identity table database file
	pub identity_db: String,

	/// Visit event log database file
	pub visit_db: String,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			identity_db: "identities.db".to_string(),
			visit_db: "visits.db".to_string(),
		}
	}
}

impl AppConfig {
	/// Load configuration from the default location
	pub fn load() -> Result<Self> {
		let data_dir = default_data_dir()?;
		Self::load_from(&data_dir)
	}

	/// Load configuration from a specific data directory
	pub fn load_from(data_dir: &PathBuf) -> Result<Self> {
		let config_path = data_dir.join("facetrack.json");

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)?;
			let mut config: AppConfig = serde_json::from_str(&json)?;

			// Apply migrations if needed
			if config.version < Self::target_version() {
				info!(
					"Migrating config from v{} to v{}",
					config.version,
					Self::target_version()
				);
				config.migrate()?;
				config.save()?;
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default_with_dir(data_dir.clone());
			config.save()?;
			Ok(config)
		}
	}

	/// Create default configuration with specific data directory
	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::target_version(),
			data_dir,
			log_level: "info".to_string(),
			matching: MatchingConfig::default(),
			lifecycle: LifecycleConfig::default(),
			ingest: IngestConfig::default(),
			storage: StorageConfig::default(),
		}
	}

	/// Save configuration to disk
	pub fn save(&self) -> Result<()> {
		// Ensure directory exists
		fs::create_dir_all(&self.data_dir)?;

		let config_path = self.data_dir.join("facetrack.json");
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;
		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	/// Get the path for logs directory
	pub fn logs_dir(&self) -> PathBuf {
		self.data_dir.join("logs")
	}

	/// Get the path of the identity table database
	pub fn identity_db_path(&self) -> PathBuf {
		self.data_dir.join(&self.storage.identity_db)
	}

	/// Get the path of the visit event log database
	pub fn visit_db_path(&self) -> PathBuf {
		self.data_dir.join(&self.storage.visit_db)
	}

	/// Ensure all required directories exist
	pub fn ensure_directories(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;
		fs::create_dir_all(self.logs_dir())?;
		Ok(())
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		let data_dir = default_data_dir().unwrap_or_else(|_| PathBuf::from("."));
		Self::default_with_dir(data_dir)
	}
}

impl Migrate for AppConfig {
	fn current_version(&self) -> u32 {
		self.version
	}

	fn target_version() -> u32 {
		2 // Updated schema version for ingestion configuration
	}

	fn migrate(&mut self) -> Result<()> {
		match self.version {
			1 => {
				// Migration from v1 to v2: Add ingestion config
				self.ingest = IngestConfig::default();
				self.version = 2;
				Ok(())
			}
			2 => Ok(()), // Already at target version
			v => Err(anyhow!("Unknown config version: {}", v)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;

	#[test]
	fn round_trips_through_disk() {
		let temp = TempDir::new().unwrap();
		let dir = temp.path().to_path_buf();

		let mut config = AppConfig::default_with_dir(dir.clone());
		config.matching.similarity_threshold = 0.45;
		config.lifecycle.exit_threshold_frames = 25;
		config.save().unwrap();

		let loaded = AppConfig::load_from(&dir).unwrap();
		assert_eq!(loaded.matching.similarity_threshold, 0.45);
		assert_eq!(loaded.lifecycle.exit_threshold_frames, 25);
		assert_eq!(loaded.version, AppConfig::target_version());
	}

	#[test]
	fn creates_default_when_missing() {
		let temp = TempDir::new().unwrap();
		let dir = temp.path().to_path_buf();

		let config = AppConfig::load_from(&dir).unwrap();
		assert_eq!(config.matching.embedding_dim, 512);
		assert!(dir.join("facetrack.json").exists());
	}

	#[test]
	fn migrates_v1_config() {
		let temp = TempDir::new().unwrap();
		let dir = temp.path().to_path_buf();

		// v1 files predate the `ingest` section
		let v1 = serde_json::json!({
			"version": 1,
			"data_dir": dir,
			"log_level": "debug",
			"matching": { "similarity_threshold": 0.5, "embedding_dim": 128 },
			"lifecycle": { "exit_threshold_frames": 10, "final_sweep_on_shutdown": false },
		});
		fs::write(
			dir.join("facetrack.json"),
			serde_json::to_string_pretty(&v1).unwrap(),
		)
		.unwrap();

		let config = AppConfig::load_from(&dir).unwrap();
		assert_eq!(config.version, 2);
		assert_eq!(config.ingest.min_confidence, 0.5);
		assert_eq!(config.matching.embedding_dim, 128);
		assert_eq!(config.log_level, "debug");
	}
}
