//! Versioned config migration

use anyhow::Result;

/// Implemented by config structs that carry a schema version and can
/// upgrade themselves in place from older on-disk layouts.
pub trait Migrate {
	/// Version found in the loaded file
	fn current_version(&self) -> u32;

	/// Version this build writes
	fn target_version() -> u32;

	/// Upgrade one or more versions until `current_version == target_version`
	fn migrate(&mut self) -> Result<()>;
}
