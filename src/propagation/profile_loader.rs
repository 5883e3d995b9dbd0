//! Loading of terrain/clutter profiles from an input directory.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::parameters::Profile;

/// Error type for profile loading failures.
#[derive(Debug)]
pub enum ProfileError {
    /// Directory or file could not be read.
    Io { path: PathBuf, message: String },
    /// A profile file is not valid JSON for a profile (or list of profiles).
    Parse { path: PathBuf, message: String },
    /// A loaded profile cannot be turned into loss parameters.
    Malformed { index: usize, message: String },
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Io { path, message } => write!(f, "Failed to read {}: {}", path.display(), message),
            ProfileError::Parse { path, message } => write!(f, "Failed to parse profile file {}: {}", path.display(), message),
            ProfileError::Malformed { index, message } => write!(f, "Profile {} is malformed: {}", index + 1, message),
        }
    }
}

impl std::error::Error for ProfileError {}

/// Supplies the ordered profiles of one run.
///
/// Implementations must return the same order on every call for the same
/// directory; receiver numbering and the coverage ring depend on it.
pub trait ProfileLoader {
    fn load_profiles(&self, dir: &Path) -> Result<Vec<Profile>, ProfileError>;
}

/// Reads every `*.json` file of a directory, in file name order.
///
/// Each file holds either one profile object or an array of profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProfileLoader;

impl JsonProfileLoader {
    fn profile_files(dir: &Path) -> Result<Vec<PathBuf>, ProfileError> {
        let entries = fs::read_dir(dir).map_err(|e| ProfileError::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProfileError::Io {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if path.is_file() && is_json {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn parse_file(path: &Path) -> Result<Vec<Profile>, ProfileError> {
        let data = fs::read_to_string(path).map_err(|e| ProfileError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let value: serde_json::Value = serde_json::from_str(&data).map_err(|e| ProfileError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let parsed = if value.is_array() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value(value).map(|profile| vec![profile])
        };
        parsed.map_err(|e| ProfileError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl ProfileLoader for JsonProfileLoader {
    fn load_profiles(&self, dir: &Path) -> Result<Vec<Profile>, ProfileError> {
        let files = Self::profile_files(dir)?;
        let mut profiles = Vec::new();
        for file in &files {
            let loaded = Self::parse_file(file)?;
            debug!("Loaded {} profile(s) from {}", loaded.len(), file.display());
            profiles.extend(loaded);
        }
        info!("Loaded {} profiles from {} file(s) in {}", profiles.len(), files.len(), dir.display());
        Ok(profiles)
    }
}

/// Profiles already held in memory.
impl ProfileLoader for Vec<Profile> {
    fn load_profiles(&self, _dir: &Path) -> Result<Vec<Profile>, ProfileError> {
        Ok(self.clone())
    }
}
