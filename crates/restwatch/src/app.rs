use crate::error::HomeDirError;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::{process, thread};

use directories_next::BaseDirs;

/// Returns the name of the app
pub fn name() -> &'static str {
    "restwatch"
}

/// Kinds of per-user directories the app writes to.
///
/// Configuration lives under the platform config directory, the workout
/// store under the platform data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppDir {
    Config,
    Data,
}

/// Returns the path for one of the app's directories, creating it on first
/// use.
///
/// # Errors
///
/// - Fails if the home directory cannot be found
/// - Fails if the directory cannot be created
///
/// # Notes
///
/// Under `cfg!(test)` every thread gets its own directory below the system
/// temp dir, so filesystem tests never race each other or touch a real
/// home directory.
pub(crate) fn dir(kind: AppDir) -> Result<PathBuf, HomeDirError> {
    let base_dir = if cfg!(test) {
        let thread_id = format!("{:?}", thread::current().id());
        let suffix = match kind {
            AppDir::Config => "config",
            AppDir::Data => "data",
        };
        env::temp_dir()
            .join(format!("{}_test_{suffix}", name()))
            .join(format!(
                "{}-{}",
                process::id(),
                thread_id.replace([':', '(', ')'], "-")
            ))
    } else {
        let base = BaseDirs::new().ok_or(HomeDirError::HomeDirNotFound)?;
        match kind {
            AppDir::Config => base.config_dir().to_path_buf(),
            AppDir::Data => base.data_dir().to_path_buf(),
        }
    };

    let dir = base_dir.join(name());

    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the path for a file in the app's config directory
pub fn config_file_path(file_name: &str) -> Result<PathBuf, HomeDirError> {
    Ok(dir(AppDir::Config)?.join(file_name))
}

/// Returns the path of the app's data directory
pub fn data_dir() -> Result<PathBuf, HomeDirError> {
    dir(AppDir::Data)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    // helper
    fn cleanup_test_dir(dir: &Path) {
        if let Some(parent) = dir.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    // helper
    fn cleanup_test_dir_parent(dir: &Path) {
        if let Some(parent) = dir.parent() {
            cleanup_test_dir(parent)
        }
    }

    #[test]
    fn config_file_path_in_test_mode() {
        let file_name = "test.toml";
        let result = config_file_path(file_name);
        assert!(result.is_ok());

        let result = result.unwrap();
        let expected = format!("{}_test_config", name());
        assert!(result.to_string_lossy().contains(expected.as_str()));

        // It should also contain the actual file name
        let expected = Path::new(name()).join(file_name);
        assert!(result
            .to_string_lossy()
            .contains(expected.to_string_lossy().as_ref()));

        cleanup_test_dir_parent(&result);
    }

    #[test]
    fn data_dir_is_separate_from_config() {
        let data = data_dir().unwrap();
        let config = config_file_path("config.toml").unwrap();

        assert!(data.to_string_lossy().contains("_test_data"));
        assert_ne!(Some(data.as_path()), config.parent());

        cleanup_test_dir_parent(&data);
        cleanup_test_dir_parent(&config);
    }
}
