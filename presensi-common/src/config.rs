//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database filename inside the data folder
pub const DB_FILENAME: &str = "presensi.db";

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_folder())
}

/// Path of the SQLite database under the resolved data folder
pub fn database_path(data_folder: &std::path::Path) -> PathBuf {
    data_folder.join(DB_FILENAME)
}

/// Locate the platform config file, if one exists
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/presensi/config.toml first, then /etc/presensi/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("presensi").join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/presensi/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("presensi").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("presensi"))
        .unwrap_or_else(|| PathBuf::from("./presensi_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VAR: &str = "PRESENSI_DATA_FOLDER";

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        std::env::set_var(ENV_VAR, "/from/env");
        let folder = resolve_data_folder(Some("/from/cli"), ENV_VAR).unwrap();
        assert_eq!(folder, PathBuf::from("/from/cli"));
        std::env::remove_var(ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_env_variable_used_when_no_cli() {
        std::env::set_var(ENV_VAR, "/from/env");
        let folder = resolve_data_folder(None, ENV_VAR).unwrap();
        assert_eq!(folder, PathBuf::from("/from/env"));
        std::env::remove_var(ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_falls_back_to_default() {
        std::env::remove_var(ENV_VAR);
        let folder = resolve_data_folder(None, ENV_VAR).unwrap();
        assert!(!folder.as_os_str().is_empty());
    }

    #[test]
    fn test_database_path_appends_filename() {
        let path = database_path(std::path::Path::new("/var/lib/presensi"));
        assert!(path.ends_with(DB_FILENAME));
    }
}
