use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tauri::AppHandle;
use tauri::Manager;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppSettings {
    pub log_dir: String,
    /// Serial port to use for uploads; when unset the first USB port is picked
    #[serde(default)]
    pub preferred_port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default = "default_parity")]
    pub parity: String, // "none" | "odd" | "even"
}

fn default_baud_rate() -> u32 {
    115200 // STM32 CDC default
}
fn default_data_bits() -> u8 {
    8
}
fn default_stop_bits() -> u8 {
    1
}
fn default_parity() -> String {
    "none".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        // Get platform-specific documents directory
        let documents_dir = dirs::document_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("PyBlocks");

        Self {
            log_dir: documents_dir.join("Logs").to_string_lossy().to_string(),
            preferred_port: None,
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: default_parity(),
        }
    }
}

impl AppSettings {
    /// Connection parameters for the channel provider.
    pub fn channel_config(&self) -> crate::io::ChannelConfig {
        crate::io::ChannelConfig {
            preferred_port: self.preferred_port.clone(),
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            stop_bits: self.stop_bits,
            parity: self.parity.clone(),
        }
    }
}

fn get_settings_path(app: &AppHandle) -> Result<PathBuf, String> {
    let app_dir = app
        .path()
        .app_config_dir()
        .map_err(|e| format!("Failed to get app config dir: {}", e))?;

    std::fs::create_dir_all(&app_dir)
        .map_err(|e| format!("Failed to create app config dir: {}", e))?;

    Ok(app_dir.join("settings.json"))
}

/// Synchronous settings read used during setup, before the command layer is up.
pub(crate) fn read_settings(app: &AppHandle) -> Result<AppSettings, String> {
    let settings_path = get_settings_path(app)?;

    if settings_path.exists() {
        let content = std::fs::read_to_string(&settings_path)
            .map_err(|e| format!("Failed to read settings: {}", e))?;

        serde_json::from_str(&content).map_err(|e| format!("Failed to parse settings: {}", e))
    } else {
        // First run: create default settings
        let settings = AppSettings::default();
        write_settings(app, &settings)?;
        Ok(settings)
    }
}

fn write_settings(app: &AppHandle, settings: &AppSettings) -> Result<(), String> {
    let settings_path = get_settings_path(app)?;

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;

    std::fs::write(&settings_path, content).map_err(|e| format!("Failed to write settings: {}", e))
}

#[tauri::command]
pub async fn load_settings(app: AppHandle) -> Result<AppSettings, String> {
    read_settings(&app)
}

#[tauri::command]
pub async fn save_settings(app: AppHandle, settings: AppSettings) -> Result<(), String> {
    write_settings(&app, &settings)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectoryValidation {
    pub exists: bool,
    pub writable: bool,
    pub error: Option<String>,
}

#[tauri::command]
pub async fn validate_directory(path: String) -> Result<DirectoryValidation, String> {
    let dir_path = PathBuf::from(&path);

    // Check if directory exists
    let exists = dir_path.exists();

    // Check if writable
    let writable = if exists {
        // Try to create a temporary file to test writability
        let test_file = dir_path.join(".pyblocks_write_test");
        match std::fs::write(&test_file, b"test") {
            Ok(_) => {
                std::fs::remove_file(&test_file).ok();
                true
            }
            Err(_) => false,
        }
    } else {
        false
    };

    let error = if !exists {
        Some("Directory does not exist".to_string())
    } else if !writable {
        Some("Directory is not writable".to_string())
    } else {
        None
    };

    Ok(DirectoryValidation {
        exists,
        writable,
        error,
    })
}

#[tauri::command]
pub async fn create_directory(path: String) -> Result<(), String> {
    let dir_path = PathBuf::from(&path);
    std::fs::create_dir_all(&dir_path).map_err(|e| format!("Failed to create directory: {}", e))
}

#[tauri::command]
pub async fn get_app_version(app: AppHandle) -> Result<String, String> {
    Ok(app
        .config()
        .version
        .clone()
        .unwrap_or_else(|| "unknown".to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    html_url: String,
}

fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let v = version.trim_start_matches('v');
    let parts: Vec<&str> = v.split('.').collect();
    if parts.len() >= 3 {
        let major = parts[0].parse().ok()?;
        let minor = parts[1].parse().ok()?;
        let patch = parts[2].parse().ok()?;
        Some((major, minor, patch))
    } else {
        None
    }
}

fn is_newer_version(current: &str, latest: &str) -> bool {
    match (parse_version(current), parse_version(latest)) {
        (Some((c_maj, c_min, c_pat)), Some((l_maj, l_min, l_pat))) => {
            (l_maj, l_min, l_pat) > (c_maj, c_min, c_pat)
        }
        _ => false,
    }
}

#[tauri::command]
pub async fn check_for_updates(app: AppHandle) -> Result<Option<UpdateInfo>, String> {
    let current_version = app
        .config()
        .version
        .clone()
        .unwrap_or_else(|| "0.0.0".to_string());

    let client = reqwest::Client::builder()
        .user_agent("PyBlocks-App")
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

    let response = client
        .get("https://api.github.com/repos/pyblocks/pyblocks/releases/latest")
        .send()
        .await
        .map_err(|e| format!("Failed to fetch release info: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("GitHub API returned status: {}", response.status()));
    }

    let release: GitHubRelease = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse release info: {}", e))?;

    if is_newer_version(&current_version, &release.tag_name) {
        Ok(Some(UpdateInfo {
            version: release.tag_name,
            url: release.html_url,
        }))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_board_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.data_bits, 8);
        assert_eq!(settings.stop_bits, 1);
        assert_eq!(settings.parity, "none");
        assert_eq!(settings.preferred_port, None);
    }

    #[test]
    fn test_settings_tolerate_missing_fields() {
        let settings: AppSettings = serde_json::from_str(r#"{"log_dir":"/tmp/logs"}"#).unwrap();
        assert_eq!(settings.log_dir, "/tmp/logs");
        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.parity, "none");
    }

    #[test]
    fn test_version_comparison() {
        assert!(is_newer_version("0.1.0", "v0.2.0"));
        assert!(is_newer_version("1.2.3", "1.2.4"));
        assert!(!is_newer_version("1.2.3", "1.2.3"));
        assert!(!is_newer_version("2.0.0", "v1.9.9"));
        assert!(!is_newer_version("garbage", "1.0.0"));
    }
}
