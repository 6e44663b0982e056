use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            console_logging_enabled: default_true(),
            file_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "vending_machine_controller".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Bluetooth address of the vending machine this app drives.
    #[serde(default = "default_machine_address")]
    pub machine_address: String,
    /// Prepaid balance granted to a fresh session.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i32,
    /// Size of one serial frame the machine firmware accepts.
    #[serde(default = "default_packet_size")]
    pub packet_size: usize,

    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            machine_address: default_machine_address(),
            starting_balance: default_starting_balance(),
            packet_size: default_packet_size(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_machine_address() -> String {
    "98:D3:32:20:AD:BD".to_string()
}
fn default_starting_balance() -> i32 {
    80
}
fn default_packet_size() -> usize {
    64
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let first_run = !settings_path.exists();
        let service = Self::with_path(settings_path);
        if first_run {
            // Write the defaults out so the machine address can be edited.
            service.save()?;
        }
        Ok(service)
    }

    /// Backs the service with an explicit file, falling back to defaults
    /// when it is missing or unreadable.
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("VendingMachineController");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_machine_profile() {
        let settings = Settings::default();
        assert_eq!(settings.machine_address, "98:D3:32:20:AD:BD");
        assert_eq!(settings.starting_balance, 80);
        assert_eq!(settings.packet_size, 64);
        assert_eq!(settings.log_settings.level, "info");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut service = SettingsService::with_path(path.clone());
        service.get_mut().machine_address = "AA:BB:CC:DD:EE:FF".to_string();
        service.get_mut().starting_balance = 55;
        service.save().unwrap();

        let reloaded = SettingsService::with_path(path);
        assert_eq!(reloaded.get().machine_address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(reloaded.get().starting_balance, 55);
        assert_eq!(reloaded.get().packet_size, 64);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "starting_balance": 12 }"#).unwrap();

        let service = SettingsService::with_path(path);
        assert_eq!(service.get().starting_balance, 12);
        assert_eq!(service.get().machine_address, "98:D3:32:20:AD:BD");
        assert!(service.get().log_settings.file_logging_enabled);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = SettingsService::with_path(dir.path().join("nope.json"));
        assert_eq!(service.get().starting_balance, 80);
    }
}
