//! Installation configuration.
//!
//! Every value the installer needs beyond the device path lives here. The
//! defaults reproduce the stock install exactly (Arch base system, Kyiv
//! timezone, GRUB on EFI, Hyprland desktop, yay, Catppuccin Mocha), so a run
//! without `--config` needs no file at all. Configs are JSON; missing fields
//! take their default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::FailurePolicy;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Installation configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Staging root the new system is mounted under
    pub mountpoint: PathBuf,
    /// Packages bootstrapped by pacstrap
    pub base_packages: Vec<String>,

    // Locale & time
    pub timezone: String,
    /// Lines appended to /etc/locale.gen
    pub locales: Vec<String>,
    /// LANG written to /etc/locale.conf
    pub lang: String,
    pub keymap: String,
    pub hostname: String,

    // User account that owns the desktop setup
    pub username: String,
    pub user_groups: Vec<String>,
    pub user_shell: String,

    pub bootloader: BootloaderConfig,

    // Desktop
    pub desktop_packages: Vec<String>,
    /// Uncomment [multilib] before installing desktop packages (lib32-mesa)
    pub enable_multilib: bool,
    pub services: Vec<String>,
    pub aur_helper: AurHelperConfig,
    pub theme: ThemeConfig,

    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootloaderConfig {
    pub packages: Vec<String>,
    pub target: String,
    /// EFI directory as seen from inside the chroot
    pub efi_directory: PathBuf,
    pub bootloader_id: String,
    pub config_output: PathBuf,
}

impl Default for BootloaderConfig {
    fn default() -> Self {
        Self {
            packages: strings(&["grub", "efibootmgr"]),
            target: "x86_64-efi".to_string(),
            efi_directory: PathBuf::from("/boot"),
            bootloader_id: "GRUB".to_string(),
            config_output: PathBuf::from("/boot/grub/grub.cfg"),
        }
    }
}

/// AUR helper built from source with makepkg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AurHelperConfig {
    pub enabled: bool,
    pub repo_url: String,
    /// Clone location inside the chroot
    pub build_dir: PathBuf,
    /// Packages makepkg needs in the target system
    pub build_packages: Vec<String>,
}

impl Default for AurHelperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo_url: "https://aur.archlinux.org/yay.git".to_string(),
            build_dir: PathBuf::from("/opt/yay"),
            build_packages: strings(&["git", "base-devel", "sudo"]),
        }
    }
}

impl AurHelperConfig {
    /// Helper name, taken from the repository (`yay.git` → `yay`)
    pub fn name(&self) -> &str {
        self.repo_url
            .rsplit('/')
            .next()
            .map(|s| s.trim_end_matches(".git"))
            .filter(|s| !s.is_empty())
            .unwrap_or("aur-helper")
    }
}

/// Catppuccin theme sources, applied in the target user's home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub enabled: bool,
    pub gtk_repo: String,
    pub gtk_theme: String,
    pub waybar_repo: String,
    pub kitty_repo: String,
    /// File inside the kitty repo copied to ~/.config/kitty/catppuccin.conf
    pub kitty_flavor: String,
    /// Line appended to ~/.bashrc
    pub bashrc_line: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gtk_repo: "https://github.com/catppuccin/gtk.git".to_string(),
            gtk_theme: "Catppuccin-Mocha-Standard-Lavender-Dark".to_string(),
            waybar_repo: "https://github.com/catppuccin/waybar.git".to_string(),
            kitty_repo: "https://github.com/catppuccin/kitty.git".to_string(),
            kitty_flavor: "catppuccin-mocha.conf".to_string(),
            bashrc_line: "fastfetch".to_string(),
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            mountpoint: PathBuf::from("/mnt"),
            base_packages: strings(&["base", "linux", "linux-firmware"]),
            timezone: "Europe/Kyiv".to_string(),
            locales: strings(&["en_US.UTF-8 UTF-8", "uk_UA.UTF-8 UTF-8", "ru_RU.UTF-8 UTF-8"]),
            lang: "en_US.UTF-8".to_string(),
            keymap: "us".to_string(),
            hostname: "archlinux".to_string(),
            username: "user".to_string(),
            user_groups: strings(&["wheel"]),
            user_shell: "/bin/bash".to_string(),
            bootloader: BootloaderConfig::default(),
            desktop_packages: strings(&[
                "hyprland",
                "waybar",
                "fastfetch",
                "kitty",
                "networkmanager",
                "bluez",
                "bluez-utils",
                "modemmanager",
                "modem-manager-gui",
                "mesa",
                "lib32-mesa",
                "vulkan-intel",
                "vulkan-icd-loader",
            ]),
            enable_multilib: true,
            services: strings(&["NetworkManager", "bluetooth"]),
            aur_helper: AurHelperConfig::default(),
            theme: ThemeConfig::default(),
            failure_policy: FailurePolicy::Continue,
        }
    }
}

impl InstallConfig {
    /// Path of `relative` inside the staging root
    pub fn target_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.mountpoint.join(relative)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.mountpoint.is_absolute() {
            anyhow::bail!("Mountpoint must be an absolute path");
        }

        if self.base_packages.is_empty() {
            anyhow::bail!("At least one base package must be listed");
        }

        let timezone = self.timezone.trim();
        if timezone.is_empty() || timezone.starts_with('/') || timezone.contains("..") {
            anyhow::bail!("Timezone must be a zoneinfo name like Europe/Kyiv");
        }

        if self.locales.is_empty() {
            anyhow::bail!("At least one locale must be listed");
        }
        for locale in &self.locales {
            if locale.chars().any(char::is_control) || locale.split_whitespace().count() != 2 {
                anyhow::bail!(
                    "Locale '{}' must have the form '<name> <charset>', e.g. 'en_US.UTF-8 UTF-8'",
                    locale
                );
            }
        }

        // Both end up as a single line in locale.conf / vconsole.conf
        if !is_single_word(&self.lang) {
            anyhow::bail!("LANG must be a single word like en_US.UTF-8");
        }
        if !is_single_word(&self.keymap) {
            anyhow::bail!("Keymap must be a single word like us");
        }

        // Hostname: 1-63 chars, alphanumeric + hyphen, no leading/trailing hyphen
        // Checked as written; the value goes to /etc/hostname verbatim
        let hostname = self.hostname.as_str();
        if hostname.is_empty() || hostname.len() > 63 {
            anyhow::bail!("Hostname must be 1-63 characters long");
        }
        if hostname.starts_with('-') || hostname.ends_with('-') {
            anyhow::bail!("Hostname cannot start or end with a hyphen");
        }
        if !hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!("Hostname can only contain letters, numbers, and hyphens");
        }

        // Username: useradd's default NAME_REGEX
        let username = self.username.as_str();
        if username.is_empty() || username.len() > 32 {
            anyhow::bail!("Username must be 1-32 characters long");
        }
        if let Some(first) = username.chars().next() {
            if !(first.is_ascii_lowercase() || first == '_') {
                anyhow::bail!("Username must start with a lowercase letter or underscore");
            }
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            anyhow::bail!("Username can only contain lowercase letters, digits, '_' and '-'");
        }
        if username == "root" {
            anyhow::bail!("Username cannot be root (makepkg refuses to build as root)");
        }

        if !self.bootloader.efi_directory.is_absolute() {
            anyhow::bail!("EFI directory must be an absolute path inside the new system");
        }
        if self.bootloader.bootloader_id.trim().is_empty() {
            anyhow::bail!("Bootloader id must be specified");
        }

        if self.aur_helper.enabled && !self.aur_helper.build_dir.is_absolute() {
            anyhow::bail!("AUR build directory must be an absolute path");
        }

        Ok(())
    }
}

fn is_single_word(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c.is_control())
}
