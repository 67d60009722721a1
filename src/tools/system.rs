//! Type-safe arguments for system tools.
//!
//! - `PacstrapArgs` for `pacstrap`
//! - `GenfstabArgs` for `genfstab`
//! - `ChrootArgs` for `arch-chroot`, wrapping any other command line
//! - timezone, clock, locale, user, bootloader and service commands that
//!   run inside the chroot

use std::path::PathBuf;

use crate::command::CommandLine;
use crate::tool_traits::ToolArgs;

// ============================================================================
// Bootstrap
// ============================================================================

/// `pacstrap <root> <packages...>`
#[derive(Debug, Clone)]
pub struct PacstrapArgs {
    pub root: PathBuf,
    pub packages: Vec<String>,
}

impl ToolArgs for PacstrapArgs {
    fn program(&self) -> &'static str {
        "pacstrap"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![self.root.display().to_string()];
        args.extend(self.packages.iter().cloned());
        args
    }
}

/// `genfstab -U <root>`: prints UUID-based entries, writes nothing itself.
#[derive(Debug, Clone)]
pub struct GenfstabArgs {
    pub root: PathBuf,
}

impl ToolArgs for GenfstabArgs {
    fn program(&self) -> &'static str {
        "genfstab"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-U".to_string(), self.root.display().to_string()]
    }

    fn is_destructive(&self) -> bool {
        false
    }
}

// ============================================================================
// Chroot
// ============================================================================

/// `arch-chroot [-u <user>] <root> [env K=V...] <command...>`
///
/// The inner command's environment is passed through `env` inside the
/// chroot, so it reaches the chrooted process rather than arch-chroot.
#[derive(Debug, Clone)]
pub struct ChrootArgs {
    pub root: PathBuf,
    /// Run as this user instead of root
    pub user: Option<String>,
    pub inner: CommandLine,
}

impl ChrootArgs {
    pub fn new(root: impl Into<PathBuf>, inner: CommandLine) -> Self {
        Self {
            root: root.into(),
            user: None,
            inner,
        }
    }

    /// Drop to `user` with `HOME` pointing at that user's home.
    pub fn as_user(mut self, user: &str) -> Self {
        self.inner = self.inner.env("HOME", format!("/home/{user}"));
        self.user = Some(user.to_string());
        self
    }
}

impl ToolArgs for ChrootArgs {
    fn program(&self) -> &'static str {
        "arch-chroot"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref user) = self.user {
            args.push("-u".to_string());
            args.push(user.clone());
        }
        args.push(self.root.display().to_string());
        if !self.inner.env.is_empty() {
            args.push("env".to_string());
            args.extend(self.inner.env.iter().map(|(k, v)| format!("{k}={v}")));
        }
        args.extend(self.inner.argv());
        args
    }

    fn is_destructive(&self) -> bool {
        self.inner.destructive
    }
}

// ============================================================================
// Commands run inside the chroot
// ============================================================================

/// `ln -sf /usr/share/zoneinfo/<timezone> /etc/localtime`
#[derive(Debug, Clone)]
pub struct LinkTimezoneArgs {
    pub timezone: String,
}

impl ToolArgs for LinkTimezoneArgs {
    fn program(&self) -> &'static str {
        "ln"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-sf".to_string(),
            format!("/usr/share/zoneinfo/{}", self.timezone),
            "/etc/localtime".to_string(),
        ]
    }
}

/// `hwclock --systohc`
#[derive(Debug, Clone, Default)]
pub struct HwclockArgs;

impl ToolArgs for HwclockArgs {
    fn program(&self) -> &'static str {
        "hwclock"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["--systohc".to_string()]
    }
}

/// `locale-gen`
#[derive(Debug, Clone, Default)]
pub struct LocaleGenArgs;

impl ToolArgs for LocaleGenArgs {
    fn program(&self) -> &'static str {
        "locale-gen"
    }

    fn to_cli_args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// `useradd -m -G <groups> -s <shell> <username>`
#[derive(Debug, Clone)]
pub struct UserAddArgs {
    pub username: String,
    pub groups: Vec<String>,
    pub shell: String,
}

impl ToolArgs for UserAddArgs {
    fn program(&self) -> &'static str {
        "useradd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["-m".to_string()];
        if !self.groups.is_empty() {
            args.push("-G".to_string());
            args.push(self.groups.join(","));
        }
        args.push("-s".to_string());
        args.push(self.shell.clone());
        args.push(self.username.clone());
        args
    }
}

/// `grub-install --target=<target> --efi-directory=<dir> --bootloader-id=<id>`
#[derive(Debug, Clone)]
pub struct GrubInstallArgs {
    pub target: String,
    pub efi_directory: PathBuf,
    pub bootloader_id: String,
}

impl ToolArgs for GrubInstallArgs {
    fn program(&self) -> &'static str {
        "grub-install"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            format!("--target={}", self.target),
            format!("--efi-directory={}", self.efi_directory.display()),
            format!("--bootloader-id={}", self.bootloader_id),
        ]
    }
}

/// `grub-mkconfig -o <output>`
#[derive(Debug, Clone)]
pub struct GrubMkconfigArgs {
    pub output: PathBuf,
}

impl ToolArgs for GrubMkconfigArgs {
    fn program(&self) -> &'static str {
        "grub-mkconfig"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-o".to_string(), self.output.display().to_string()]
    }
}

/// `systemctl enable <service>`
#[derive(Debug, Clone)]
pub struct SystemctlEnableArgs {
    pub service: String,
}

impl ToolArgs for SystemctlEnableArgs {
    fn program(&self) -> &'static str {
        "systemctl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["enable".to_string(), self.service.clone()]
    }
}
