//! Installation orchestration
//!
//! `Installer` walks the ten steps in order through a `CommandRunner`:
//!
//! 1. device selection      6. base system (pacstrap)
//! 2. size query            7. fstab
//! 3. partitioning          8. timezone, locale, keymap, hostname, user
//! 4. formatting + swapon   9. GRUB
//! 5. mounting             10. desktop packages, AUR helper, services, theme
//!
//! # Failure Policy
//!
//! A missing device stops the run before anything destructive. After that,
//! a failed command is printed and recorded, and under the default
//! `FailurePolicy::Continue` the next command runs anyway; the completion
//! message is printed regardless, followed by the list of failures.
//! `FailurePolicy::Halt` stops at the first failure instead.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::command::{CommandLine, FsAction, shell_quote};
use crate::config_file::InstallConfig;
use crate::device;
use crate::error::{InstallError, Result};
use crate::layout::{self, BYTES_PER_GB, PartitionLayout};
use crate::runner::{CommandOutput, CommandRunner, Recorded, RecordingRunner};
use crate::stage::{InstallStage, StageTracker};
use crate::tool_traits::ToolArgs;
use crate::tools::disk::{
    LsblkListArgs, LsblkSizeArgs, MkfsArgs, MountArgs, PartedMklabelArgs, PartedMkpartArgs,
    SwaponArgs,
};
use crate::tools::packages::{
    ChownArgs, EnableMultilibArgs, GitCloneArgs, PacmanSyncArgs, ShellScriptArgs,
};
use crate::tools::system::{
    ChrootArgs, GenfstabArgs, GrubInstallArgs, GrubMkconfigArgs, HwclockArgs, LinkTimezoneArgs,
    LocaleGenArgs, PacstrapArgs, SystemctlEnableArgs, UserAddArgs,
};
use crate::types::{FailurePolicy, PartitionRole};

pub const COMPLETION_MESSAGE: &str = "Installation complete! Reboot the system.";

/// Drop-in that lets the target user run pacman through sudo during the
/// AUR build. Removed right after.
const AUR_SUDOERS_DROPIN: &str = "etc/sudoers.d/10-hyprstrap-aur";

/// One command or file action that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub stage: InstallStage,
    /// Rendered command line or file action
    pub operation: String,
    pub exit_code: Option<i32>,
    pub message: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.operation)?;
        if let Some(code) = self.exit_code {
            write!(f, " (exit code {code})")?;
        }
        Ok(())
    }
}

/// Result of a run that reached the end of the chain.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub device: PathBuf,
    pub size_gb: f64,
    pub layout: PartitionLayout,
    pub failures: Vec<CommandFailure>,
}

impl InstallReport {
    /// True if every command and file action succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives one installation.
pub struct Installer<R: CommandRunner, W: Write> {
    runner: R,
    out: W,
    config: InstallConfig,
    stages: StageTracker,
    failures: Vec<CommandFailure>,
}

impl<R: CommandRunner, W: Write> Installer<R, W> {
    /// `out` receives the operator-facing status lines.
    pub fn new(runner: R, out: W, config: InstallConfig) -> Self {
        Self {
            runner,
            out,
            config,
            stages: StageTracker::new(),
            failures: Vec::new(),
        }
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn stages(&self) -> &StageTracker {
        &self.stages
    }

    pub fn failures(&self) -> &[CommandFailure] {
        &self.failures
    }

    /// Step 1 through 10, prompting for the device on `input`.
    pub fn run_interactive<I: BufRead>(&mut self, input: &mut I) -> Result<InstallReport> {
        let device = self.select_device(input)?;
        self.install(&device)
    }

    /// Step 1 through 10 with the device given up front.
    pub fn run_with_device(&mut self, path: &Path) -> Result<InstallReport> {
        let device = self.accept_device(path)?;
        self.install(&device)
    }

    // ========================================================================
    // Step 1: device selection
    // ========================================================================

    /// List disks, prompt for one, and verify it exists.
    pub fn select_device<I: BufRead>(&mut self, input: &mut I) -> Result<PathBuf> {
        self.enter(InstallStage::SelectingDevice)?;
        writeln!(self.out, "Available disks:")?;
        let listing = self.exec(LsblkListArgs.command_line())?;
        writeln!(self.out, "{}", listing.stdout.trim_end())?;
        let path = device::read_device_path(input, &mut self.out)?;
        self.check_device(&path)
    }

    /// Verify a device passed on the command line.
    pub fn accept_device(&mut self, path: &Path) -> Result<PathBuf> {
        self.enter(InstallStage::SelectingDevice)?;
        self.check_device(path)
    }

    /// Take `path` without checking it exists. Only for planning.
    pub fn assume_device(&mut self, path: &Path) -> Result<PathBuf> {
        self.enter(InstallStage::SelectingDevice)?;
        Ok(path.to_path_buf())
    }

    fn check_device(&mut self, path: &Path) -> Result<PathBuf> {
        match device::verify_device(path) {
            Ok(device) => {
                info!(device = %device.display(), "target device selected");
                Ok(device)
            }
            Err(err) => {
                writeln!(self.out, "Device not found!")?;
                error!(device = %path.display(), "device not found");
                self.stages.halt()?;
                Err(err)
            }
        }
    }

    // ========================================================================
    // Steps 2-10
    // ========================================================================

    /// Run steps 2 through 10 against a selected device.
    pub fn install(&mut self, device: &Path) -> Result<InstallReport> {
        let size_gb = self.query_size(device)?;
        let layout = PartitionLayout::for_size(size_gb);
        info!("{}", layout.summary());

        self.create_partitions(device, &layout)?;
        self.format_partitions(device)?;
        self.mount_partitions(device)?;
        self.install_base_system()?;
        self.generate_fstab()?;
        self.configure_system()?;
        self.install_bootloader()?;
        self.install_components()?;

        self.stages.advance()?;
        writeln!(self.out, "{COMPLETION_MESSAGE}")?;

        if !self.failures.is_empty() {
            warn!(count = self.failures.len(), "installation finished with failures");
            writeln!(
                self.out,
                "Warning: {} operation(s) failed during installation:",
                self.failures.len()
            )?;
            for failure in &self.failures {
                writeln!(self.out, "  - {failure}")?;
            }
        }

        Ok(InstallReport {
            device: device.to_path_buf(),
            size_gb,
            layout,
            failures: self.failures.clone(),
        })
    }

    fn query_size(&mut self, device: &Path) -> Result<f64> {
        self.enter(InstallStage::QueryingSize)?;
        let output = self.exec(
            LsblkSizeArgs {
                device: device.to_path_buf(),
            }
            .command_line(),
        )?;

        let bytes = match layout::parse_size_bytes(&output.stdout) {
            Ok(bytes) => bytes,
            Err(e) => {
                let reason = if output.success {
                    format!("unexpected lsblk output {:?}: {e}", output.stdout.trim())
                } else {
                    "lsblk failed".to_string()
                };
                self.stages.halt()?;
                return Err(InstallError::DeviceSize {
                    device: device.to_path_buf(),
                    reason,
                });
            }
        };

        let size_gb = layout::bytes_to_gb(bytes);
        writeln!(self.out, "Device size: {size_gb:.2} GB")?;
        Ok(size_gb)
    }

    fn create_partitions(&mut self, device: &Path, layout: &PartitionLayout) -> Result<()> {
        self.enter(InstallStage::Partitioning)?;
        writeln!(self.out, "Creating partition table...")?;

        self.exec(
            PartedMklabelArgs {
                device: device.to_path_buf(),
            }
            .command_line(),
        )?;
        for spec in layout.partitions() {
            self.exec(
                PartedMkpartArgs {
                    device: device.to_path_buf(),
                    start: spec.start,
                    end: spec.end,
                }
                .command_line(),
            )?;
        }
        Ok(())
    }

    fn format_partitions(&mut self, device: &Path) -> Result<()> {
        self.enter(InstallStage::Formatting)?;
        writeln!(self.out, "Formatting partitions...")?;

        for role in [PartitionRole::Efi, PartitionRole::Swap, PartitionRole::Root] {
            self.exec(
                MkfsArgs {
                    partition: layout::partition_path(device, role.index()),
                    filesystem: role.filesystem(),
                }
                .command_line(),
            )?;
        }
        self.exec(
            SwaponArgs {
                partition: layout::partition_path(device, PartitionRole::Swap.index()),
            }
            .command_line(),
        )?;
        Ok(())
    }

    fn mount_partitions(&mut self, device: &Path) -> Result<()> {
        self.enter(InstallStage::Mounting)?;
        writeln!(self.out, "Mounting partitions...")?;

        self.exec(
            MountArgs {
                device: layout::partition_path(device, PartitionRole::Root.index()),
                target: self.config.mountpoint.clone(),
            }
            .command_line(),
        )?;

        let efi_mountpoint = self.efi_mountpoint();
        self.fs(FsAction::CreateDir(efi_mountpoint.clone()))?;
        self.exec(
            MountArgs {
                device: layout::partition_path(device, PartitionRole::Efi.index()),
                target: efi_mountpoint,
            }
            .command_line(),
        )?;
        Ok(())
    }

    fn install_base_system(&mut self) -> Result<()> {
        self.enter(InstallStage::InstallingBase)?;
        writeln!(self.out, "Installing base system...")?;

        self.exec(
            PacstrapArgs {
                root: self.config.mountpoint.clone(),
                packages: self.config.base_packages.clone(),
            }
            .command_line(),
        )?;
        Ok(())
    }

    fn generate_fstab(&mut self) -> Result<()> {
        self.enter(InstallStage::GeneratingFstab)?;
        writeln!(self.out, "Generating fstab...")?;

        let output = self.exec(
            GenfstabArgs {
                root: self.config.mountpoint.clone(),
            }
            .command_line(),
        )?;
        if output.success {
            let fstab = self.config.target_path("etc/fstab");
            self.fs(FsAction::append(fstab, output.stdout))?;
        }
        Ok(())
    }

    fn configure_system(&mut self) -> Result<()> {
        self.enter(InstallStage::ConfiguringSystem)?;
        writeln!(self.out, "Configuring system settings...")?;

        self.chroot(
            LinkTimezoneArgs {
                timezone: self.config.timezone.clone(),
            }
            .command_line(),
        )?;
        self.chroot(HwclockArgs.command_line())?;

        let locale_gen: String = self
            .config
            .locales
            .iter()
            .map(|locale| format!("{locale}\n"))
            .collect();
        self.fs(FsAction::append(
            self.config.target_path("etc/locale.gen"),
            locale_gen,
        ))?;
        self.chroot(LocaleGenArgs.command_line())?;

        self.fs(FsAction::overwrite(
            self.config.target_path("etc/locale.conf"),
            format!("LANG={}\n", self.config.lang),
        ))?;
        self.fs(FsAction::overwrite(
            self.config.target_path("etc/vconsole.conf"),
            format!("KEYMAP={}\n", self.config.keymap),
        ))?;
        self.fs(FsAction::overwrite(
            self.config.target_path("etc/hostname"),
            format!("{}\n", self.config.hostname),
        ))?;

        self.chroot(
            UserAddArgs {
                username: self.config.username.clone(),
                groups: self.config.user_groups.clone(),
                shell: self.config.user_shell.clone(),
            }
            .command_line(),
        )?;
        Ok(())
    }

    fn install_bootloader(&mut self) -> Result<()> {
        self.enter(InstallStage::InstallingBootloader)?;
        let bootloader = self.config.bootloader.clone();
        writeln!(
            self.out,
            "Installing {} bootloader...",
            bootloader.bootloader_id
        )?;

        self.chroot(
            PacmanSyncArgs {
                packages: bootloader.packages,
                ..Default::default()
            }
            .command_line(),
        )?;
        self.chroot(
            GrubInstallArgs {
                target: bootloader.target,
                efi_directory: bootloader.efi_directory,
                bootloader_id: bootloader.bootloader_id,
            }
            .command_line(),
        )?;
        self.chroot(
            GrubMkconfigArgs {
                output: bootloader.config_output,
            }
            .command_line(),
        )?;
        Ok(())
    }

    fn install_components(&mut self) -> Result<()> {
        self.enter(InstallStage::InstallingComponents)?;
        writeln!(self.out, "Installing core components...")?;

        if self.config.enable_multilib {
            self.chroot(EnableMultilibArgs.command_line())?;
        }
        self.chroot(
            PacmanSyncArgs {
                packages: self.config.desktop_packages.clone(),
                needed: false,
                refresh: self.config.enable_multilib,
            }
            .command_line(),
        )?;

        self.install_aur_helper()?;
        self.enable_services()?;
        self.apply_theme()?;
        Ok(())
    }

    /// makepkg refuses to run as root, so the helper is built by the target
    /// user with a temporary passwordless sudo rule for its pacman calls.
    fn install_aur_helper(&mut self) -> Result<()> {
        let aur = self.config.aur_helper.clone();
        if !aur.enabled {
            info!("AUR helper disabled, skipping");
            return Ok(());
        }
        writeln!(self.out, "Installing {}...", aur.name())?;
        let user = self.config.username.clone();

        self.chroot(
            PacmanSyncArgs {
                packages: aur.build_packages.clone(),
                needed: true,
                refresh: false,
            }
            .command_line(),
        )?;
        self.chroot(
            GitCloneArgs {
                url: aur.repo_url.clone(),
                dest: aur.build_dir.clone(),
            }
            .command_line(),
        )?;
        self.chroot(
            ChownArgs {
                owner: user.clone(),
                path: aur.build_dir.clone(),
            }
            .command_line(),
        )?;

        let sudoers = self.config.target_path(AUR_SUDOERS_DROPIN);
        self.fs(FsAction::overwrite(
            sudoers.clone(),
            format!("{user} ALL=(ALL) NOPASSWD: ALL\n"),
        ))?;
        let build = self.chroot_as_user(
            &user,
            ShellScriptArgs::chain([
                format!("cd {}", shell_quote(&aur.build_dir.display().to_string())),
                "makepkg -si --noconfirm".to_string(),
            ])
            .command_line(),
        );
        // The sudo rule goes away even when the build halts the run
        let cleanup = self.fs(FsAction::Remove(sudoers));
        build?;
        cleanup
    }

    fn enable_services(&mut self) -> Result<()> {
        if self.config.services.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "Enabling services...")?;
        for service in self.config.services.clone() {
            self.chroot(SystemctlEnableArgs { service }.command_line())?;
        }
        Ok(())
    }

    /// Each component is its own command so one broken repository does not
    /// take the rest of the theme down with it.
    fn apply_theme(&mut self) -> Result<()> {
        let theme = self.config.theme.clone();
        if !theme.enabled {
            info!("theme disabled, skipping");
            return Ok(());
        }
        writeln!(self.out, "Applying Catppuccin theme...")?;
        let user = self.config.username.clone();

        let components = [
            ShellScriptArgs::chain([
                format!("git clone {} ~/catppuccin-gtk", shell_quote(&theme.gtk_repo)),
                "mkdir -p ~/.themes".to_string(),
                format!("cp -r ~/catppuccin-gtk/{} ~/.themes/", shell_quote(&theme.gtk_theme)),
                format!(
                    "gsettings set org.gnome.desktop.interface gtk-theme {}",
                    shell_quote(&theme.gtk_theme)
                ),
            ]),
            ShellScriptArgs::chain([
                format!("git clone {} ~/catppuccin-waybar", shell_quote(&theme.waybar_repo)),
                "mkdir -p ~/.config/waybar".to_string(),
                "cp -r ~/catppuccin-waybar/* ~/.config/waybar/".to_string(),
            ]),
            ShellScriptArgs::chain([
                format!("git clone {} ~/catppuccin-kitty", shell_quote(&theme.kitty_repo)),
                "mkdir -p ~/.config/kitty".to_string(),
                format!(
                    "cp ~/catppuccin-kitty/{} ~/.config/kitty/catppuccin.conf",
                    shell_quote(&theme.kitty_flavor)
                ),
            ]),
            ShellScriptArgs::chain([format!(
                "echo {} >> ~/.bashrc",
                shell_quote(&theme.bashrc_line)
            )]),
        ];

        for component in components {
            self.chroot_as_user(&user, component.command_line())?;
        }
        Ok(())
    }

    // ========================================================================
    // Execution helpers
    // ========================================================================

    fn efi_mountpoint(&self) -> PathBuf {
        let efi = &self.config.bootloader.efi_directory;
        self.config
            .target_path(efi.strip_prefix("/").unwrap_or(efi.as_path()))
    }

    fn enter(&mut self, stage: InstallStage) -> Result<()> {
        self.stages.transition_to(stage)?;
        info!(step = ?stage.step_number(), "{}", stage);
        Ok(())
    }

    fn chroot(&mut self, inner: CommandLine) -> Result<CommandOutput> {
        let command = ChrootArgs::new(self.config.mountpoint.clone(), inner).command_line();
        self.exec(command)
    }

    fn chroot_as_user(&mut self, user: &str, inner: CommandLine) -> Result<CommandOutput> {
        let command = ChrootArgs::new(self.config.mountpoint.clone(), inner)
            .as_user(user)
            .command_line();
        self.exec(command)
    }

    /// Run a command; failures are reported, recorded, and handed to the
    /// failure policy. A command that cannot be spawned counts as failed.
    fn exec(&mut self, command: CommandLine) -> Result<CommandOutput> {
        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("{e:#}"),
                exit_code: None,
                success: false,
            },
        };

        if !output.success {
            let message = if output.stderr.trim().is_empty() {
                match output.exit_code {
                    Some(code) => format!("`{command}` exited with code {code}"),
                    None => format!("`{command}` did not exit normally"),
                }
            } else {
                output.stderr.trim().to_string()
            };
            self.record_failure(command.to_string(), output.exit_code, message)?;
        }
        Ok(output)
    }

    fn fs(&mut self, action: FsAction) -> Result<()> {
        if let Err(e) = self.runner.apply(&action) {
            self.record_failure(action.to_string(), None, format!("{e:#}"))?;
        }
        Ok(())
    }

    fn record_failure(
        &mut self,
        operation: String,
        exit_code: Option<i32>,
        message: String,
    ) -> Result<()> {
        // Cleanup after a halt is attributed to the stage that halted
        let stage = self
            .stages
            .halted_at()
            .unwrap_or_else(|| self.stages.current());
        writeln!(self.out, "Error: {message}")?;
        error!(stage = %stage, operation = %operation, exit_code = ?exit_code, "{}", message);

        self.failures.push(CommandFailure {
            stage,
            operation: operation.clone(),
            exit_code,
            message,
        });

        if self.config.failure_policy == FailurePolicy::Halt {
            if !self.stages.current().is_terminal() {
                self.stages.halt()?;
            }
            return Err(InstallError::StepFailed {
                stage,
                command: operation,
                exit_code,
            });
        }
        Ok(())
    }
}

/// Every command and file action an install of `device` would issue,
/// assuming the device reports `size_gb` gigabytes. Nothing is executed.
pub fn plan(device: &Path, size_gb: f64, config: InstallConfig) -> Result<Vec<Recorded>> {
    if !size_gb.is_finite() || size_gb <= 0.0 {
        return Err(InstallError::validation(format!(
            "device size must be a positive number of GB, got {size_gb}"
        )));
    }
    let bytes = (size_gb * BYTES_PER_GB as f64).round() as u64;
    let runner =
        RecordingRunner::new().respond("lsblk -b", CommandOutput::success(format!("{bytes}\n")));

    let mut installer = Installer::new(runner, io::sink(), config);
    installer.assume_device(device)?;
    installer.install(device)?;
    Ok(installer.into_runner().log().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = BYTES_PER_GB;

    fn runner_for(size_gb: u64) -> RecordingRunner {
        RecordingRunner::new().respond(
            "lsblk -b",
            CommandOutput::success(format!("{}\n", size_gb * GB)),
        )
    }

    fn installer(
        runner: RecordingRunner,
        config: InstallConfig,
    ) -> Installer<RecordingRunner, Vec<u8>> {
        Installer::new(runner, Vec::new(), config)
    }

    fn printed(installer: &Installer<RecordingRunner, Vec<u8>>) -> String {
        String::from_utf8_lossy(installer.output()).to_string()
    }

    #[test]
    fn test_step_order_follows_stage_chain() {
        let mut inst = installer(runner_for(64), InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        let expected: Vec<InstallStage> = InstallStage::all_stages()[1..].to_vec();
        assert_eq!(inst.stages().history(), expected.as_slice());
    }

    #[test]
    fn test_disk_commands_for_small_device() {
        let mut inst = installer(runner_for(20), InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        let report = inst.install(Path::new("/dev/sda")).unwrap();
        assert_eq!(report.layout.swap_gb(), 4);

        let commands = inst.runner().command_strings();
        assert_eq!(
            &commands[..10],
            &[
                "lsblk -b -dn -o SIZE /dev/sda",
                "parted -s /dev/sda mklabel gpt",
                "parted -s /dev/sda mkpart primary 1MiB 1GiB",
                "parted -s /dev/sda mkpart primary 1GiB 5GiB",
                "parted -s /dev/sda mkpart primary 5GiB 100%",
                "mkfs.fat -F32 /dev/sda1",
                "mkswap /dev/sda2",
                "mkfs.ext4 /dev/sda3",
                "swapon /dev/sda2",
                "mount /dev/sda3 /mnt",
            ]
        );
        assert_eq!(commands[10], "mount /dev/sda1 /mnt/boot");
        assert_eq!(commands[11], "pacstrap /mnt base linux linux-firmware");
        assert_eq!(commands[12], "genfstab -U /mnt");
    }

    #[test]
    fn test_boot_dir_created_between_mounts() {
        let mut inst = installer(runner_for(64), InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        let log: Vec<String> = inst.runner().log().iter().map(|r| r.to_string()).collect();
        let root = log.iter().position(|l| l == "mount /dev/sda3 /mnt").unwrap();
        let mkdir = log.iter().position(|l| l == "# mkdir -p /mnt/boot").unwrap();
        let boot = log.iter().position(|l| l == "mount /dev/sda1 /mnt/boot").unwrap();
        assert!(root < mkdir && mkdir < boot);
    }

    #[test]
    fn test_configuration_files_written() {
        let mut inst = installer(runner_for(64), InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        let actions = inst.runner().fs_actions();
        assert!(actions.contains(&&FsAction::append(
            "/mnt/etc/locale.gen",
            "en_US.UTF-8 UTF-8\nuk_UA.UTF-8 UTF-8\nru_RU.UTF-8 UTF-8\n"
        )));
        assert!(actions.contains(&&FsAction::overwrite(
            "/mnt/etc/locale.conf",
            "LANG=en_US.UTF-8\n"
        )));
        assert!(actions.contains(&&FsAction::overwrite(
            "/mnt/etc/vconsole.conf",
            "KEYMAP=us\n"
        )));
    }

    #[test]
    fn test_fstab_appends_genfstab_output() {
        let runner = runner_for(64).respond(
            "genfstab",
            CommandOutput::success("UUID=abcd / ext4 rw 0 1\n"),
        );
        let mut inst = installer(runner, InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        assert!(inst.runner().fs_actions().contains(&&FsAction::append(
            "/mnt/etc/fstab",
            "UUID=abcd / ext4 rw 0 1\n"
        )));
    }

    #[test]
    fn test_failed_genfstab_skips_append() {
        let runner = runner_for(64).fail("genfstab", 1, "genfstab: /mnt is not a mountpoint");
        let mut inst = installer(runner, InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        let report = inst.install(Path::new("/dev/sda")).unwrap();

        assert!(!inst
            .runner()
            .fs_actions()
            .iter()
            .any(|a| a.path() == Path::new("/mnt/etc/fstab")));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, InstallStage::GeneratingFstab);
    }

    #[test]
    fn test_aur_sudo_rule_removed_after_build() {
        let mut inst = installer(runner_for(64), InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        let log: Vec<String> = inst.runner().log().iter().map(|r| r.to_string()).collect();
        let grant = log
            .iter()
            .position(|l| l == "# write 1 line(s) to /mnt/etc/sudoers.d/10-hyprstrap-aur")
            .unwrap();
        let build = log.iter().position(|l| l.contains("makepkg -si --noconfirm")).unwrap();
        let revoke = log
            .iter()
            .position(|l| l == "# rm /mnt/etc/sudoers.d/10-hyprstrap-aur")
            .unwrap();
        assert!(grant < build && build < revoke);
        assert!(log[build].starts_with("arch-chroot -u user /mnt env HOME=/home/user bash -c"));
    }

    #[test]
    fn test_halt_still_revokes_sudo_rule() {
        let mut config = InstallConfig::default();
        config.failure_policy = FailurePolicy::Halt;
        let runner = runner_for(64).fail("makepkg", 1, "==> ERROR: build failed");
        let mut inst = installer(runner, config);
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        let err = inst.install(Path::new("/dev/sda")).unwrap_err();

        assert!(matches!(
            err,
            InstallError::StepFailed {
                stage: InstallStage::InstallingComponents,
                ..
            }
        ));
        let last = inst.runner().log().last().unwrap().to_string();
        assert_eq!(last, "# rm /mnt/etc/sudoers.d/10-hyprstrap-aur");
    }

    #[test]
    fn test_failed_build_error_survives_failed_cleanup() {
        let mut config = InstallConfig::default();
        config.failure_policy = FailurePolicy::Halt;
        let runner = runner_for(64)
            .fail("makepkg", 1, "==> ERROR: build failed")
            .fail_fs("rm /mnt/etc/sudoers.d", "Read-only file system");
        let mut inst = installer(runner, config);
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        let err = inst.install(Path::new("/dev/sda")).unwrap_err();

        match &err {
            InstallError::StepFailed { stage, command, .. } => {
                assert_eq!(*stage, InstallStage::InstallingComponents);
                assert!(command.contains("makepkg"));
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
        let stages: Vec<InstallStage> = inst.failures().iter().map(|f| f.stage).collect();
        assert_eq!(
            stages,
            vec![InstallStage::InstallingComponents, InstallStage::InstallingComponents]
        );
        assert_eq!(inst.stages().halted_at(), Some(InstallStage::InstallingComponents));
    }

    #[test]
    fn test_theme_runs_as_target_user() {
        let mut inst = installer(runner_for(64), InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        let theme: Vec<&CommandLine> = inst
            .runner()
            .commands()
            .into_iter()
            .filter(|c| c.to_string().contains("catppuccin") || c.to_string().contains(".bashrc"))
            .collect();
        assert_eq!(theme.len(), 4);
        for command in theme {
            assert_eq!(&command.args[..5], &["-u", "user", "/mnt", "env", "HOME=/home/user"]);
        }
    }

    #[test]
    fn test_disabled_extras_are_skipped() {
        let mut config = InstallConfig::default();
        config.aur_helper.enabled = false;
        config.theme.enabled = false;
        config.enable_multilib = false;
        let mut inst = installer(runner_for(64), config);
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        let commands = inst.runner().command_strings();
        assert!(!commands.iter().any(|c| c.contains("makepkg")));
        assert!(!commands.iter().any(|c| c.contains("catppuccin")));
        assert!(!commands.iter().any(|c| c.contains("multilib")));
        assert_eq!(
            commands.last().unwrap(),
            "arch-chroot /mnt systemctl enable bluetooth"
        );
    }

    #[test]
    fn test_unparseable_size_stops_before_partitioning() {
        let runner = RecordingRunner::new().respond("lsblk -b", CommandOutput::success("20G\n"));
        let mut inst = installer(runner, InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        let err = inst.install(Path::new("/dev/sda")).unwrap_err();

        assert!(matches!(err, InstallError::DeviceSize { .. }));
        assert_eq!(inst.runner().commands().len(), 1);
        assert_eq!(inst.stages().halted_at(), Some(InstallStage::QueryingSize));
    }

    #[test]
    fn test_failure_message_uses_stderr() {
        let runner = runner_for(64).fail("mkswap", 1, "mkswap: error: /dev/sda2 is mounted\n");
        let mut inst = installer(runner, InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        assert!(printed(&inst).contains("Error: mkswap: error: /dev/sda2 is mounted\n"));
    }

    #[test]
    fn test_failure_message_without_stderr() {
        let runner = runner_for(64).fail("swapon", 255, "");
        let mut inst = installer(runner, InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        inst.install(Path::new("/dev/sda")).unwrap();

        assert!(printed(&inst).contains("Error: `swapon /dev/sda2` exited with code 255"));
    }

    #[test]
    fn test_fs_failure_is_recorded() {
        let runner = runner_for(64).fail_fs("vconsole.conf", "No such file or directory");
        let mut inst = installer(runner, InstallConfig::default());
        inst.assume_device(Path::new("/dev/sda")).unwrap();
        let report = inst.install(Path::new("/dev/sda")).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, InstallStage::ConfiguringSystem);
        assert!(printed(&inst).contains(COMPLETION_MESSAGE));
    }

    #[test]
    fn test_nvme_partition_names() {
        let mut inst = installer(runner_for(64), InstallConfig::default());
        inst.assume_device(Path::new("/dev/nvme0n1")).unwrap();
        inst.install(Path::new("/dev/nvme0n1")).unwrap();

        let commands = inst.runner().command_strings();
        assert!(commands.contains(&"mkfs.fat -F32 /dev/nvme0n1p1".to_string()));
        assert!(commands.contains(&"mount /dev/nvme0n1p3 /mnt".to_string()));
    }

    #[test]
    fn test_plan_rejects_bad_size() {
        assert!(plan(Path::new("/dev/sda"), 0.0, InstallConfig::default()).is_err());
        assert!(plan(Path::new("/dev/sda"), f64::NAN, InstallConfig::default()).is_err());
    }

    #[test]
    fn test_plan_records_whole_install() {
        let log = plan(Path::new("/dev/vda"), 64.0, InstallConfig::default()).unwrap();
        let rendered: Vec<String> = log.iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered[0], "lsblk -b -dn -o SIZE /dev/vda");
        assert!(rendered.contains(&"parted -s /dev/vda mkpart primary 9GiB 100%".to_string()));
        assert!(rendered
            .contains(&"arch-chroot /mnt grub-mkconfig -o /boot/grub/grub.cfg".to_string()));
    }
}
