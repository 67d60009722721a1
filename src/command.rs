//! Command lines and filesystem actions issued by the installer.
//!
//! Every side effect the installer has on the machine is one of these two
//! values. They are built by the typed argument structs in `tools` and handed
//! to a `CommandRunner`, which decides whether to execute, skip, or record
//! them.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully assembled external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for the spawned process
    pub env: Vec<(String, String)>,
    /// Whether the command changes the disk or the target system.
    /// Dry runs still execute non-destructive commands.
    pub destructive: bool,
}

impl CommandLine {
    /// New destructive command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            destructive: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Mark the command as a pure query (safe to run during a dry run).
    pub fn read_only(mut self) -> Self {
        self.destructive = false;
        self
    }

    /// Program followed by its arguments, unquoted.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Build a `std::process::Command` for this line (stdio left untouched).
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for CommandLine {
    /// Shell-like rendering used in logs, error messages and plans.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        words.push(shell_quote(&self.program));
        words.extend(self.args.iter().map(|a| shell_quote(a)));
        write!(f, "{}", words.join(" "))
    }
}

/// Quote a word for display the way a POSIX shell would need it.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | ',' | '%' | '+' | '@')
        });
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// How a file write treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Truncate,
}

/// A change to a file or directory under the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsAction {
    CreateDir(PathBuf),
    Write {
        path: PathBuf,
        contents: String,
        mode: WriteMode,
    },
    Remove(PathBuf),
}

impl FsAction {
    pub fn append(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            contents: contents.into(),
            mode: WriteMode::Append,
        }
    }

    pub fn overwrite(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            contents: contents.into(),
            mode: WriteMode::Truncate,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::CreateDir(path) | Self::Remove(path) => path,
            Self::Write { path, .. } => path,
        }
    }

    /// Perform the action on the real filesystem.
    ///
    /// Parent directories of written files are not created: a missing
    /// `etc/` means the bootstrap did not happen, and that should surface.
    pub fn apply(&self) -> std::io::Result<()> {
        match self {
            Self::CreateDir(path) => fs::create_dir_all(path),
            Self::Write {
                path,
                contents,
                mode,
            } => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(*mode == WriteMode::Append)
                    .truncate(*mode == WriteMode::Truncate)
                    .open(path)?;
                file.write_all(contents.as_bytes())
            }
            Self::Remove(path) => fs::remove_file(path),
        }
    }
}

impl fmt::Display for FsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir(path) => write!(f, "mkdir -p {}", path.display()),
            Self::Write {
                path,
                contents,
                mode: WriteMode::Append,
            } => write!(
                f,
                "append {} line(s) to {}",
                contents.lines().count(),
                path.display()
            ),
            Self::Write {
                path,
                contents,
                mode: WriteMode::Truncate,
            } => write!(
                f,
                "write {} line(s) to {}",
                contents.lines().count(),
                path.display()
            ),
            Self::Remove(path) => write!(f, "rm {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_only_when_needed() {
        let cmd = CommandLine::new("arch-chroot")
            .arg("/mnt")
            .arg("bash")
            .arg("-c")
            .arg("cd /opt/yay && makepkg -si --noconfirm");
        assert_eq!(
            cmd.to_string(),
            "arch-chroot /mnt bash -c 'cd /opt/yay && makepkg -si --noconfirm'"
        );
    }

    #[test]
    fn test_display_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("1MiB"), "1MiB");
        assert_eq!(shell_quote("100%"), "100%");
    }

    #[test]
    fn test_env_rendered_before_program() {
        let cmd = CommandLine::new("pacstrap").env("LANG", "C").arg("/mnt");
        assert_eq!(cmd.to_string(), "LANG=C pacstrap /mnt");
        assert_eq!(cmd.argv(), vec!["pacstrap", "/mnt"]);
    }

    #[test]
    fn test_read_only_clears_destructive() {
        assert!(CommandLine::new("parted").destructive);
        assert!(!CommandLine::new("lsblk").read_only().destructive);
    }

    #[test]
    fn test_fs_action_append_and_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locale.gen");

        FsAction::append(&path, "en_US.UTF-8 UTF-8\n").apply().unwrap();
        FsAction::append(&path, "uk_UA.UTF-8 UTF-8\n").apply().unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "en_US.UTF-8 UTF-8\nuk_UA.UTF-8 UTF-8\n"
        );

        FsAction::overwrite(&path, "LANG=en_US.UTF-8\n").apply().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "LANG=en_US.UTF-8\n");

        FsAction::Remove(path.clone()).apply().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_fs_action_write_requires_parent() {
        let dir = tempfile::tempdir().unwrap();
        let action = FsAction::overwrite(dir.path().join("etc/vconsole.conf"), "KEYMAP=us\n");
        assert!(action.apply().is_err());

        FsAction::CreateDir(dir.path().join("etc")).apply().unwrap();
        assert!(action.apply().is_ok());
    }

    #[test]
    fn test_fs_action_display() {
        let action = FsAction::append("/mnt/etc/locale.gen", "a\nb\nc\n");
        assert_eq!(action.to_string(), "append 3 line(s) to /mnt/etc/locale.gen");
        assert_eq!(
            FsAction::CreateDir(PathBuf::from("/mnt/boot")).to_string(),
            "mkdir -p /mnt/boot"
        );
    }
}
