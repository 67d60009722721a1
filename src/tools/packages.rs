//! Type-safe arguments for package and source tools.
//!
//! - `PacmanSyncArgs` for `pacman -S`
//! - `EnableMultilibArgs` for uncommenting `[multilib]` in `pacman.conf`
//! - `GitCloneArgs`, `ChownArgs`, `ShellScriptArgs` for AUR builds and theming

use std::path::PathBuf;

use crate::tool_traits::ToolArgs;

/// `pacman -S[y] [--needed] --noconfirm <packages...>`
#[derive(Debug, Clone, Default)]
pub struct PacmanSyncArgs {
    pub packages: Vec<String>,
    /// Skip packages that are already up to date
    pub needed: bool,
    /// Refresh the sync databases first (`-Sy`)
    pub refresh: bool,
}

impl ToolArgs for PacmanSyncArgs {
    fn program(&self) -> &'static str {
        "pacman"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![if self.refresh { "-Sy" } else { "-S" }.to_string()];
        if self.needed {
            args.push("--needed".to_string());
        }
        args.push("--noconfirm".to_string());
        args.extend(self.packages.iter().cloned());
        args
    }
}

/// Uncomment the `[multilib]` section of `/etc/pacman.conf`.
#[derive(Debug, Clone, Default)]
pub struct EnableMultilibArgs;

impl ToolArgs for EnableMultilibArgs {
    fn program(&self) -> &'static str {
        "sed"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            r"/^#\[multilib\]/,/^#Include/ s/^#//".to_string(),
            "/etc/pacman.conf".to_string(),
        ]
    }
}

/// `git clone <url> <dest>`
#[derive(Debug, Clone)]
pub struct GitCloneArgs {
    pub url: String,
    pub dest: PathBuf,
}

impl ToolArgs for GitCloneArgs {
    fn program(&self) -> &'static str {
        "git"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "clone".to_string(),
            self.url.clone(),
            self.dest.display().to_string(),
        ]
    }
}

/// `chown -R <owner>:<owner> <path>`
#[derive(Debug, Clone)]
pub struct ChownArgs {
    pub owner: String,
    pub path: PathBuf,
}

impl ToolArgs for ChownArgs {
    fn program(&self) -> &'static str {
        "chown"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-R".to_string(),
            format!("{0}:{0}", self.owner),
            self.path.display().to_string(),
        ]
    }
}

/// `bash -c <script>` for steps that need shell expansion (`~`, globs, `&&`).
#[derive(Debug, Clone)]
pub struct ShellScriptArgs {
    pub script: String,
}

impl ShellScriptArgs {
    /// Join steps with `&&` so the first failure stops the rest.
    pub fn chain<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let script = steps
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" && ");
        Self { script }
    }
}

impl ToolArgs for ShellScriptArgs {
    fn program(&self) -> &'static str {
        "bash"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-c".to_string(), self.script.clone()]
    }
}
