//! Target device selection.
//!
//! The device path is the only input the operator types. It is checked once,
//! before anything destructive runs: a path that does not exist ends the
//! installation.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};

pub const DEVICE_PROMPT: &str = "Enter the device to install to (e.g. /dev/sda): ";

/// Prompt on `out` and read one device path from `input`.
pub fn read_device_path<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<PathBuf> {
    write!(out, "{DEVICE_PROMPT}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no device path entered",
        ));
    }
    Ok(PathBuf::from(line.trim()))
}

/// Confirm that `path` exists.
pub fn verify_device(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() || !path.exists() {
        return Err(InstallError::DeviceNotFound(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}
