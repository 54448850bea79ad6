use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use tracing::debug;

use super::snapshot::{MEMORY_TYPE_UNAVAILABLE, MEMORY_TYPE_UNKNOWN};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryModuleType {
    Detected(String),
    /// The inventory tool ran but reported no usable type.
    Unknown,
    /// The inventory tool is missing or needs more privilege than we have.
    Unavailable,
}

impl MemoryModuleType {
    pub fn label(&self) -> &str {
        match self {
            MemoryModuleType::Detected(value) => value,
            MemoryModuleType::Unknown => MEMORY_TYPE_UNKNOWN,
            MemoryModuleType::Unavailable => MEMORY_TYPE_UNAVAILABLE,
        }
    }

    pub fn from_probe_output(output: &str) -> Self {
        match parse_memory_type(output) {
            Some(value) => MemoryModuleType::Detected(value),
            None => MemoryModuleType::Unknown,
        }
    }
}

/// Best-effort lookup of the installed memory module type (DDR generation).
pub trait MemoryTypeProbe: Send {
    fn probe(&self) -> MemoryModuleType;
}

/// Scan line-oriented inventory output for `Type:` fields. A value that
/// mentions DDR wins; otherwise the first value that is not "Unknown".
pub fn parse_memory_type(output: &str) -> Option<String> {
    let mut found: Option<&str> = None;
    for line in output.lines() {
        let Some(value) = line.trim().strip_prefix("Type:") else {
            continue;
        };
        let value = value.trim();
        if value.contains("DDR") {
            return Some(value.to_string());
        }
        if found.is_none() && !value.is_empty() && value != "Unknown" {
            found = Some(value);
        }
    }
    found.map(str::to_string)
}

/// Runs the platform's hardware inventory tool.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemInventoryProbe;

impl MemoryTypeProbe for SystemInventoryProbe {
    fn probe(&self) -> MemoryModuleType {
        let Some((program, args)) = platform_impl::Platform::memory_inventory_command() else {
            return MemoryModuleType::Unavailable;
        };
        match Command::new(program).args(args).output() {
            Ok(out) if out.status.success() => {
                MemoryModuleType::from_probe_output(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                debug!("{program} exited with {}", out.status);
                MemoryModuleType::Unavailable
            }
            Err(err) => {
                debug!("{program} could not be started: {err}");
                MemoryModuleType::Unavailable
            }
        }
    }
}

/// Space on one filesystem as `statvfs` reports it, scaled to bytes.
/// `free` includes the blocks reserved for root, `available` does not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilesystemSpace {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
}

#[cfg(unix)]
pub fn filesystem_space(path: &Path) -> io::Result<FilesystemSpace> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: `c_path` is NUL-terminated and `stat` outlives the call.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    let block_size = u64::from(stat.f_frsize);
    Ok(FilesystemSpace {
        total_bytes: u64::from(stat.f_blocks).saturating_mul(block_size),
        free_bytes: u64::from(stat.f_bfree).saturating_mul(block_size),
        available_bytes: u64::from(stat.f_bavail).saturating_mul(block_size),
    })
}

#[cfg(not(unix))]
pub fn filesystem_space(_path: &Path) -> io::Result<FilesystemSpace> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "statvfs is not available on this platform",
    ))
}

/// Runs the inner lookup until it detects a type, then serves that answer
/// for good. Misses are retried: privileges or tooling may appear later.
pub struct CachedMemoryType<M> {
    inner: M,
    detected: OnceLock<MemoryModuleType>,
}

impl<M: MemoryTypeProbe> CachedMemoryType<M> {
    pub fn new(inner: M) -> Self {
        CachedMemoryType {
            inner,
            detected: OnceLock::new(),
        }
    }
}

impl<M: MemoryTypeProbe> MemoryTypeProbe for CachedMemoryType<M> {
    fn probe(&self) -> MemoryModuleType {
        if let Some(detected) = self.detected.get() {
            return detected.clone();
        }
        let found = self.inner.probe();
        if matches!(found, MemoryModuleType::Detected(_)) {
            let _ = self.detected.set(found.clone());
        }
        found
    }
}

pub trait PlatformExtensions {
    /// Command whose output lists memory modules with `Type:` lines.
    fn memory_inventory_command() -> Option<(&'static str, &'static [&'static str])>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod other;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use other as platform_impl;
