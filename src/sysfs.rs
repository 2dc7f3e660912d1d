//! Kernel attribute files used by the overlay: two write-only switches and the
//! `fod_ui` node the watcher polls.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SYSFS_ROOT: &str = "/sys";

const DISPLAY_DEVICE: &str = "devices/platform/soc/soc:qcom,dsi-display-primary";
const TOUCH_DEVICE: &str = "devices/virtual/touch/tp_dev";

pub const FOD_PRESSED: &str = "fod_pressed";
pub const FOD_STATUS: &str = "fod_status";
pub const FOD_UI: &str = "fod_ui";

pub const FOD_PRESSED_ON: i32 = 1;
pub const FOD_PRESSED_OFF: i32 = 0;
pub const FOD_STATUS_ON: i32 = 1;
pub const FOD_STATUS_OFF: i32 = 0;

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePaths {
    pub fod_pressed: PathBuf,
    pub fod_status: PathBuf,
    pub fod_ui: PathBuf,
}

impl Default for AttributePaths {
    fn default() -> Self {
        Self::with_root(Path::new(SYSFS_ROOT))
    }
}

impl AttributePaths {
    /// The stock attribute layout rebased under `root` instead of `/sys`.
    pub fn with_root(root: &Path) -> Self {
        let display = root.join(DISPLAY_DEVICE);
        Self::from_devices(&display, &root.join(TOUCH_DEVICE))
    }

    /// Attributes of an already resolved display and touch device directory.
    pub fn from_devices(display: &Path, touch: &Path) -> Self {
        Self {
            fod_pressed: display.join(FOD_PRESSED),
            fod_status: touch.join(FOD_STATUS),
            fod_ui: display.join(FOD_UI),
        }
    }
}

/// Write `value` as text to the attribute, logging instead of returning any
/// failure. The file is closed before this returns.
pub fn write_attribute<T: Display>(path: &Path, value: T) {
    if let Err(e) = try_write_attribute(path, value) {
        log::error!("{}", e);
    }
}

fn try_write_attribute<T: Display>(path: &Path, value: T) -> Result<(), AttributeError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| AttributeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    write!(file, "{}", value).map_err(|source| AttributeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// A read-only attribute that signals changes through `POLLPRI`/`POLLERR`,
/// the way sysfs nodes notify via `sysfs_notify()`.
#[cfg(unix)]
pub struct PolledAttribute {
    file: File,
}

#[cfg(unix)]
impl PolledAttribute {
    pub fn open(path: &Path) -> Result<Self, AttributeError> {
        let file = File::open(path).map_err(|source| AttributeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { file })
    }
}

#[cfg(unix)]
impl crate::watcher::AttributeSource for PolledAttribute {
    fn wait(&mut self) -> io::Result<crate::watcher::Readiness> {
        use std::os::fd::AsRawFd;

        let mut pollfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLERR | libc::POLLPRI,
            revents: 0,
        };

        let ret = unsafe { libc::poll(&mut pollfd, 1, -1) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(crate::watcher::Readiness::Changed)
    }

    fn read_state(&mut self) -> io::Result<bool> {
        read_bool(&mut self.file)
    }
}

/// Rewind and read the first byte; anything other than `'0'` is on.
fn read_bool<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    reader.seek(SeekFrom::Start(0))?;
    let mut c = [0u8; 1];
    reader.read_exact(&mut c)?;
    Ok(c[0] != b'0')
}
