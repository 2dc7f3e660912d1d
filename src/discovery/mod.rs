#[cfg(target_os = "linux")]
pub mod udev_discovery;

use crate::sysfs::AttributePaths;
use std::path::PathBuf;
use thiserror::Error;

pub const DISPLAY_SYSNAME: &str = "soc:qcom,dsi-display-primary";
pub const TOUCH_SUBSYSTEM: &str = "touch";
pub const TOUCH_SYSNAME: &str = "tp_dev";

#[derive(Debug, Clone)]
pub struct FodDevices {
    pub display: PathBuf,
    pub touch: PathBuf,
}

impl FodDevices {
    pub fn attribute_paths(&self) -> AttributePaths {
        AttributePaths::from_devices(&self.display, &self.touch)
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("udev error: {0}")]
    UdevError(String),
    #[error("no {0} device found")]
    NotFound(&'static str),
}

pub trait DeviceDiscovery {
    fn find_fod_devices() -> Result<FodDevices, DiscoveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn attribute_paths_from_devices() {
        let devices = FodDevices {
            display: PathBuf::from("/sys/devices/platform/soc/soc:qcom,dsi-display-primary"),
            touch: PathBuf::from("/sys/devices/virtual/touch/tp_dev"),
        };
        let paths = devices.attribute_paths();
        assert_eq!(paths, AttributePaths::with_root(Path::new("/sys")));
    }
}
