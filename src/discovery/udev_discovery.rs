use super::{
    DeviceDiscovery, DiscoveryError, FodDevices, DISPLAY_SYSNAME, TOUCH_SUBSYSTEM, TOUCH_SYSNAME,
};
use std::path::PathBuf;

pub struct UdevDiscovery;

impl UdevDiscovery {
    fn find_syspath(
        subsystem: &str,
        sysname: &str,
        what: &'static str,
    ) -> Result<PathBuf, DiscoveryError> {
        let mut enumerator =
            udev::Enumerator::new().map_err(|e| DiscoveryError::UdevError(e.to_string()))?;

        enumerator
            .match_subsystem(subsystem)
            .map_err(|e| DiscoveryError::UdevError(e.to_string()))?;

        enumerator
            .match_sysname(sysname)
            .map_err(|e| DiscoveryError::UdevError(e.to_string()))?;

        enumerator
            .scan_devices()
            .map_err(|e| DiscoveryError::UdevError(e.to_string()))?
            .next()
            .map(|device| device.syspath().to_path_buf())
            .ok_or(DiscoveryError::NotFound(what))
    }
}

impl DeviceDiscovery for UdevDiscovery {
    fn find_fod_devices() -> Result<FodDevices, DiscoveryError> {
        let display = Self::find_syspath("platform", DISPLAY_SYSNAME, "display panel")?;
        let touch = Self::find_syspath(TOUCH_SUBSYSTEM, TOUCH_SYSNAME, "touch panel")?;

        log::debug!(
            "discovered display {} and touch {}",
            display.display(),
            touch.display()
        );

        Ok(FodDevices { display, touch })
    }
}
