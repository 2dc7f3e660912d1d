//! Background relay from the kernel `fod_ui` node to the vendor service.
//!
//! The thread opens the attribute once, then blocks until the driver signals a
//! change, reads the new state and forwards it as a `COMMAND_NIT` request. An
//! open failure ends the thread for good; a failed wait is logged and waited
//! on again.

use crate::sysfs::AttributeError;
use crate::vendor::protocol::{nit_param, COMMAND_NIT};
use crate::vendor::VendorFingerprint;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Changed,
    /// The source will never signal again. `PolledAttribute` never reports
    /// this; channel-driven sources use it to end the loop.
    Closed,
}

pub trait AttributeSource: Send + 'static {
    /// Block until the attribute changes.
    fn wait(&mut self) -> io::Result<Readiness>;
    fn read_state(&mut self) -> io::Result<bool>;
}

/// Spawn the watcher thread. `open` runs on the new thread.
pub fn spawn_watcher<S, F>(
    open: F,
    vendor: Arc<dyn VendorFingerprint>,
) -> io::Result<JoinHandle<()>>
where
    S: AttributeSource,
    F: FnOnce() -> Result<S, AttributeError> + Send + 'static,
{
    thread::Builder::new()
        .name("fod-ui-watcher".into())
        .spawn(move || {
            let source = match open() {
                Ok(s) => s,
                Err(e) => {
                    log::error!("fod_ui watcher stopped: {}", e);
                    return;
                }
            };
            run_watcher(source, &*vendor);
        })
}

pub fn run_watcher<S: AttributeSource>(mut source: S, vendor: &dyn VendorFingerprint) {
    loop {
        match source.wait() {
            Ok(Readiness::Changed) => {}
            Ok(Readiness::Closed) => {
                log::debug!("fod_ui source closed");
                return;
            }
            Err(e) => {
                log::error!("failed to poll fod_ui: {}", e);
                continue;
            }
        }

        let on = match source.read_state() {
            Ok(on) => on,
            Err(e) => {
                log::error!("failed to read fod_ui: {}", e);
                false
            }
        };

        log::debug!("fod_ui changed, on = {}", on);
        if let Err(e) = vendor.ext_cmd(COMMAND_NIT, nit_param(on)) {
            log::debug!("ext_cmd({}) failed: {}", COMMAND_NIT, e);
        }
    }
}
