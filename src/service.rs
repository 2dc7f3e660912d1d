//! The in-display fingerprint overlay service exposed to the biometrics
//! framework.

use crate::callback::InscreenCallback;
use crate::geometry::OverlayGeometry;
use crate::properties::PropertyStore;
use crate::sysfs::{
    write_attribute, AttributePaths, FOD_PRESSED_OFF, FOD_PRESSED_ON, FOD_STATUS_OFF,
    FOD_STATUS_ON,
};
use crate::vendor::protocol::AcquiredEvent;
use crate::vendor::{VendorFingerprint, VendorLookup};
use crate::watcher::{self, AttributeSource};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("vendor fingerprint service is not available")]
    VendorUnavailable,
    #[error("failed to start fod_ui watcher: {0}")]
    Watcher(#[source] io::Error),
}

pub struct SensorOverlayService {
    geometry: OverlayGeometry,
    paths: AttributePaths,
    callback: Mutex<Option<Arc<dyn InscreenCallback>>>,
    watcher: JoinHandle<()>,
}

impl SensorOverlayService {
    /// Look up the vendor service and start. Fails when the vendor service
    /// cannot be obtained.
    #[cfg(unix)]
    pub fn connect(
        lookup: &dyn VendorLookup,
        props: &dyn PropertyStore,
        paths: AttributePaths,
    ) -> Result<Self, ServiceError> {
        let vendor = lookup.get_service().ok_or(ServiceError::VendorUnavailable)?;
        Self::new(vendor, props, paths)
    }

    /// Start with the watcher polling `paths.fod_ui`.
    #[cfg(unix)]
    pub fn new(
        vendor: Arc<dyn VendorFingerprint>,
        props: &dyn PropertyStore,
        paths: AttributePaths,
    ) -> Result<Self, ServiceError> {
        let fod_ui = paths.fod_ui.clone();
        Self::with_source(
            vendor,
            props,
            paths,
            move || crate::sysfs::PolledAttribute::open(&fod_ui),
        )
    }

    /// Start with a caller-provided `fod_ui` source, opened on the watcher
    /// thread.
    pub fn with_source<S, F>(
        vendor: Arc<dyn VendorFingerprint>,
        props: &dyn PropertyStore,
        paths: AttributePaths,
        open_source: F,
    ) -> Result<Self, ServiceError>
    where
        S: AttributeSource,
        F: FnOnce() -> Result<S, crate::sysfs::AttributeError> + Send + 'static,
    {
        let geometry = OverlayGeometry::from_properties(props);
        let watcher =
            watcher::spawn_watcher(open_source, vendor).map_err(ServiceError::Watcher)?;

        Ok(Self {
            geometry,
            paths,
            callback: Mutex::new(None),
            watcher,
        })
    }

    pub fn geometry(&self) -> OverlayGeometry {
        self.geometry
    }

    pub fn position_x(&self) -> i32 {
        self.geometry.x
    }

    pub fn position_y(&self) -> i32 {
        self.geometry.y
    }

    pub fn size(&self) -> i32 {
        self.geometry.size
    }

    pub fn paths(&self) -> &AttributePaths {
        &self.paths
    }

    /// Whether the watcher thread is still alive. It only exits when
    /// `fod_ui` could not be opened.
    pub fn watcher_running(&self) -> bool {
        !self.watcher.is_finished()
    }

    pub fn on_start_enroll(&self) {}

    pub fn on_finish_enroll(&self) {}

    pub fn on_press(&self) {
        write_attribute(&self.paths.fod_pressed, FOD_PRESSED_ON);
    }

    pub fn on_release(&self) {
        write_attribute(&self.paths.fod_pressed, FOD_PRESSED_OFF);
    }

    pub fn on_show_fod_view(&self) {
        write_attribute(&self.paths.fod_status, FOD_STATUS_ON);
    }

    pub fn on_hide_fod_view(&self) {
        write_attribute(&self.paths.fod_status, FOD_STATUS_OFF);
    }

    /// Forward vendor finger down/up acquisitions to the registered callback.
    /// Returns whether the event was consumed.
    pub fn handle_acquired(&self, acquired_info: i32, vendor_code: i32) -> bool {
        let guard = self.callback.lock();
        let Some(callback) = guard.as_ref() else {
            return false;
        };

        match AcquiredEvent::from_codes(acquired_info, vendor_code) {
            Some(AcquiredEvent::FingerDown) => {
                if let Err(e) = callback.on_finger_down() {
                    log::error!("FingerDown() error: {}", e);
                }
                true
            }
            Some(AcquiredEvent::FingerUp) => {
                if let Err(e) = callback.on_finger_up() {
                    log::error!("FingerUp() error: {}", e);
                }
                true
            }
            None => false,
        }
    }

    pub fn handle_error(&self, error: i32, vendor_code: i32) -> bool {
        log::error!("error: {}, vendorCode: {}", error, vendor_code);
        false
    }

    pub fn set_long_press_enabled(&self, _enabled: bool) {}

    pub fn get_dim_amount(&self, _brightness: i32) -> i32 {
        0
    }

    pub fn should_boost_brightness(&self) -> bool {
        false
    }

    pub fn set_callback(&self, callback: Option<Arc<dyn InscreenCallback>>) {
        *self.callback.lock() = callback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallbackError;
    use crate::geometry::{LOCATION_PROPERTY, SIZE_PROPERTY};
    use crate::properties::MapProperties;
    use crate::watcher::tests::{FakeAttribute, RecordingVendor, Wake};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingCallback {
        down: AtomicUsize,
        up: AtomicUsize,
        fail: bool,
    }

    impl CountingCallback {
        fn counts(&self) -> (usize, usize) {
            (self.down.load(Ordering::SeqCst), self.up.load(Ordering::SeqCst))
        }

        fn result(&self) -> Result<(), CallbackError> {
            if self.fail {
                Err(CallbackError::DeadObject)
            } else {
                Ok(())
            }
        }
    }

    impl InscreenCallback for CountingCallback {
        fn on_finger_down(&self) -> Result<(), CallbackError> {
            self.down.fetch_add(1, Ordering::SeqCst);
            self.result()
        }

        fn on_finger_up(&self) -> Result<(), CallbackError> {
            self.up.fetch_add(1, Ordering::SeqCst);
            self.result()
        }
    }

    struct Harness {
        service: SensorOverlayService,
        wakes: mpsc::Sender<Wake>,
        vendor: Arc<RecordingVendor>,
        _root: TempDir,
    }

    fn harness(props: &MapProperties) -> Harness {
        let root = tempfile::tempdir().unwrap();
        let paths = AttributePaths::with_root(root.path());
        fs::create_dir_all(paths.fod_pressed.parent().unwrap()).unwrap();
        fs::create_dir_all(paths.fod_status.parent().unwrap()).unwrap();

        let vendor = Arc::new(RecordingVendor::default());
        let (wakes, source) = FakeAttribute::new();
        let service =
            SensorOverlayService::with_source(vendor.clone(), props, paths, move || Ok(source))
                .unwrap();

        Harness {
            service,
            wakes,
            vendor,
            _root: root,
        }
    }

    #[test]
    fn geometry_queries() {
        let mut props = MapProperties::new();
        props.set(LOCATION_PROPERTY, "100,200");
        props.set(SIZE_PROPERTY, "150,160");
        let h = harness(&props);

        assert_eq!(h.service.position_x(), 100);
        assert_eq!(h.service.position_y(), 200);
        assert_eq!(h.service.size(), 160);
    }

    #[test]
    fn geometry_defaults() {
        let h = harness(&MapProperties::new());
        assert_eq!(
            (h.service.position_x(), h.service.position_y(), h.service.size()),
            (445, 1910, 190)
        );
    }

    #[test]
    fn press_and_release_write_fod_pressed() {
        let h = harness(&MapProperties::new());
        let path = &h.service.paths().fod_pressed;

        h.service.on_press();
        assert_eq!(fs::read_to_string(path).unwrap(), "1");
        h.service.on_release();
        assert_eq!(fs::read_to_string(path).unwrap(), "0");
    }

    #[test]
    fn show_and_hide_write_fod_status() {
        let h = harness(&MapProperties::new());
        let path = &h.service.paths().fod_status;

        h.service.on_show_fod_view();
        assert_eq!(fs::read_to_string(path).unwrap(), "1");
        h.service.on_hide_fod_view();
        assert_eq!(fs::read_to_string(path).unwrap(), "0");
    }

    #[test]
    fn attribute_write_failure_is_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        let paths = AttributePaths::with_root(&root.path().join("missing"));
        let (_wakes, source) = FakeAttribute::new();
        let service = SensorOverlayService::with_source(
            Arc::new(RecordingVendor::default()),
            &MapProperties::new(),
            paths,
            move || Ok(source),
        )
        .unwrap();

        service.on_press();
        service.on_show_fod_view();
        assert!(!service.paths().fod_pressed.exists());
    }

    #[test]
    fn acquired_dispatch() {
        let h = harness(&MapProperties::new());
        let cb = Arc::new(CountingCallback::default());
        h.service.set_callback(Some(cb.clone()));

        assert!(h.service.handle_acquired(6, 22));
        assert_eq!(cb.counts(), (1, 0));
        assert!(h.service.handle_acquired(6, 23));
        assert_eq!(cb.counts(), (1, 1));
        assert!(!h.service.handle_acquired(6, 99));
        assert!(!h.service.handle_acquired(5, 22));
        assert_eq!(cb.counts(), (1, 1));
    }

    #[test]
    fn acquired_without_callback() {
        let h = harness(&MapProperties::new());
        for (info, code) in [(6, 22), (6, 23), (6, 99), (0, 0)] {
            assert!(!h.service.handle_acquired(info, code));
        }
    }

    #[test]
    fn failing_callback_still_handled() {
        let h = harness(&MapProperties::new());
        let cb = Arc::new(CountingCallback {
            fail: true,
            ..Default::default()
        });
        h.service.set_callback(Some(cb.clone()));

        assert!(h.service.handle_acquired(6, 22));
        assert!(h.service.handle_acquired(6, 23));
        assert_eq!(cb.counts(), (1, 1));
    }

    #[test]
    fn set_callback_replaces_and_clears() {
        let h = harness(&MapProperties::new());
        let first = Arc::new(CountingCallback::default());
        let second = Arc::new(CountingCallback::default());

        h.service.set_callback(Some(first.clone()));
        assert!(h.service.handle_acquired(6, 22));
        h.service.set_callback(Some(second.clone()));
        assert!(h.service.handle_acquired(6, 22));
        assert_eq!(first.counts(), (1, 0));
        assert_eq!(second.counts(), (1, 0));

        h.service.set_callback(None);
        assert!(!h.service.handle_acquired(6, 22));
        assert_eq!(second.counts(), (1, 0));
    }

    #[test]
    fn inert_capabilities() {
        let h = harness(&MapProperties::new());
        h.service.set_long_press_enabled(true);
        h.service.set_long_press_enabled(false);
        h.service.on_start_enroll();
        h.service.on_finish_enroll();
        for amount in [i32::MIN, -1, 0, 128, 255, i32::MAX] {
            assert_eq!(h.service.get_dim_amount(amount), 0);
        }
        assert!(!h.service.should_boost_brightness());
        assert!(!h.service.handle_error(1, 0));
        assert!(h.vendor.commands.lock().is_empty());
    }

    #[test]
    fn watcher_forwards_fod_ui() {
        let h = harness(&MapProperties::new());
        assert!(h.service.watcher_running());

        let Harness {
            service,
            wakes,
            vendor,
            _root,
        } = h;
        wakes.send(Wake::Value(b'1')).unwrap();
        wakes.send(Wake::Value(b'0')).unwrap();
        drop(wakes);
        service.watcher.join().unwrap();

        assert_eq!(*vendor.commands.lock(), vec![(10, 1), (10, 0)]);
    }

    #[cfg(unix)]
    #[test]
    fn missing_fod_ui_leaves_service_usable() {
        let root = tempfile::tempdir().unwrap();
        let paths = AttributePaths::with_root(root.path());
        fs::create_dir_all(paths.fod_pressed.parent().unwrap()).unwrap();

        let vendor = Arc::new(RecordingVendor::default());
        let service =
            SensorOverlayService::new(vendor.clone(), &MapProperties::new(), paths).unwrap();

        let cb = Arc::new(CountingCallback::default());
        service.set_callback(Some(cb.clone()));
        assert!(service.handle_acquired(6, 22));
        service.on_press();
        assert_eq!(fs::read_to_string(&service.paths().fod_pressed).unwrap(), "1");

        service.watcher.join().unwrap();
        assert!(vendor.commands.lock().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn connect_requires_vendor() {
        let lookup = || -> Option<Arc<dyn VendorFingerprint>> { None };
        let err = SensorOverlayService::connect(
            &lookup,
            &MapProperties::new(),
            AttributePaths::with_root(std::path::Path::new("/nonexistent")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ServiceError::VendorUnavailable));
    }
}
