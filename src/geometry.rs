use crate::properties::{get_int_list, PropertyStore};

pub const LOCATION_PROPERTY: &str = "persist.vendor.sys.fp.fod.location.X_Y";
pub const SIZE_PROPERTY: &str = "persist.vendor.sys.fp.fod.size.width_height";

pub const DEFAULT_X: i32 = 445;
pub const DEFAULT_Y: i32 = 1910;
pub const DEFAULT_SIZE: i32 = 190;

/// Location and diameter of the fingerprint touch target, in panel pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub x: i32,
    pub y: i32,
    pub size: i32,
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            x: DEFAULT_X,
            y: DEFAULT_Y,
            size: DEFAULT_SIZE,
        }
    }
}

impl OverlayGeometry {
    pub fn from_properties(props: &dyn PropertyStore) -> Self {
        let location = get_int_list(props, LOCATION_PROPERTY, &[DEFAULT_X, DEFAULT_Y]);
        let dims = get_int_list(props, SIZE_PROPERTY, &[DEFAULT_SIZE, DEFAULT_SIZE]);

        let (width, height) = (dims[0], dims[1]);
        if width != height {
            log::warn!(
                "FoD size should be square but it is not (width = {}, height = {})",
                width,
                height
            );
        }

        let geometry = Self {
            x: location[0],
            y: location[1],
            size: width.max(height),
        };

        log::info!(
            "FoD is located at {},{} with size {} pixels",
            geometry.x,
            geometry.y,
            geometry.size
        );

        geometry
    }
}
