use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback is dead")]
    DeadObject,
}

/// Framework-side sink for finger presence on the overlay.
pub trait InscreenCallback: Send + Sync {
    fn on_finger_down(&self) -> Result<(), CallbackError>;
    fn on_finger_up(&self) -> Result<(), CallbackError>;
}
