use crate::errors::ProviderError;
use crate::types::{ObjectMatch, TextMatch};
use image::RgbaImage;

/// The perception/actuation capability set the dispatcher drives.
///
/// Implementations serialize access to the screen and input devices
/// themselves; the engine only ever awaits one call at a time.
#[async_trait::async_trait]
pub trait ScreenProvider: Send + Sync {
    /// Case-insensitive substring match against every recognized text region
    /// of the current capture. Coordinates are in full-screen space.
    async fn locate_text(&self, query: &str) -> Result<Vec<TextMatch>, ProviderError>;

    /// All detections when `class_query` is `None`, otherwise only those whose
    /// class name contains the query (case-insensitive).
    async fn locate_objects(
        &self,
        class_query: Option<&str>,
    ) -> Result<Vec<ObjectMatch>, ProviderError>;

    async fn click(&self, x: i32, y: i32) -> Result<(), ProviderError>;

    async fn move_to(&self, x: i32, y: i32) -> Result<(), ProviderError>;

    async fn type_text(&self, text: &str) -> Result<(), ProviderError>;

    async fn press_key(&self, key: &str) -> Result<(), ProviderError>;

    /// Capture of the configured region (or the full screen)
    async fn capture_region(&self) -> Result<RgbaImage, ProviderError> {
        Err(ProviderError::UnsupportedOperation(
            "capture_region".to_string(),
        ))
    }
}
