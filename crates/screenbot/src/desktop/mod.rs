//! Real-desktop provider
//!
//! Capture goes through `xcap`, input through `rdev`. Text recognition and
//! object detection are pluggable: the provider works with whatever
//! [`TextRecognizer`] / [`ObjectDetector`] it is given and reports a fatal
//! [`ProviderError::RecognizerUnavailable`] when a command needs one it lacks.

mod capture;
mod input;
mod keys;

pub use capture::{crop, ScreenCapture, XcapCapture};
pub use input::{InputDriver, RdevInput};
pub use keys::{key_for_char, key_from_name};

use crate::errors::ProviderError;
use crate::provider::ScreenProvider;
use crate::types::{BoundingBox, ObjectMatch, Point, ScreenRegion, TextMatch};
use image::RgbaImage;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// One text region as reported by a recognizer, in capture-image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Corner points of the (possibly rotated) text box
    pub quad: [Point; 4],
    pub confidence: f32,
}

/// One detection as reported by a detector, in capture-image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub bounding_box: BoundingBox,
    pub confidence: f32,
}

pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<RecognizedText>, ProviderError>;
}

pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &RgbaImage) -> Result<Vec<Detection>, ProviderError>;
}

pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

pub struct DesktopProvider {
    capture: Arc<dyn ScreenCapture>,
    input: Arc<dyn InputDriver>,
    text_recognizer: Option<Arc<dyn TextRecognizer>>,
    object_detector: Option<Arc<dyn ObjectDetector>>,
    region: RwLock<Option<ScreenRegion>>,
    min_confidence: f32,
}

impl Default for DesktopProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopProvider {
    pub fn new() -> Self {
        Self {
            capture: Arc::new(XcapCapture),
            input: Arc::new(RdevInput::default()),
            text_recognizer: None,
            object_detector: None,
            region: RwLock::new(None),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_capture(mut self, capture: Arc<dyn ScreenCapture>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_input(mut self, input: Arc<dyn InputDriver>) -> Self {
        self.input = input;
        self
    }

    pub fn with_text_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.text_recognizer = Some(recognizer);
        self
    }

    pub fn with_object_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.object_detector = Some(detector);
        self
    }

    pub fn with_region(self, region: Option<ScreenRegion>) -> Self {
        self.set_region(region);
        self
    }

    /// Object detections below this confidence are dropped
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn region(&self) -> Option<ScreenRegion> {
        *self.region.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Restrict perception to `region`; `None` means the full screen
    pub fn set_region(&self, region: Option<ScreenRegion>) {
        match region {
            Some(r) => info!("Screen region set to {}", r),
            None => info!("Screen region cleared, using full screen"),
        }
        *self.region.write().unwrap_or_else(|e| e.into_inner()) = region;
    }

    pub fn clear_region(&self) {
        self.set_region(None);
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    async fn blocking<T, F>(&self, what: &'static str, f: F) -> Result<T, ProviderError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| ProviderError::Internal(format!("{what} task failed: {e}")))?
    }
}

/// Case-insensitive substring matches in recognition order, translated to
/// screen space.
pub fn match_text(
    recognized: &[RecognizedText],
    query: &str,
    region: Option<ScreenRegion>,
) -> Vec<TextMatch> {
    let needle = query.to_lowercase();
    recognized
        .iter()
        .filter(|r| r.text.to_lowercase().contains(&needle))
        .map(|r| {
            let sum_x: i32 = r.quad.iter().map(|p| p.x).sum();
            let sum_y: i32 = r.quad.iter().map(|p| p.y).sum();
            let center = Point::new(sum_x / 4, sum_y / 4);
            // quad always has four points
            let bbox = BoundingBox::enclosing(&r.quad)
                .unwrap_or_else(|| BoundingBox::new(center.x, center.y, center.x, center.y));
            let (center, bbox) = match region {
                Some(region) => (region.to_screen(center), bbox.offset(region.x, region.y)),
                None => (center, bbox),
            };
            TextMatch {
                x: center.x,
                y: center.y,
                bounding_box: bbox,
                text: r.text.clone(),
                confidence: r.confidence,
            }
        })
        .collect()
}

/// Detections whose class contains `class_query` (all when `None`) and whose
/// confidence reaches `min_confidence`, translated to screen space.
pub fn match_objects(
    detections: &[Detection],
    class_query: Option<&str>,
    min_confidence: f32,
    region: Option<ScreenRegion>,
) -> Vec<ObjectMatch> {
    let needle = class_query.map(str::to_lowercase);
    detections
        .iter()
        .filter(|d| d.confidence >= min_confidence)
        .filter(|d| match &needle {
            Some(needle) => d.class_name.to_lowercase().contains(needle),
            None => true,
        })
        .map(|d| {
            let bbox = match region {
                Some(region) => d.bounding_box.offset(region.x, region.y),
                None => d.bounding_box,
            };
            let center = bbox.center();
            ObjectMatch {
                x: center.x,
                y: center.y,
                class_name: d.class_name.clone(),
                confidence: d.confidence,
                bounding_box: bbox,
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ScreenProvider for DesktopProvider {
    async fn locate_text(&self, query: &str) -> Result<Vec<TextMatch>, ProviderError> {
        let recognizer = self.text_recognizer.clone().ok_or_else(|| {
            ProviderError::RecognizerUnavailable("no text recognizer configured".to_string())
        })?;
        let capture = self.capture.clone();
        let region = self.region();

        let recognized = self
            .blocking("text recognition", move || {
                let image = capture.capture(region)?;
                recognizer.recognize(&image)
            })
            .await?;
        debug!("Recognized {} text region(s)", recognized.len());

        Ok(match_text(&recognized, query, region))
    }

    async fn locate_objects(
        &self,
        class_query: Option<&str>,
    ) -> Result<Vec<ObjectMatch>, ProviderError> {
        let detector = self.object_detector.clone().ok_or_else(|| {
            ProviderError::RecognizerUnavailable("no object detector configured".to_string())
        })?;
        let capture = self.capture.clone();
        let region = self.region();

        let detections = self
            .blocking("object detection", move || {
                let image = capture.capture(region)?;
                detector.detect(&image)
            })
            .await?;
        debug!("Detected {} object(s)", detections.len());

        Ok(match_objects(
            &detections,
            class_query,
            self.min_confidence,
            region,
        ))
    }

    async fn click(&self, x: i32, y: i32) -> Result<(), ProviderError> {
        let input = self.input.clone();
        self.blocking("click", move || input.click(x, y)).await?;
        info!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<(), ProviderError> {
        let input = self.input.clone();
        self.blocking("mouse move", move || input.move_to(x, y))
            .await
    }

    async fn type_text(&self, text: &str) -> Result<(), ProviderError> {
        let input = self.input.clone();
        let owned = text.to_string();
        self.blocking("typing", move || input.type_text(&owned))
            .await?;
        info!("Typed: {}", text);
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), ProviderError> {
        let input = self.input.clone();
        let owned = key.to_string();
        self.blocking("key press", move || input.press_key(&owned))
            .await?;
        info!("Pressed key: {}", key);
        Ok(())
    }

    async fn capture_region(&self) -> Result<RgbaImage, ProviderError> {
        let capture = self.capture.clone();
        let region = self.region();
        self.blocking("capture", move || capture.capture(region))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn quad(x1: i32, y1: i32, x2: i32, y2: i32) -> [Point; 4] {
        [
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ]
    }

    fn recognized(text: &str, q: [Point; 4], confidence: f32) -> RecognizedText {
        RecognizedText {
            text: text.to_string(),
            quad: q,
            confidence,
        }
    }

    struct BlankCapture;

    impl ScreenCapture for BlankCapture {
        fn capture(&self, _region: Option<ScreenRegion>) -> Result<RgbaImage, ProviderError> {
            Ok(RgbaImage::new(4, 4))
        }
    }

    struct StaticRecognizer(Vec<RecognizedText>);

    impl TextRecognizer for StaticRecognizer {
        fn recognize(&self, _image: &RgbaImage) -> Result<Vec<RecognizedText>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingInput {
        clicks: Mutex<Vec<(i32, i32)>>,
    }

    impl InputDriver for RecordingInput {
        fn move_to(&self, _x: i32, _y: i32) -> Result<(), ProviderError> {
            Ok(())
        }
        fn click(&self, x: i32, y: i32) -> Result<(), ProviderError> {
            self.clicks.lock().unwrap().push((x, y));
            Ok(())
        }
        fn type_text(&self, _text: &str) -> Result<(), ProviderError> {
            Ok(())
        }
        fn press_key(&self, _key: &str) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[test]
    fn test_match_text_substring_case_insensitive() {
        let all = vec![
            recognized("Cancel", quad(10, 10, 50, 30), 0.9),
            recognized("OK", quad(100, 10, 120, 30), 0.95),
            recognized("cancel order", quad(10, 100, 90, 120), 0.8),
        ];
        let found = match_text(&all, "CANCEL", None);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].x, found[0].y), (30, 20));
        assert_eq!(found[1].text, "cancel order");
        assert_eq!(found[0].bounding_box, BoundingBox::new(10, 10, 50, 30));
    }

    #[test]
    fn test_match_text_region_offset() {
        let all = vec![
            recognized("close", quad(0, 0, 20, 10), 0.4),
            recognized("close", quad(40, 40, 60, 50), 0.9),
        ];
        let region = ScreenRegion::new(100, 200, 300, 300);
        let found = match_text(&all, "close", Some(region));
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].x, found[0].y), (110, 205));
        assert_eq!((found[1].x, found[1].y), (150, 245));
        assert_eq!(found[1].bounding_box, BoundingBox::new(140, 240, 160, 250));
    }

    #[test]
    fn test_match_objects_filters_by_class() {
        let detections = vec![
            Detection {
                class_name: "person".to_string(),
                bounding_box: BoundingBox::new(0, 0, 10, 20),
                confidence: 0.9,
            },
            Detection {
                class_name: "cell phone".to_string(),
                bounding_box: BoundingBox::new(50, 50, 70, 90),
                confidence: 0.7,
            },
        ];
        assert_eq!(match_objects(&detections, None, 0.0, None).len(), 2);
        assert_eq!(match_objects(&detections, None, 0.8, None).len(), 1);

        let phones = match_objects(&detections, Some("Phone"), 0.0, None);
        assert_eq!(phones.len(), 1);
        assert_eq!((phones[0].x, phones[0].y), (60, 70));

        let region = ScreenRegion::new(5, 5, 100, 100);
        let people = match_objects(&detections, Some("person"), 0.0, Some(region));
        assert_eq!((people[0].x, people[0].y), (10, 15));
    }

    #[tokio::test]
    async fn test_missing_recognizer_is_fatal() {
        let provider = DesktopProvider::new().with_capture(Arc::new(BlankCapture));
        let err = provider.locate_text("ok").await.unwrap_err();
        assert!(err.is_fatal());
        let err = provider.locate_objects(None).await.unwrap_err();
        assert!(matches!(err, ProviderError::RecognizerUnavailable(_)));
    }

    #[tokio::test]
    async fn test_locate_and_click_through_fakes() {
        let input = Arc::new(RecordingInput::default());
        let provider = DesktopProvider::new()
            .with_capture(Arc::new(BlankCapture))
            .with_input(input.clone())
            .with_text_recognizer(Arc::new(StaticRecognizer(vec![recognized(
                "Submit",
                quad(0, 0, 40, 20),
                0.99,
            )])))
            .with_region(Some(ScreenRegion::new(10, 10, 200, 200)));

        let found = provider.locate_text("submit").await.unwrap();
        assert_eq!(found.len(), 1);
        provider.click(found[0].x, found[0].y).await.unwrap();
        assert_eq!(*input.clicks.lock().unwrap(), vec![(30, 20)]);

        provider.clear_region();
        assert_eq!(provider.region(), None);
        let found = provider.locate_text("submit").await.unwrap();
        assert_eq!((found[0].x, found[0].y), (20, 10));
    }
}
