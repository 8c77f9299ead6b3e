use crate::errors::ProviderError;
use crate::types::ScreenRegion;
use image::{imageops, RgbaImage};
use tracing::debug;

/// Source of screen pixels
pub trait ScreenCapture: Send + Sync {
    /// Capture the full screen, or only `region` (in screen coordinates)
    fn capture(&self, region: Option<ScreenRegion>) -> Result<RgbaImage, ProviderError>;
}

/// Primary-monitor capture through `xcap`
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapCapture;

impl ScreenCapture for XcapCapture {
    fn capture(&self, region: Option<ScreenRegion>) -> Result<RgbaImage, ProviderError> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| ProviderError::CaptureUnavailable(format!("Failed to get monitors: {e}")))?;

        let mut primary = None;
        for monitor in monitors {
            if monitor.is_primary().unwrap_or(false) {
                primary = Some(monitor);
                break;
            }
        }
        let monitor = primary.ok_or_else(|| {
            ProviderError::CaptureUnavailable("Could not find primary monitor".to_string())
        })?;

        let image = monitor.capture_image().map_err(|e| {
            ProviderError::CaptureUnavailable(format!("Failed to capture screen: {e}"))
        })?;

        let Some(region) = region else {
            return Ok(image);
        };
        let origin_x = monitor.x().unwrap_or(0);
        let origin_y = monitor.y().unwrap_or(0);
        crop(&image, region, origin_x, origin_y)
    }
}

/// Cut `region` out of a capture whose top-left pixel sits at
/// (`origin_x`, `origin_y`) in screen space.
pub fn crop(
    image: &RgbaImage,
    region: ScreenRegion,
    origin_x: i32,
    origin_y: i32,
) -> Result<RgbaImage, ProviderError> {
    let left = (region.x - origin_x).max(0) as u32;
    let top = (region.y - origin_y).max(0) as u32;
    if left >= image.width() || top >= image.height() {
        return Err(ProviderError::InvalidArgument(format!(
            "region {region} lies outside the {}x{} capture",
            image.width(),
            image.height()
        )));
    }
    let width = region.width.min(image.width() - left);
    let height = region.height.min(image.height() - top);
    debug!(left, top, width, height, "Cropping capture to region");
    Ok(imageops::crop_imm(image, left, top, width, height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_crop_inside_capture() {
        let mut image = RgbaImage::new(100, 80);
        image.put_pixel(20, 10, Rgba([255, 0, 0, 255]));

        let cropped = crop(&image, ScreenRegion::new(20, 10, 30, 30), 0, 0).unwrap();
        assert_eq!(cropped.dimensions(), (30, 30));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_clamps_to_capture() {
        let image = RgbaImage::new(100, 80);
        let cropped = crop(&image, ScreenRegion::new(90, 70, 50, 50), 0, 0).unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));
    }

    #[test]
    fn test_crop_respects_monitor_origin() {
        let mut image = RgbaImage::new(100, 80);
        image.put_pixel(5, 5, Rgba([0, 255, 0, 255]));
        let cropped = crop(&image, ScreenRegion::new(1925, 5, 10, 10), 1920, 0).unwrap();
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_crop_outside_capture_fails() {
        let image = RgbaImage::new(100, 80);
        assert!(matches!(
            crop(&image, ScreenRegion::new(500, 0, 10, 10), 0, 0),
            Err(ProviderError::InvalidArgument(_))
        ));
    }
}
