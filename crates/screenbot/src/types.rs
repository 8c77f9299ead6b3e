//! Common types shared by providers, the dispatcher and callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A position on the screen, always in full-screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box given by its top-left and bottom-right corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Smallest box containing every point. `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bbox.x1 = bbox.x1.min(p.x);
            bbox.y1 = bbox.y1.min(p.y);
            bbox.x2 = bbox.x2.max(p.x);
            bbox.y2 = bbox.y2.max(p.y);
        }
        Some(bbox)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        BoundingBox::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }
}

/// One recognized text region matching a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    pub x: i32,
    pub y: i32,
    pub bounding_box: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

impl TextMatch {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMatch {
    pub x: i32,
    pub y: i32,
    pub class_name: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl ObjectMatch {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Sub-rectangle of the screen that perception is restricted to.
///
/// Written and parsed as `x,y,width,height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translate a region-relative point into full-screen space
    pub fn to_screen(&self, point: Point) -> Point {
        Point::new(point.x + self.x, point.y + self.y)
    }
}

impl fmt::Display for ScreenRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}, y={}, width={}, height={}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl FromStr for ScreenRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
        if parts.len() != 4 {
            return Err(format!(
                "expected 'x,y,width,height', got {} value(s)",
                parts.len()
            ));
        }
        let x = parts[0]
            .parse::<i32>()
            .map_err(|e| format!("invalid x '{}': {e}", parts[0]))?;
        let y = parts[1]
            .parse::<i32>()
            .map_err(|e| format!("invalid y '{}': {e}", parts[1]))?;
        let width = parts[2]
            .parse::<u32>()
            .map_err(|e| format!("invalid width '{}': {e}", parts[2]))?;
        let height = parts[3]
            .parse::<u32>()
            .map_err(|e| format!("invalid height '{}': {e}", parts[3]))?;
        if width == 0 || height == 0 {
            return Err("region width and height must be positive".to_string());
        }
        Ok(ScreenRegion::new(x, y, width, height))
    }
}
