use poolviz_core::Point;
use serde::{Deserialize, Serialize};

/// Whether a vertex is a sharp corner or a smooth curve joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    #[default]
    Corner,
    Smooth,
}

/// A mask vertex in image space.
///
/// `h1` is the incoming bezier handle and `h2` the outgoing one. Both are
/// absolute image-space positions, so the whole point moves as a unit under
/// translation and is invariant under pan/zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub kind: PointKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2: Option<Point>,
}

impl MaskPoint {
    /// Creates a corner point without handles.
    pub fn corner(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            kind: PointKind::Corner,
            h1: None,
            h2: None,
        }
    }

    /// Creates a smooth point with both handles.
    pub fn smooth(x: f64, y: f64, h1: Point, h2: Point) -> Self {
        Self {
            x,
            y,
            kind: PointKind::Smooth,
            h1: Some(h1),
            h2: Some(h2),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.position().is_finite()
            && self.h1.is_none_or(|h| h.is_finite())
            && self.h2.is_none_or(|h| h.is_finite())
    }

    /// Applies `f` to the anchor and both handles.
    pub fn map(&self, f: impl Fn(&Point) -> Point) -> Self {
        let anchor = f(&self.position());
        Self {
            x: anchor.x,
            y: anchor.y,
            kind: self.kind,
            h1: self.h1.as_ref().map(&f),
            h2: self.h2.as_ref().map(&f),
        }
    }

    /// Moves the anchor to `to`, carrying the handles along.
    pub fn moved_to(&self, to: Point) -> Self {
        let dx = to.x - self.x;
        let dy = to.y - self.y;
        self.map(|p| p.translated(dx, dy))
    }
}

impl From<Point> for MaskPoint {
    fn from(p: Point) -> Self {
        Self::corner(p.x, p.y)
    }
}
