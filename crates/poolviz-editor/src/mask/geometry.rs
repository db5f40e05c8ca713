//! Polygon geometry over mask outlines.
//!
//! Curved segments are flattened with lyon before any measurement, so area,
//! perimeter and hit-testing all agree with what the renderer fills.

use lyon::geom::{point, CubicBezierSegment};
use poolviz_core::{Bounds, Point};

use super::MaskPoint;

/// Flattening tolerance in image pixels.
pub const FLATTEN_TOLERANCE: f64 = 0.25;

/// One edge of a closed mask outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        from: Point,
        to: Point,
    },
    Cubic {
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
}

/// Edges of the closed outline through `points`.
///
/// An edge is cubic when its start has an outgoing handle or its end has an
/// incoming handle; a missing handle collapses onto its anchor.
pub fn segments(points: &[MaskPoint]) -> Vec<Segment> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            if a.h2.is_some() || b.h1.is_some() {
                Segment::Cubic {
                    from: a.position(),
                    ctrl1: a.h2.unwrap_or(a.position()),
                    ctrl2: b.h1.unwrap_or(b.position()),
                    to: b.position(),
                }
            } else {
                Segment::Line {
                    from: a.position(),
                    to: b.position(),
                }
            }
        })
        .collect()
}

/// Flattened outline (without repeating the first point at the end).
pub fn flatten(points: &[MaskPoint], tolerance: f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(points.len());
    for segment in segments(points) {
        match segment {
            Segment::Line { from, .. } => out.push(from),
            Segment::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
            } => {
                out.push(from);
                let curve = CubicBezierSegment {
                    from: point(from.x, from.y),
                    ctrl1: point(ctrl1.x, ctrl1.y),
                    ctrl2: point(ctrl2.x, ctrl2.y),
                    to: point(to.x, to.y),
                };
                // the iterator ends on `to`, which is the next segment's `from`
                let mut flattened: Vec<Point> = curve
                    .flattened(tolerance)
                    .map(|p| Point::new(p.x, p.y))
                    .collect();
                flattened.pop();
                out.extend(flattened);
            }
        }
    }
    if out.is_empty() {
        out.extend(points.iter().map(MaskPoint::position));
    }
    out
}

/// Signed shoelace area; positive for clockwise outlines in y-down space.
pub fn signed_area(outline: &[Point]) -> f64 {
    let n = outline.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Absolute shoelace area.
pub fn area(outline: &[Point]) -> f64 {
    signed_area(outline).abs()
}

/// Length of the closed outline.
pub fn perimeter(outline: &[Point]) -> f64 {
    let n = outline.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| outline[i].distance_to(&outline[(i + 1) % n]))
        .sum()
}

/// Area centroid, falling back to the bounding-box center for degenerate outlines.
pub fn centroid(outline: &[Point]) -> Option<Point> {
    let bounds = Bounds::from_points(outline)?;
    let a = signed_area(outline);
    if a.abs() < 1e-9 {
        return Some(bounds.center());
    }
    let n = outline.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let p = outline[i];
        let q = outline[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Point::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Even-odd ray-cast containment.
pub fn contains(outline: &[Point], p: &Point) -> bool {
    let n = outline.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (outline[i].x, outline[i].y);
        let (xj, yj) = (outline[j].x, outline[j].y);
        if ((yi > p.y) != (yj > p.y)) && (p.x < (xj - xi) * (p.y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}
