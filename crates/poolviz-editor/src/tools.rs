//! Drawing tool state machine.
//!
//! Tools receive pointer events already converted to image space and report
//! what the editor should do with them. A draft only becomes a mask through an
//! explicit commit (Enter or a tool switch) and only with at least three points.

use std::fmt;

use poolviz_core::constants::MIN_POLYGON_POINTS;
use poolviz_core::Point;

use crate::mask::MaskPoint;

/// Active editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    AreaDrawing,
    FreehandDrawing,
    CalibrationMeasuring,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Select => "select",
            Tool::AreaDrawing => "area-drawing",
            Tool::FreehandDrawing => "freehand-drawing",
            Tool::CalibrationMeasuring => "calibration-measuring",
        };
        f.write_str(name)
    }
}

/// Discrete input delivered to the active tool. Positions are image-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Commit,
    Cancel,
    SwitchTool(Tool),
}

/// What the editor should do after a tool event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    None,
    /// A finished outline ready to become a mask.
    CommitPolygon(Vec<MaskPoint>),
    /// Hit-test and select at this image point.
    SelectAt(Point),
    /// Both calibration points are placed.
    CalibrationReady(Point, Point),
    /// An unfinished draft was thrown away.
    DraftDiscarded,
}

/// Tool state: the active tool plus any in-progress draft.
#[derive(Debug, Clone)]
pub struct ToolState {
    tool: Tool,
    draft: Vec<MaskPoint>,
    stroke_active: bool,
    calibration_points: Vec<Point>,
    freehand_min_spacing: f64,
}

impl ToolState {
    pub fn new(freehand_min_spacing: f64) -> Self {
        Self {
            tool: Tool::Select,
            draft: Vec::new(),
            stroke_active: false,
            calibration_points: Vec::new(),
            freehand_min_spacing: freehand_min_spacing.max(0.0),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Points of the in-progress outline.
    pub fn draft(&self) -> &[MaskPoint] {
        &self.draft
    }

    /// Calibration points placed so far (0 or 1 between completions).
    pub fn calibration_points(&self) -> &[Point] {
        &self.calibration_points
    }

    pub fn is_drawing(&self) -> bool {
        !self.draft.is_empty()
    }

    pub fn handle(&mut self, event: ToolEvent) -> ToolOutcome {
        match event {
            ToolEvent::SwitchTool(next) => self.switch_to(next),
            ToolEvent::Cancel => {
                self.stroke_active = false;
                self.calibration_points.clear();
                if self.draft.is_empty() {
                    ToolOutcome::None
                } else {
                    self.draft.clear();
                    ToolOutcome::DraftDiscarded
                }
            }
            ToolEvent::Commit => self.commit(),
            ToolEvent::PointerDown(p) => self.pointer_down(p),
            ToolEvent::PointerMove(p) => {
                if self.tool == Tool::FreehandDrawing && self.stroke_active {
                    self.push_freehand(p);
                }
                ToolOutcome::None
            }
            ToolEvent::PointerUp(p) => {
                if self.tool == Tool::FreehandDrawing && self.stroke_active {
                    self.push_freehand(p);
                    self.stroke_active = false;
                }
                ToolOutcome::None
            }
        }
    }

    fn pointer_down(&mut self, p: Point) -> ToolOutcome {
        match self.tool {
            Tool::Select => ToolOutcome::SelectAt(p),
            Tool::AreaDrawing => {
                self.draft.push(MaskPoint::corner(p.x, p.y));
                ToolOutcome::None
            }
            Tool::FreehandDrawing => {
                self.stroke_active = true;
                self.push_freehand(p);
                ToolOutcome::None
            }
            Tool::CalibrationMeasuring => {
                self.calibration_points.push(p);
                if self.calibration_points.len() == 2 {
                    let (a, b) = (self.calibration_points[0], self.calibration_points[1]);
                    self.calibration_points.clear();
                    ToolOutcome::CalibrationReady(a, b)
                } else {
                    ToolOutcome::None
                }
            }
        }
    }

    fn push_freehand(&mut self, p: Point) {
        let far_enough = self
            .draft
            .last()
            .is_none_or(|last| last.position().distance_to(&p) >= self.freehand_min_spacing);
        if far_enough {
            self.draft.push(MaskPoint::corner(p.x, p.y));
        }
    }

    fn commit(&mut self) -> ToolOutcome {
        if self.draft.len() < MIN_POLYGON_POINTS {
            return ToolOutcome::None;
        }
        self.stroke_active = false;
        ToolOutcome::CommitPolygon(std::mem::take(&mut self.draft))
    }

    fn switch_to(&mut self, next: Tool) -> ToolOutcome {
        self.stroke_active = false;
        self.calibration_points.clear();
        self.tool = next;
        if self.draft.len() >= MIN_POLYGON_POINTS {
            ToolOutcome::CommitPolygon(std::mem::take(&mut self.draft))
        } else if self.draft.is_empty() {
            ToolOutcome::None
        } else {
            self.draft.clear();
            ToolOutcome::DraftDiscarded
        }
    }
}

impl Default for ToolState {
    fn default() -> Self {
        Self::new(poolviz_core::constants::FREEHAND_MIN_SPACING)
    }
}
