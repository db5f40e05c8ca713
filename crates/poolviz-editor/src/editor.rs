//! Single-owner editor state.
//!
//! `EditorState` ties the camera, tools, mask store and calibration together.
//! Hosts feed it [`EditorAction`]s in client coordinates; every pointer
//! coordinate is validated and mapped to image space before it reaches a tool.

use poolviz_core::{EngineConfig, Point, PreconditionError, Result};
use tracing::debug;

use crate::calibration::CalibrationEngine;
use crate::coords::{self, ViewportBounds};
use crate::mask::Mask;
use crate::mask_store::{MaskAction, MaskEvent, MaskStore};
use crate::photo_space::{PhotoSpace, ZoomDirection};
use crate::tools::{Tool, ToolEvent, ToolOutcome, ToolState};

/// Input delivered to the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    LoadPhoto {
        width: u32,
        height: u32,
    },
    ResizeViewport(ViewportBounds),
    SetDpr(f64),
    Wheel {
        client_x: f64,
        client_y: f64,
        delta_y: f64,
        fast: bool,
    },
    ZoomIn,
    ZoomOut,
    SetZoomPercent(i32),
    FitToView,
    Pan {
        dx: f64,
        dy: f64,
    },
    PointerDown {
        client_x: f64,
        client_y: f64,
    },
    PointerMove {
        client_x: f64,
        client_y: f64,
    },
    PointerUp {
        client_x: f64,
        client_y: f64,
    },
    Commit,
    Cancel,
    SwitchTool(Tool),
    /// Completes calibration using the two placed points.
    Calibrate {
        length_m: f64,
    },
    Mask(MaskAction),
}

/// What changed after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Unchanged,
    PhotoLoaded,
    CameraChanged,
    DraftChanged,
    DraftDiscarded,
    CalibrationPointsPlaced,
    Calibrated { pixels_per_meter: f64 },
    Mask(MaskEvent),
}

/// A vertex being dragged in the select tool.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexDrag {
    pub mask_id: String,
    pub index: usize,
    pub position: Point,
}

pub struct EditorState {
    photo: Option<PhotoSpace>,
    viewport: ViewportBounds,
    dpr: f64,
    store: MaskStore,
    tools: ToolState,
    calibration: CalibrationEngine,
    pending_calibration: Option<(Point, Point)>,
    drag: Option<VertexDrag>,
    config: EngineConfig,
}

impl EditorState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            photo: None,
            viewport: ViewportBounds::default(),
            dpr: 1.0,
            store: MaskStore::new(config.history.max_depth),
            tools: ToolState::new(config.tools.freehand_min_spacing),
            calibration: CalibrationEngine::new(config.calibration.clone()),
            pending_calibration: None,
            drag: None,
            config,
        }
    }

    pub fn photo(&self) -> Option<&PhotoSpace> {
        self.photo.as_ref()
    }

    pub fn store(&self) -> &MaskStore {
        &self.store
    }

    /// Mutable store access for bulk loads.
    pub fn store_mut(&mut self) -> &mut MaskStore {
        &mut self.store
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut CalibrationEngine {
        &mut self.calibration
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn drag(&self) -> Option<&VertexDrag> {
        self.drag.as_ref()
    }

    pub fn pending_calibration(&self) -> Option<(Point, Point)> {
        self.pending_calibration
    }

    /// Pixels per meter for the loaded photo (heuristic when uncalibrated).
    pub fn pixels_per_meter(&self) -> Option<f64> {
        self.photo
            .as_ref()
            .map(|p| self.calibration.pixels_per_meter(p.image_size().0))
    }

    pub fn selected_mask(&self) -> Option<&Mask> {
        self.store.selected()
    }

    pub fn dispatch(&mut self, action: EditorAction) -> Result<EditorEvent> {
        match action {
            EditorAction::LoadPhoto { width, height } => {
                let space = PhotoSpace::new(
                    width,
                    height,
                    self.dpr,
                    self.viewport,
                    self.config.zoom.clone(),
                )?;
                debug!("Loaded photo {}x{}: {}", width, height, space);
                self.photo = Some(space);
                self.calibration.clear();
                self.pending_calibration = None;
                self.drag = None;
                Ok(EditorEvent::PhotoLoaded)
            }
            EditorAction::ResizeViewport(viewport) => {
                self.viewport = viewport;
                if let Some(photo) = self.photo.as_mut() {
                    photo.set_viewport(viewport);
                }
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::SetDpr(dpr) => {
                self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
                if let Some(photo) = self.photo.as_mut() {
                    photo.set_dpr(dpr);
                }
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::Wheel {
                client_x,
                client_y,
                delta_y,
                fast,
            } => {
                let cursor = coords::validate_finite(client_x, client_y)?;
                let photo = self.photo_mut()?;
                photo.zoom_at(
                    cursor.x,
                    cursor.y,
                    ZoomDirection::from_wheel_delta(delta_y),
                    fast,
                );
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::ZoomIn => {
                self.photo_mut()?.zoom_in();
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::ZoomOut => {
                self.photo_mut()?.zoom_out();
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::SetZoomPercent(percent) => {
                self.photo_mut()?.set_zoom_percent(percent);
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::FitToView => {
                self.photo_mut()?.fit_to_view();
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::Pan { dx, dy } => {
                coords::validate_finite(dx, dy)?;
                self.photo_mut()?.pan_by(dx, dy);
                Ok(EditorEvent::CameraChanged)
            }
            EditorAction::PointerDown { client_x, client_y } => {
                let p = self.to_image(client_x, client_y)?;
                if self.tools.tool() == Tool::Select {
                    if let Some(drag) = self.vertex_under(&p) {
                        self.drag = Some(drag);
                        return Ok(EditorEvent::DraftChanged);
                    }
                }
                let outcome = self.tools.handle(ToolEvent::PointerDown(p));
                self.apply_outcome(outcome)
            }
            EditorAction::PointerMove { client_x, client_y } => {
                let p = self.to_image(client_x, client_y)?;
                if let Some(drag) = self.drag.as_mut() {
                    drag.position = p;
                    return Ok(EditorEvent::DraftChanged);
                }
                let outcome = self.tools.handle(ToolEvent::PointerMove(p));
                self.apply_outcome(outcome)
            }
            EditorAction::PointerUp { client_x, client_y } => {
                let p = self.to_image(client_x, client_y)?;
                if let Some(drag) = self.drag.take() {
                    let event = self.store.apply(MaskAction::MovePoint {
                        id: drag.mask_id,
                        index: drag.index,
                        to: p,
                    })?;
                    return Ok(EditorEvent::Mask(event));
                }
                let outcome = self.tools.handle(ToolEvent::PointerUp(p));
                self.apply_outcome(outcome)
            }
            EditorAction::Commit => {
                let outcome = self.tools.handle(ToolEvent::Commit);
                self.apply_outcome(outcome)
            }
            EditorAction::Cancel => {
                self.drag = None;
                self.pending_calibration = None;
                let outcome = self.tools.handle(ToolEvent::Cancel);
                self.apply_outcome(outcome)
            }
            EditorAction::SwitchTool(tool) => {
                self.drag = None;
                self.pending_calibration = None;
                let outcome = self.tools.handle(ToolEvent::SwitchTool(tool));
                self.apply_outcome(outcome)
            }
            EditorAction::Calibrate { length_m } => self.calibrate(length_m),
            EditorAction::Mask(action) => Ok(EditorEvent::Mask(self.store.apply(action)?)),
        }
    }

    fn photo_mut(&mut self) -> Result<&mut PhotoSpace> {
        self.photo
            .as_mut()
            .ok_or_else(|| PreconditionError::NoPhotoLoaded.into())
    }

    fn to_image(&self, client_x: f64, client_y: f64) -> Result<Point> {
        let client = coords::validate_finite(client_x, client_y)?;
        let photo = self.photo.as_ref().ok_or(PreconditionError::NoPhotoLoaded)?;
        Ok(photo.screen_to_image(client.x, client.y))
    }

    /// Vertex of the selected mask under `p`, with the hit tolerance given in CSS pixels.
    fn vertex_under(&self, p: &Point) -> Option<VertexDrag> {
        let photo = self.photo.as_ref()?;
        let mask = self.store.selected()?;
        let tolerance = self.config.tools.handle_hit_tolerance * photo.dpr() / photo.scale();
        let index = mask.vertex_at(p, tolerance)?;
        Some(VertexDrag {
            mask_id: mask.id.clone(),
            index,
            position: *p,
        })
    }

    fn apply_outcome(&mut self, outcome: ToolOutcome) -> Result<EditorEvent> {
        match outcome {
            ToolOutcome::None => Ok(if self.tools.is_drawing() {
                EditorEvent::DraftChanged
            } else if !self.tools.calibration_points().is_empty() {
                EditorEvent::CalibrationPointsPlaced
            } else {
                EditorEvent::Unchanged
            }),
            ToolOutcome::CommitPolygon(points) => {
                let event = self.store.apply(MaskAction::Create { points, name: None })?;
                Ok(EditorEvent::Mask(event))
            }
            ToolOutcome::SelectAt(p) => {
                let hit = self.store.hit_test(&p).map(|m| m.id.clone());
                Ok(EditorEvent::Mask(self.store.apply(MaskAction::Select(hit))?))
            }
            ToolOutcome::CalibrationReady(a, b) => {
                self.pending_calibration = Some((a, b));
                Ok(EditorEvent::CalibrationPointsPlaced)
            }
            ToolOutcome::DraftDiscarded => Ok(EditorEvent::DraftDiscarded),
        }
    }

    fn calibrate(&mut self, length_m: f64) -> Result<EditorEvent> {
        let photo = self.photo.as_ref().ok_or(PreconditionError::NoPhotoLoaded)?;
        let (a, b) = self.pending_calibration.ok_or_else(|| {
            PreconditionError::CalibrationPointsMissing {
                placed: self.tools.calibration_points().len(),
            }
        })?;
        let pixels_per_meter = self
            .calibration
            .calibrate(a, b, length_m, photo)?
            .pixels_per_meter;
        self.pending_calibration = None;
        Ok(EditorEvent::Calibrated { pixels_per_meter })
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
