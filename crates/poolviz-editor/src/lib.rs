//! # PoolViz Editor
//!
//! Everything between a pointer event and the mask model:
//!
//! - [`coords`]: screen ↔ image coordinate mapping
//! - [`photo_space`]: camera (zoom, pan, fit) for the loaded photo
//! - [`mask`]: masks, vertices, bezier geometry and effect settings
//! - [`mask_store`] and [`history`]: reducer-style editing with undo/redo
//! - [`tools`]: the drawing tool state machine
//! - [`calibration`]: pixels-per-meter measurement
//! - [`persistence`]: storage records and scene files
//! - [`editor`]: the single-owner [`EditorState`] that wires them together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use poolviz_editor::{EditorAction, EditorState};
//!
//! let mut editor = EditorState::default();
//! editor.dispatch(EditorAction::LoadPhoto { width: 4000, height: 3000 })?;
//! editor.dispatch(EditorAction::ZoomIn)?;
//! ```

pub mod calibration;
pub mod coords;
pub mod editor;
pub mod history;
pub mod mask;
pub mod mask_store;
pub mod persistence;
pub mod photo_space;
pub mod tools;

pub use calibration::{
    heuristic_pixels_per_meter, Calibration, CalibrationEngine, CalibrationMethod,
    CalibrationRecord,
};
pub use coords::{Camera, ImageOrigin, ViewportBounds};
pub use editor::{EditorAction, EditorEvent, EditorState, VertexDrag};
pub use history::{History, HistorySnapshot};
pub use mask::{EffectSettings, Mask, MaskGroup, MaskPoint, PointKind, Segment, UnderwaterVersion};
pub use mask_store::{MaskAction, MaskEvent, MaskStore};
pub use persistence::{CalcMeta, MaskRecord, SceneFile};
pub use photo_space::{PhotoSpace, ZoomDirection};
pub use tools::{Tool, ToolEvent, ToolOutcome, ToolState};
