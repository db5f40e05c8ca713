//! Owner of the mask set.
//!
//! `MaskStore` holds masks, groups, the single selection and the undo history.
//! All mutation goes through [`MaskStore::apply`], a reducer taking one
//! [`MaskAction`] at a time. A rejected action returns an error and leaves the
//! store exactly as it was.
//!
//! # Locking
//!
//! A locked mask rejects deletion and any change to its points
//! (`SetPoints`, `MovePoint`, `InsertPoint`, `RemovePoint`, `Translate`,
//! `Rotate`). Visibility and lock toggles are always accepted.
//!
//! # History
//!
//! Structural edits (create, delete, point changes, material assignment,
//! rename, group structure) record a snapshot. Selection, visibility, lock,
//! collapse and effect slider changes do not.

use std::sync::Arc;

use poolviz_core::constants::MIN_POLYGON_POINTS;
use poolviz_core::{Error, GeometryError, Point, PreconditionError, Result};
use tracing::debug;
use uuid::Uuid;

use crate::history::{History, HistorySnapshot};
use crate::mask::{EffectSettings, Mask, MaskGroup, MaskPoint};

/// One requested change to the mask set.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskAction {
    Create {
        points: Vec<MaskPoint>,
        name: Option<String>,
    },
    Delete {
        id: String,
    },
    SetPoints {
        id: String,
        points: Vec<MaskPoint>,
    },
    MovePoint {
        id: String,
        index: usize,
        to: Point,
    },
    InsertPoint {
        id: String,
        index: usize,
        point: MaskPoint,
    },
    RemovePoint {
        id: String,
        index: usize,
    },
    Translate {
        id: String,
        dx: f64,
        dy: f64,
    },
    Rotate {
        id: String,
        degrees: f64,
    },
    Rename {
        id: String,
        name: String,
    },
    AssignMaterial {
        id: String,
        material_id: Option<String>,
    },
    SetEffectSettings {
        id: String,
        settings: EffectSettings,
    },
    SetDepth {
        id: String,
        depth_level: i32,
        elevation_m: f64,
        is_stepped: bool,
    },
    SetZIndex {
        id: String,
        z_index: i32,
    },
    SetVisibility {
        id: String,
        visible: bool,
    },
    SetLocked {
        id: String,
        locked: bool,
    },
    Select(Option<String>),
    CreateGroup {
        name: String,
    },
    RenameGroup {
        id: String,
        name: String,
    },
    DeleteGroup {
        id: String,
    },
    SetGroupCollapsed {
        id: String,
        collapsed: bool,
    },
    AssignToGroup {
        id: String,
        group_id: Option<String>,
    },
    Undo,
    Redo,
}

/// What an accepted action did.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskEvent {
    Created { id: String },
    Deleted { id: String },
    Updated { id: String },
    SelectionChanged(Option<String>),
    GroupCreated { id: String },
    GroupUpdated { id: String },
    GroupDeleted { id: String },
    Restored,
    Unchanged,
}

/// Single-owner container for masks, groups, selection and history.
#[derive(Debug, Clone)]
pub struct MaskStore {
    masks: Arc<Vec<Mask>>,
    groups: Arc<Vec<MaskGroup>>,
    selected_id: Option<String>,
    history: History,
    next_revision: u64,
    next_order: i32,
}

impl MaskStore {
    pub fn new(history_depth: usize) -> Self {
        Self {
            masks: Arc::new(Vec::new()),
            groups: Arc::new(Vec::new()),
            selected_id: None,
            history: History::new(history_depth),
            next_revision: 1,
            next_order: 0,
        }
    }

    /// Replaces the whole mask set (for example after loading) and clears history.
    pub fn load(&mut self, mut masks: Vec<Mask>, groups: Vec<MaskGroup>) {
        self.next_order = masks.iter().map(|m| m.order + 1).max().unwrap_or(0);
        for mask in masks.iter_mut() {
            mask.revision = self.bump_revision();
        }
        self.masks = Arc::new(masks);
        self.groups = Arc::new(groups);
        self.selected_id = None;
        self.history.clear();
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// The live mask vector, shared with history until the next write.
    pub fn shared_masks(&self) -> &Arc<Vec<Mask>> {
        &self.masks
    }

    pub fn mask(&self, id: &str) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mask(id).is_some()
    }

    pub fn groups(&self) -> &[MaskGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&MaskGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn masks_in_group<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a Mask> {
        self.masks
            .iter()
            .filter(move |m| m.group_id.as_deref() == Some(group_id))
    }

    pub fn ungrouped(&self) -> impl Iterator<Item = &Mask> {
        self.masks.iter().filter(|m| m.group_id.is_none())
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Mask> {
        self.selected_id.as_deref().and_then(|id| self.mask(id))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Visible, fillable masks from bottom to top.
    pub fn render_order(&self) -> Vec<&Mask> {
        let mut visible: Vec<&Mask> = self
            .masks
            .iter()
            .filter(|m| m.is_visible && m.is_renderable())
            .collect();
        visible.sort_by_key(|m| (m.z_index, m.order));
        visible
    }

    /// Topmost visible mask containing `p`.
    pub fn hit_test(&self, p: &Point) -> Option<&Mask> {
        self.render_order()
            .into_iter()
            .rev()
            .find(|m| m.contains_point(p))
    }

    /// Current contents as an immutable snapshot. Shares storage with the store.
    pub fn snapshot(&self, label: impl Into<String>) -> HistorySnapshot {
        HistorySnapshot::from_shared(Arc::clone(&self.masks), Arc::clone(&self.groups), label)
    }

    /// Applies one action.
    pub fn apply(&mut self, action: MaskAction) -> Result<MaskEvent> {
        match action {
            MaskAction::Create { points, name } => self.create(points, name),
            MaskAction::Delete { id } => self.delete(&id),
            MaskAction::SetPoints { id, points } => {
                validate_points(&points)?;
                self.edit_geometry(&id, "Edit points", move |mask| {
                    mask.points = points;
                    Ok(())
                })
            }
            MaskAction::MovePoint { id, index, to } => {
                if !to.is_finite() {
                    return Err(GeometryError::NonFiniteCoordinate { x: to.x, y: to.y }.into());
                }
                self.edit_geometry(&id, "Move point", move |mask| {
                    let len = mask.points.len();
                    let point = mask
                        .points
                        .get_mut(index)
                        .ok_or(GeometryError::PointIndexOutOfRange { index, len })?;
                    *point = point.moved_to(to);
                    Ok(())
                })
            }
            MaskAction::InsertPoint { id, index, point } => {
                if !point.is_finite() {
                    return Err(GeometryError::NonFiniteCoordinate {
                        x: point.x,
                        y: point.y,
                    }
                    .into());
                }
                self.edit_geometry(&id, "Insert point", move |mask| {
                    let len = mask.points.len();
                    if index > len {
                        return Err(GeometryError::PointIndexOutOfRange { index, len }.into());
                    }
                    mask.points.insert(index, point);
                    Ok(())
                })
            }
            MaskAction::RemovePoint { id, index } => {
                self.edit_geometry(&id, "Remove point", move |mask| {
                    let len = mask.points.len();
                    if index >= len {
                        return Err(GeometryError::PointIndexOutOfRange { index, len }.into());
                    }
                    if len <= MIN_POLYGON_POINTS {
                        return Err(GeometryError::InvalidPointCount {
                            count: len - 1,
                            min: MIN_POLYGON_POINTS,
                        }
                        .into());
                    }
                    mask.points.remove(index);
                    Ok(())
                })
            }
            MaskAction::Translate { id, dx, dy } => {
                if !dx.is_finite() || !dy.is_finite() {
                    return Err(GeometryError::NonFiniteCoordinate { x: dx, y: dy }.into());
                }
                self.edit_geometry(&id, "Move mask", move |mask| {
                    mask.translate(dx, dy);
                    Ok(())
                })
            }
            MaskAction::Rotate { id, degrees } => {
                if !degrees.is_finite() {
                    return Err(Error::other("Rotation angle must be finite"));
                }
                self.edit_geometry(&id, "Rotate mask", move |mask| {
                    mask.rotate(degrees);
                    Ok(())
                })
            }
            MaskAction::Rename { id, name } => {
                let name = name.trim().to_string();
                self.edit_recorded(&id, "Rename mask", move |mask| {
                    mask.name = name;
                    false
                })
            }
            MaskAction::AssignMaterial { id, material_id } => {
                self.edit_recorded(&id, "Assign material", move |mask| {
                    mask.material_id = material_id;
                    true
                })
            }
            MaskAction::SetEffectSettings { id, settings } => {
                self.edit_unrecorded(&id, move |mask| {
                    mask.effect_settings = Some(settings);
                    true
                })
            }
            MaskAction::SetDepth {
                id,
                depth_level,
                elevation_m,
                is_stepped,
            } => {
                if !elevation_m.is_finite() {
                    return Err(Error::other("Elevation must be finite"));
                }
                self.edit_recorded(&id, "Set depth", move |mask| {
                    mask.depth_level = depth_level;
                    mask.elevation_m = elevation_m;
                    mask.is_stepped = is_stepped;
                    true
                })
            }
            MaskAction::SetZIndex { id, z_index } => {
                self.edit_recorded(&id, "Reorder mask", move |mask| {
                    mask.z_index = z_index;
                    false
                })
            }
            MaskAction::SetVisibility { id, visible } => self.edit_unrecorded(&id, move |mask| {
                mask.is_visible = visible;
                false
            }),
            MaskAction::SetLocked { id, locked } => self.edit_unrecorded(&id, move |mask| {
                mask.is_locked = locked;
                false
            }),
            MaskAction::Select(id) => self.select(id),
            MaskAction::CreateGroup { name } => self.create_group(&name),
            MaskAction::RenameGroup { id, name } => self.rename_group(&id, &name),
            MaskAction::DeleteGroup { id } => self.delete_group(&id),
            MaskAction::SetGroupCollapsed { id, collapsed } => {
                let index = self
                    .groups
                    .iter()
                    .position(|g| g.id == id)
                    .ok_or_else(|| PreconditionError::GroupNotFound { id: id.clone() })?;
                if self.groups[index].is_collapsed == collapsed {
                    return Ok(MaskEvent::Unchanged);
                }
                Arc::make_mut(&mut self.groups)[index].is_collapsed = collapsed;
                Ok(MaskEvent::GroupUpdated { id })
            }
            MaskAction::AssignToGroup { id, group_id } => {
                if let Some(gid) = &group_id {
                    if self.group(gid).is_none() {
                        return Err(PreconditionError::GroupNotFound { id: gid.clone() }.into());
                    }
                }
                self.edit_recorded(&id, "Move to group", move |mask| {
                    mask.group_id = group_id;
                    false
                })
            }
            MaskAction::Undo => Ok(self.undo()),
            MaskAction::Redo => Ok(self.redo()),
        }
    }

    fn bump_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }

    /// Copies the mask vector only if history still shares it.
    fn masks_mut(&mut self) -> &mut Vec<Mask> {
        Arc::make_mut(&mut self.masks)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.masks
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| PreconditionError::MaskNotFound { id: id.to_string() }.into())
    }

    fn record(&mut self, label: &str) {
        let before = self.snapshot(label);
        self.history.record(before);
    }

    fn create(&mut self, points: Vec<MaskPoint>, name: Option<String>) -> Result<MaskEvent> {
        validate_points(&points)?;
        self.record("Create mask");

        let id = Uuid::new_v4().to_string();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Mask {}", self.masks.len() + 1));
        let mut mask = Mask::new(id.clone(), name, points);
        mask.order = self.next_order;
        mask.z_index = self.masks.iter().map(|m| m.z_index + 1).max().unwrap_or(0);
        mask.revision = self.bump_revision();
        self.next_order += 1;

        debug!("Created mask {} with {} points", id, mask.points.len());
        self.masks_mut().push(mask);
        self.selected_id = Some(id.clone());
        Ok(MaskEvent::Created { id })
    }

    fn delete(&mut self, id: &str) -> Result<MaskEvent> {
        let index = self.index_of(id)?;
        if self.masks[index].is_locked {
            return Err(PreconditionError::MaskLocked { id: id.to_string() }.into());
        }
        self.record("Delete mask");
        self.masks_mut().remove(index);
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
        debug!("Deleted mask {}", id);
        Ok(MaskEvent::Deleted { id: id.to_string() })
    }

    /// Point mutation: rejected on locked masks, recorded, bumps the revision.
    ///
    /// `edit` runs on a scratch copy so a failing edit cannot leave partial changes.
    fn edit_geometry(
        &mut self,
        id: &str,
        label: &str,
        edit: impl FnOnce(&mut Mask) -> Result<()>,
    ) -> Result<MaskEvent> {
        let index = self.index_of(id)?;
        if self.masks[index].is_locked {
            return Err(PreconditionError::MaskLocked { id: id.to_string() }.into());
        }
        let mut draft = self.masks[index].clone();
        edit(&mut draft)?;
        self.record(label);
        draft.revision = self.bump_revision();
        self.masks_mut()[index] = draft;
        Ok(MaskEvent::Updated { id: id.to_string() })
    }

    /// Recorded non-geometry edit; `edit` returns whether rendering changed.
    fn edit_recorded(
        &mut self,
        id: &str,
        label: &str,
        edit: impl FnOnce(&mut Mask) -> bool,
    ) -> Result<MaskEvent> {
        let index = self.index_of(id)?;
        self.record(label);
        self.touch(index, edit);
        Ok(MaskEvent::Updated { id: id.to_string() })
    }

    fn edit_unrecorded(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut Mask) -> bool,
    ) -> Result<MaskEvent> {
        let index = self.index_of(id)?;
        self.touch(index, edit);
        Ok(MaskEvent::Updated { id: id.to_string() })
    }

    fn touch(&mut self, index: usize, edit: impl FnOnce(&mut Mask) -> bool) {
        if edit(&mut self.masks_mut()[index]) {
            let revision = self.bump_revision();
            self.masks_mut()[index].revision = revision;
        }
    }

    fn select(&mut self, id: Option<String>) -> Result<MaskEvent> {
        if let Some(id) = &id {
            self.index_of(id)?;
        }
        if self.selected_id == id {
            return Ok(MaskEvent::Unchanged);
        }
        self.selected_id = id.clone();
        Ok(MaskEvent::SelectionChanged(id))
    }

    fn validate_group_name(&self, name: &str, except: Option<&str>) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PreconditionError::EmptyGroupName.into());
        }
        let duplicate = self
            .groups
            .iter()
            .filter(|g| Some(g.id.as_str()) != except)
            .any(|g| g.name.trim().eq_ignore_ascii_case(trimmed));
        if duplicate {
            return Err(PreconditionError::DuplicateGroupName {
                name: trimmed.to_string(),
            }
            .into());
        }
        Ok(trimmed.to_string())
    }

    fn create_group(&mut self, name: &str) -> Result<MaskEvent> {
        let name = self.validate_group_name(name, None)?;
        self.record("Create group");
        let id = Uuid::new_v4().to_string();
        let order = self.groups.iter().map(|g| g.order + 1).max().unwrap_or(0);
        Arc::make_mut(&mut self.groups).push(MaskGroup::new(id.clone(), name, order));
        Ok(MaskEvent::GroupCreated { id })
    }

    fn rename_group(&mut self, id: &str, name: &str) -> Result<MaskEvent> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| PreconditionError::GroupNotFound { id: id.to_string() })?;
        let name = self.validate_group_name(name, Some(id))?;
        self.record("Rename group");
        Arc::make_mut(&mut self.groups)[index].name = name;
        Ok(MaskEvent::GroupUpdated { id: id.to_string() })
    }

    fn delete_group(&mut self, id: &str) -> Result<MaskEvent> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| PreconditionError::GroupNotFound { id: id.to_string() })?;
        self.record("Delete group");
        Arc::make_mut(&mut self.groups).remove(index);
        for mask in self.masks_mut().iter_mut() {
            if mask.group_id.as_deref() == Some(id) {
                mask.group_id = None;
            }
        }
        Ok(MaskEvent::GroupDeleted { id: id.to_string() })
    }

    fn undo(&mut self) -> MaskEvent {
        let label = self.history.undo_label().unwrap_or_default().to_string();
        let current = self.snapshot(label);
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                MaskEvent::Restored
            }
            None => MaskEvent::Unchanged,
        }
    }

    fn redo(&mut self) -> MaskEvent {
        let current = self.snapshot("");
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                MaskEvent::Restored
            }
            None => MaskEvent::Unchanged,
        }
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        let (masks, groups) = snapshot.into_parts();
        self.masks = masks;
        self.groups = groups;
        let still_exists = self
            .selected_id
            .as_deref()
            .is_some_and(|id| self.masks.iter().any(|m| m.id == id));
        if !still_exists {
            self.selected_id = None;
        }
    }
}

impl Default for MaskStore {
    fn default() -> Self {
        Self::new(poolviz_core::constants::HISTORY_MAX_DEPTH)
    }
}

fn validate_points(points: &[MaskPoint]) -> Result<()> {
    if points.len() < MIN_POLYGON_POINTS {
        return Err(GeometryError::InvalidPointCount {
            count: points.len(),
            min: MIN_POLYGON_POINTS,
        }
        .into());
    }
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(GeometryError::NonFiniteCoordinate { x: bad.x, y: bad.y }.into());
    }
    Ok(())
}
