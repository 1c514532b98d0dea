use bevy::prelude::*;

use crate::interact::{Candidate, CurrentTarget, InteractInput, InteractSet};
use crate::parts::PartSlot;

/// Cosmetic classification only; every kind swings the same way.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DoorKind {
    CarDoor,
    Hood,
    Trunk,
    FuelCap,
    Generic,
}

impl DoorKind {
    pub fn label(&self) -> &'static str {
        match *self {
            DoorKind::CarDoor => "door",
            DoorKind::Hood => "hood",
            DoorKind::Trunk => "trunk",
            DoorKind::FuelCap => "fuel cap",
            DoorKind::Generic => "panel",
        }
    }
}

/// Fixed rotation frame, established once at spawn: pivot position, swing
/// axis, and the panel's rest pose relative to the pivot. No re-parenting;
/// the panel pose is always derived from the angle.
#[derive(Clone, Copy, Debug)]
pub struct HingeFrame {
    pivot: Vec3,
    axis: Vec3,
    arm: Vec3,
    base_rotation: Quat,
}

impl HingeFrame {
    pub fn new(pivot: Vec3, axis: Vec3, rest: Transform) -> Self {
        Self {
            pivot,
            axis: axis.normalize(),
            arm: rest.translation - pivot,
            base_rotation: rest.rotation,
        }
    }

    fn pose(&self, angle_deg: f32) -> (Vec3, Quat) {
        let swing = Quat::from_axis_angle(self.axis, angle_deg.to_radians());
        (self.pivot + swing * self.arm, swing * self.base_rotation)
    }
}

const OPEN_TOLERANCE: f32 = 1.0;
const SNAP_EPSILON: f32 = 0.01;

/// Continuous angle actuator for one hinged panel. Drag input moves the
/// target angle; `settle` is the only place the actual angle changes.
#[derive(Component)]
pub struct HingeDoor {
    pub kind: DoorKind,
    frame: HingeFrame,
    min_angle: f32,
    max_angle: f32,
    pub sensitivity: f32,
    pub smooth_rate: f32,
    pub linked_slot: Option<Entity>,
    angle: f32,
    target_angle: f32,
}

impl HingeDoor {
    pub fn new(
        kind: DoorKind,
        frame: HingeFrame,
        min_angle: f32,
        max_angle: f32,
        linked_slot: Option<Entity>,
    ) -> Self {
        Self {
            kind,
            frame,
            min_angle,
            max_angle,
            sensitivity: 0.5,
            smooth_rate: 10.0,
            linked_slot,
            angle: min_angle,
            target_angle: min_angle,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    pub fn is_open(&self) -> bool {
        self.angle > self.min_angle + OPEN_TOLERANCE
    }

    /// Horizontal drag steers the target angle, clamped to the swing range.
    pub fn drag(&mut self, delta: Vec2) {
        self.target_angle =
            (self.target_angle + delta.x * self.sensitivity).clamp(self.min_angle, self.max_angle);
    }

    /// Moves the angle toward the target with exponential smoothing,
    /// snapping once the residual is below epsilon. Returns whether the
    /// angle changed this tick.
    pub fn settle(&mut self, dt: f32) -> bool {
        if self.angle == self.target_angle {
            return false;
        }
        self.angle += (self.target_angle - self.angle) * (self.smooth_rate * dt).min(1.0);
        if (self.angle - self.target_angle).abs() < SNAP_EPSILON {
            self.angle = self.target_angle;
        }
        true
    }

    pub fn pose(&self) -> (Vec3, Quat) {
        self.frame.pose(self.angle)
    }
}

/// Operable unless a linked slot is configured and empty. A dangling slot
/// reference keeps the door shut rather than failing.
pub fn door_operable(door: &HingeDoor, slots: &Query<&PartSlot>) -> bool {
    match door.linked_slot {
        None => true,
        Some(slot) => slots.get(slot).is_ok_and(|s| s.is_installed()),
    }
}

/// The panel grabbed at drag start. Stays latched while the gesture is
/// held, even if the crosshair slides off it mid-swing.
#[derive(Resource, Default)]
pub struct DoorDragState {
    door: Option<Entity>,
}

pub struct HingePlugin;

impl Plugin for HingePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DoorDragState>().add_systems(
            Update,
            (drag_doors, settle_doors).chain().in_set(InteractSet::Act),
        );
    }
}

fn drag_doors(
    input: Res<InteractInput>,
    target: Res<CurrentTarget>,
    mut drag: ResMut<DoorDragState>,
    mut doors: Query<&mut HingeDoor>,
    slots: Query<&PartSlot>,
) {
    if !input.drag_held {
        drag.door = None;
        return;
    }

    if drag.door.is_none() {
        if let Candidate::Door(entity) = target.candidate {
            drag.door = Some(entity);
        }
    }

    let Some(door_entity) = drag.door else {
        return;
    };
    let Ok(mut door) = doors.get_mut(door_entity) else {
        drag.door = None;
        return;
    };

    if !door_operable(&door, &slots) {
        return;
    }
    if input.drag != Vec2::ZERO {
        door.drag(input.drag);
    }
}

fn settle_doors(time: Res<Time>, mut doors: Query<(&mut HingeDoor, &mut Transform)>) {
    let dt = time.delta_seconds();
    for (mut door, mut transform) in &mut doors {
        if door.settle(dt) {
            let (translation, rotation) = door.pose();
            transform.translation = translation;
            transform.rotation = rotation;
        }
    }
}
