use bevy::prelude::*;
use std::collections::HashSet;

use crate::interact::InteractSet;

/// Closed catalog of everything that can be bolted onto the car. Each type
/// has exactly one slot on the vehicle; comparisons are by identity only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PartType {
    FrontFenderLeft,
    FrontFenderRight,
    FrontDoorLeft,
    FrontDoorRight,
    RearDoorLeft,
    RearDoorRight,
    SteeringWheel,
    Seat,
    Engine,
    Battery,
    Trunk,
    RearBumper,
    Hood,
    FuelTank,
    WheelFrontLeft,
    WheelFrontRight,
    WheelRearLeft,
    WheelRearRight,
}

impl PartType {
    pub const ALL: [PartType; 18] = [
        PartType::FrontFenderLeft,
        PartType::FrontFenderRight,
        PartType::FrontDoorLeft,
        PartType::FrontDoorRight,
        PartType::RearDoorLeft,
        PartType::RearDoorRight,
        PartType::SteeringWheel,
        PartType::Seat,
        PartType::Engine,
        PartType::Battery,
        PartType::Trunk,
        PartType::RearBumper,
        PartType::Hood,
        PartType::FuelTank,
        PartType::WheelFrontLeft,
        PartType::WheelFrontRight,
        PartType::WheelRearLeft,
        PartType::WheelRearRight,
    ];

    pub fn label(&self) -> &'static str {
        match *self {
            PartType::FrontFenderLeft => "front left fender",
            PartType::FrontFenderRight => "front right fender",
            PartType::FrontDoorLeft => "front left door",
            PartType::FrontDoorRight => "front right door",
            PartType::RearDoorLeft => "rear left door",
            PartType::RearDoorRight => "rear right door",
            PartType::SteeringWheel => "steering wheel",
            PartType::Seat => "seat",
            PartType::Engine => "engine",
            PartType::Battery => "battery",
            PartType::Trunk => "trunk lid",
            PartType::RearBumper => "rear bumper",
            PartType::Hood => "hood",
            PartType::FuelTank => "fuel tank",
            PartType::WheelFrontLeft => "front left wheel",
            PartType::WheelFrontRight => "front right wheel",
            PartType::WheelRearLeft => "rear left wheel",
            PartType::WheelRearRight => "rear right wheel",
        }
    }

    /// Locomotion speed multiplier while this part is carried.
    pub fn carry_speed_factor(&self) -> f32 {
        match *self {
            PartType::Engine => 0.5,
            PartType::FuelTank => 0.75,
            _ => 1.0,
        }
    }
}

/// A physical part instance. The type is fixed at spawn; only the location
/// ever changes. Parts are relocated, never despawned.
#[derive(Component)]
pub struct Part {
    pub part_type: PartType,
}

/// Exactly one of these holds at any time. `Held` implies the hand points
/// back at this entity; `Installed` names the occupied slot.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PartLocation {
    World,
    Held,
    Installed(Entity),
}

/// One installation point on the car. Occupancy is mutated only through
/// `install`/`uninstall`; everything else reads.
#[derive(Component)]
pub struct PartSlot {
    accepted: PartType,
    occupant: Option<Entity>,
}

impl PartSlot {
    pub fn new(accepted: PartType) -> Self {
        Self {
            accepted,
            occupant: None,
        }
    }

    pub fn accepted_type(&self) -> PartType {
        self.accepted
    }

    pub fn is_installed(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<Entity> {
        self.occupant
    }

    /// Accepts the part only if the slot is empty and the type matches
    /// exactly. Callers pre-check; a mismatch here is still a no-op.
    pub fn install(&mut self, part: Entity, part_type: PartType) -> bool {
        if self.occupant.is_some() || part_type != self.accepted {
            return false;
        }
        self.occupant = Some(part);
        true
    }

    /// Clears occupancy and returns the previous occupant. The caller owns
    /// the part's next location. Empty slot returns `None`, unchanged.
    pub fn uninstall(&mut self) -> Option<Entity> {
        self.occupant.take()
    }
}

/// Raised by the hand when a part lands in its slot.
#[derive(Event)]
pub struct PartInstalled {
    pub part_type: PartType,
}

/// Raised by the hand when a part leaves its slot.
#[derive(Event)]
pub struct PartRemoved {
    pub part_type: PartType,
}

/// One-shot: fires on the first tick every slot is filled, re-arms once a
/// part is removed again.
#[derive(Event, Default)]
pub struct AssemblyComplete;

/// Aggregate view over all slots. Derived state: recomputed from occupancy
/// every tick, never written from anywhere else.
#[derive(Resource, Default)]
pub struct Assembly {
    pub required: HashSet<PartType>,
    pub installed_types: HashSet<PartType>,
    pub installed_count: usize,
    pub total_slots: usize,
    complete_latched: bool,
}

impl Assembly {
    pub fn progress(&self) -> f32 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.installed_count as f32 / self.total_slots as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_slots > 0 && self.installed_count == self.total_slots
    }

    /// Whether the car would start. With no required set, every slot must
    /// be filled; otherwise only the required subset matters, so the car
    /// can be operable while still incomplete.
    pub fn can_start(&self) -> bool {
        if self.required.is_empty() {
            return self.is_complete();
        }
        self.required
            .iter()
            .all(|t| self.installed_types.contains(t))
    }
}

pub struct AssemblyPlugin;

impl Plugin for AssemblyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Assembly>()
            .add_event::<PartInstalled>()
            .add_event::<PartRemoved>()
            .add_event::<AssemblyComplete>()
            .add_systems(
                Update,
                (recompute_assembly, log_part_events)
                    .chain()
                    .after(InteractSet::Act),
            );
    }
}

/// Progress counts occupied slots, not the type set, so two slots sharing a
/// type could never under-count. The shipped scene keeps types unique.
fn recompute_assembly(
    slots: Query<&PartSlot>,
    mut assembly: ResMut<Assembly>,
    mut ev_complete: EventWriter<AssemblyComplete>,
) {
    assembly.total_slots = slots.iter().count();
    assembly.installed_count = slots.iter().filter(|s| s.is_installed()).count();
    assembly.installed_types = slots
        .iter()
        .filter(|s| s.is_installed())
        .map(|s| s.accepted_type())
        .collect();

    if assembly.is_complete() {
        if !assembly.complete_latched {
            assembly.complete_latched = true;
            info!(
                "assembly complete: {}/{} parts installed",
                assembly.installed_count, assembly.total_slots
            );
            ev_complete.send_default();
        }
    } else {
        assembly.complete_latched = false;
    }
}

fn log_part_events(
    mut ev_installed: EventReader<PartInstalled>,
    mut ev_removed: EventReader<PartRemoved>,
    assembly: Res<Assembly>,
) {
    for ev in ev_installed.read() {
        info!(
            "{} installed ({}/{})",
            ev.part_type.label(),
            assembly.installed_count,
            assembly.total_slots
        );
        if assembly.can_start() && !assembly.is_complete() {
            debug!("car is operable but not complete");
        }
    }
    for ev in ev_removed.read() {
        info!(
            "{} removed ({}/{})",
            ev.part_type.label(),
            assembly.installed_count,
            assembly.total_slots
        );
    }
}
