use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use rand::Rng;

use crate::hinge::{door_operable, HingeDoor};
use crate::parts::{Part, PartInstalled, PartLocation, PartRemoved, PartSlot, PartType};
use crate::player::{AppState, CarrySpeed, PlayerCamera};

/// Ordering backbone for one tick: inputs are sampled once, the ray is
/// resolved once, and every action consumes that single result.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractSet {
    Sample,
    Resolve,
    Act,
}

/// Everything the interaction systems read this tick, sampled in one place.
#[derive(Resource, Default)]
pub struct InteractInput {
    /// Edge-triggered activate (grab / install / remove / drop).
    pub activate: bool,
    /// Accumulated look delta for this tick.
    pub drag: Vec2,
    /// Accumulated scroll for this tick.
    pub scroll: f32,
    /// Whether the drag gesture button is held.
    pub drag_held: bool,
}

#[derive(Resource)]
pub struct InteractSettings {
    pub range: f32,
    pub carry_distance_min: f32,
    pub carry_distance_max: f32,
    pub carry_distance_default: f32,
    pub scroll_sensitivity: f32,
    pub held_scale: f32,
    pub follow_rate: f32,
}

impl Default for InteractSettings {
    fn default() -> Self {
        Self {
            range: 3.0,
            carry_distance_min: 0.5,
            carry_distance_max: 2.0,
            carry_distance_default: 1.0,
            scroll_sensitivity: 0.1,
            held_scale: 0.5,
            follow_rate: 15.0,
        }
    }
}

/// What the targeting ray resolved to this tick. Closed set: dispatch is a
/// match, never a capability probe.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Candidate {
    #[default]
    None,
    Part(Entity),
    Slot(Entity),
    Door(Entity),
}

/// Single source of truth for the tick: written by `resolve_target`, read
/// by activation, door drag, and the HUD.
#[derive(Resource, Default)]
pub struct CurrentTarget {
    pub candidate: Candidate,
    pub prompt: Option<String>,
    pub eligible: bool,
}

/// Previous tick's (slot, type-match) pair, kept so look-changed
/// notifications fire exactly once per change.
#[derive(Resource, Default)]
struct LookedSlot(Option<(Entity, bool)>);

/// Sent when the targeted slot (or its held-part match) changes. The prior
/// slot is always cleared before the new one is set.
#[derive(Event)]
pub struct SlotLookChanged {
    pub slot: Entity,
    pub looking: bool,
    pub type_matches: bool,
}

/// Axis-aligned interaction volume around an entity, swept by the resolver
/// instead of a physics raycast.
#[derive(Component)]
pub struct InteractVolume {
    pub half_extents: Vec3,
}

/// Material pair for a slot's ghost marker; the preview material shows
/// while the player aims a matching part at the empty slot.
#[derive(Component)]
pub struct SlotVisual {
    pub normal: Handle<StandardMaterial>,
    pub preview: Handle<StandardMaterial>,
}

/// The player's single-capacity carry state. `held` is mutated only by
/// `handle_activate`; no other system relocates a part.
#[derive(Resource)]
pub struct Hand {
    held: Option<(Entity, PartType)>,
    pub carry_distance: f32,
}

impl Default for Hand {
    fn default() -> Self {
        Self {
            held: None,
            carry_distance: InteractSettings::default().carry_distance_default,
        }
    }
}

impl Hand {
    pub fn is_empty(&self) -> bool {
        self.held.is_none()
    }

    pub fn held(&self) -> Option<(Entity, PartType)> {
        self.held
    }

    pub fn held_entity(&self) -> Option<Entity> {
        self.held.map(|(entity, _)| entity)
    }

    pub fn held_type(&self) -> Option<PartType> {
        self.held.map(|(_, ty)| ty)
    }
}

pub struct InteractPlugin;

impl Plugin for InteractPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InteractInput>()
            .init_resource::<InteractSettings>()
            .init_resource::<CurrentTarget>()
            .init_resource::<LookedSlot>()
            .init_resource::<Hand>()
            .add_event::<SlotLookChanged>()
            .configure_sets(
                Update,
                (InteractSet::Sample, InteractSet::Resolve, InteractSet::Act).chain(),
            )
            .add_systems(Update, sample_input.in_set(InteractSet::Sample))
            .add_systems(Update, resolve_target.in_set(InteractSet::Resolve))
            .add_systems(
                Update,
                (handle_activate, adjust_carry_distance, follow_held_part)
                    .chain()
                    .in_set(InteractSet::Act),
            )
            .add_systems(Update, (apply_slot_preview, update_slot_markers));
    }
}

/// Inputs are read once per tick; while the menu is open everything reads
/// as neutral so no stale activation can fire on resume.
fn sample_input(
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    state: Res<State<AppState>>,
    mut input: ResMut<InteractInput>,
) {
    *input = InteractInput::default();
    if *state.get() != AppState::Playing {
        motion.clear();
        wheel.clear();
        return;
    }

    input.activate = keys.just_pressed(KeyCode::KeyF);
    input.drag_held = buttons.pressed(MouseButton::Left);
    for ev in motion.read() {
        input.drag += ev.delta;
    }
    for ev in wheel.read() {
        input.scroll += ev.y;
    }
}

/// Slab test against an axis-aligned box. Returns the entry distance, 0.0
/// when the origin is already inside.
fn ray_box_intersection(origin: Vec3, dir: Vec3, center: Vec3, half_extents: Vec3) -> Option<f32> {
    let inv = dir.recip();
    let a = (center - half_extents - origin) * inv;
    let b = (center + half_extents - origin) * inv;
    let t_min = a.min(b).max_element();
    let t_max = a.max(b).min_element();
    if t_max < t_min.max(0.0) {
        return None;
    }
    Some(t_min.max(0.0))
}

fn resolve_target(
    settings: Res<InteractSettings>,
    hand: Res<Hand>,
    camera: Query<&GlobalTransform, With<PlayerCamera>>,
    volumes: Query<(Entity, &GlobalTransform, &InteractVolume)>,
    parts: Query<(&Part, &PartLocation)>,
    slots: Query<&PartSlot>,
    doors: Query<&HingeDoor>,
    mut target: ResMut<CurrentTarget>,
    mut looked: ResMut<LookedSlot>,
    mut ev_look: EventWriter<SlotLookChanged>,
) {
    // Without a camera the resolver degrades to "no candidate" every tick.
    let candidate = if let Ok(cam) = camera.get_single() {
        let cam = cam.compute_transform();
        nearest_interactable(cam.translation, *cam.forward(), settings.range, &volumes, &parts)
            .map_or(Candidate::None, |entity| {
                classify(entity, &parts, &slots, &doors)
            })
    } else {
        Candidate::None
    };

    let (prompt, eligible) = describe(candidate, &hand, &parts, &slots, &doors);
    target.candidate = candidate;
    target.prompt = prompt;
    target.eligible = eligible;

    // Look-changed bookkeeping: the pair is (slot, held part matches).
    let current = match candidate {
        Candidate::Slot(entity) => slots.get(entity).ok().map(|slot| {
            let matches = !slot.is_installed() && hand.held_type() == Some(slot.accepted_type());
            (entity, matches)
        }),
        _ => None,
    };

    if looked.0 != current {
        if let Some((old_slot, _)) = looked.0 {
            if current.map(|(entity, _)| entity) != Some(old_slot) {
                ev_look.send(SlotLookChanged {
                    slot: old_slot,
                    looking: false,
                    type_matches: false,
                });
            }
        }
        if let Some((slot, matches)) = current {
            ev_look.send(SlotLookChanged {
                slot,
                looking: true,
                type_matches: matches,
            });
        }
        looked.0 = current;
    }
}

/// Closest volume along the ray within range. Held and installed parts are
/// transparent to the ray so the slot behind them stays targetable.
fn nearest_interactable(
    origin: Vec3,
    dir: Vec3,
    range: f32,
    volumes: &Query<(Entity, &GlobalTransform, &InteractVolume)>,
    parts: &Query<(&Part, &PartLocation)>,
) -> Option<Entity> {
    let mut best: Option<(f32, Entity)> = None;
    for (entity, transform, volume) in volumes.iter() {
        if let Ok((_, location)) = parts.get(entity) {
            if *location != PartLocation::World {
                continue;
            }
        }
        let Some(t) = ray_box_intersection(origin, dir, transform.translation(), volume.half_extents)
        else {
            continue;
        };
        if t > range {
            continue;
        }
        if best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, entity));
        }
    }
    best.map(|(_, entity)| entity)
}

fn classify(
    entity: Entity,
    parts: &Query<(&Part, &PartLocation)>,
    slots: &Query<&PartSlot>,
    doors: &Query<&HingeDoor>,
) -> Candidate {
    if parts.get(entity).is_ok() {
        Candidate::Part(entity)
    } else if slots.get(entity).is_ok() {
        Candidate::Slot(entity)
    } else if doors.get(entity).is_ok() {
        Candidate::Door(entity)
    } else {
        Candidate::None
    }
}

/// Prompt and eligibility for the resolved candidate. Eligibility marks the
/// constructive action (grab / remove / install / swing); a drop while
/// carrying is always available regardless.
fn describe(
    candidate: Candidate,
    hand: &Hand,
    parts: &Query<(&Part, &PartLocation)>,
    slots: &Query<&PartSlot>,
    doors: &Query<&HingeDoor>,
) -> (Option<String>, bool) {
    match candidate {
        Candidate::Part(entity) => match parts.get(entity) {
            Ok((part, _)) => (
                Some(format!("Pick up {} [F]", part.part_type.label())),
                hand.is_empty(),
            ),
            Err(_) => (None, false),
        },
        Candidate::Slot(entity) => match slots.get(entity) {
            Ok(slot) if slot.is_installed() => (
                Some(format!("Remove {} [F]", slot.accepted_type().label())),
                hand.is_empty(),
            ),
            Ok(slot) => (
                Some(format!("Install {} [F]", slot.accepted_type().label())),
                hand.held_type() == Some(slot.accepted_type()),
            ),
            Err(_) => (None, false),
        },
        Candidate::Door(entity) => match doors.get(entity) {
            Ok(door) if door_operable(door, slots) => (
                Some(format!("Hold LMB and drag to swing the {}", door.kind.label())),
                hand.is_empty(),
            ),
            _ => (None, false),
        },
        Candidate::None => match hand.held_type() {
            Some(ty) => (Some(format!("Drop {} [F]", ty.label())), true),
            None => (None, false),
        },
    }
}

/// The whole grab/install/remove/drop state machine, driven by one
/// activation edge against the tick's resolved candidate.
fn handle_activate(
    input: Res<InteractInput>,
    target: Res<CurrentTarget>,
    settings: Res<InteractSettings>,
    mut hand: ResMut<Hand>,
    mut carry: ResMut<CarrySpeed>,
    camera: Query<&GlobalTransform, With<PlayerCamera>>,
    mut parts: Query<(&Part, &mut PartLocation, &mut Transform)>,
    mut slots: Query<(&mut PartSlot, &GlobalTransform)>,
    mut ev_installed: EventWriter<PartInstalled>,
    mut ev_removed: EventWriter<PartRemoved>,
) {
    if !input.activate {
        return;
    }

    match hand.held() {
        // Empty hand: grab a loose part, or pull one out of a slot.
        None => match target.candidate {
            Candidate::Part(entity) => {
                if let Ok((part, mut location, mut transform)) = parts.get_mut(entity) {
                    if *location == PartLocation::World {
                        let ty = part.part_type;
                        *location = PartLocation::Held;
                        grab(&mut hand, &mut carry, &settings, entity, ty, &mut transform);
                    }
                }
            }
            Candidate::Slot(entity) => {
                let Ok((mut slot, _)) = slots.get_mut(entity) else {
                    return;
                };
                let ty = slot.accepted_type();
                let Some(occupant) = slot.uninstall() else {
                    return;
                };
                ev_removed.send(PartRemoved { part_type: ty });
                if let Ok((_, mut location, mut transform)) = parts.get_mut(occupant) {
                    *location = PartLocation::Held;
                    grab(&mut hand, &mut carry, &settings, occupant, ty, &mut transform);
                } else {
                    warn!("slot occupant vanished during uninstall");
                }
            }
            _ => {}
        },
        // Carrying: install into the matching empty slot, otherwise drop.
        Some((held, held_ty)) => {
            if let Candidate::Slot(slot_entity) = target.candidate {
                if let Ok((mut slot, slot_transform)) = slots.get_mut(slot_entity) {
                    // install re-validates type and occupancy.
                    if slot.install(held, held_ty) {
                        if let Ok((_, mut location, mut transform)) = parts.get_mut(held) {
                            *location = PartLocation::Installed(slot_entity);
                            let snapped = slot_transform.compute_transform();
                            transform.translation = snapped.translation;
                            transform.rotation = snapped.rotation;
                            transform.scale = Vec3::ONE;
                        }
                        hand.held = None;
                        carry.0 = 1.0;
                        ev_installed.send(PartInstalled { part_type: held_ty });
                        info!("{} installed", held_ty.label());
                        return;
                    }
                }
            }
            drop_part(&mut hand, &mut carry, &camera, &mut parts, held, held_ty);
        }
    }
}

fn grab(
    hand: &mut Hand,
    carry: &mut CarrySpeed,
    settings: &InteractSettings,
    entity: Entity,
    ty: PartType,
    transform: &mut Transform,
) {
    transform.scale = Vec3::splat(settings.held_scale);
    hand.held = Some((entity, ty));
    hand.carry_distance = settings.carry_distance_default;
    carry.0 = ty.carry_speed_factor().clamp(0.1, 1.0);
    info!("picked up {}", ty.label());
}

/// Deliberate fallback while carrying: anything that isn't a matching slot
/// puts the part back into the world in front of the player.
fn drop_part(
    hand: &mut Hand,
    carry: &mut CarrySpeed,
    camera: &Query<&GlobalTransform, With<PlayerCamera>>,
    parts: &mut Query<(&Part, &mut PartLocation, &mut Transform)>,
    held: Entity,
    held_ty: PartType,
) {
    if let Ok((_, mut location, mut transform)) = parts.get_mut(held) {
        *location = PartLocation::World;
        transform.scale = Vec3::ONE;
        if let Ok(cam) = camera.get_single() {
            let cam = cam.compute_transform();
            let mut pos = cam.translation + *cam.forward() * hand.carry_distance;
            pos.y = pos.y.max(0.25);
            transform.translation = pos;
            transform.rotation = Quat::from_rotation_y(
                rand::thread_rng().gen_range(0.0..std::f32::consts::TAU),
            );
        }
    }
    hand.held = None;
    carry.0 = 1.0;
    info!("dropped {}", held_ty.label());
}

fn adjust_carry_distance(
    input: Res<InteractInput>,
    settings: Res<InteractSettings>,
    mut hand: ResMut<Hand>,
) {
    if hand.is_empty() || input.scroll == 0.0 {
        return;
    }
    hand.carry_distance = (hand.carry_distance + input.scroll * settings.scroll_sensitivity)
        .clamp(settings.carry_distance_min, settings.carry_distance_max);
}

/// Held parts float at `camera + forward * carry_distance`, interpolated
/// the same way the renderer smooths everything else.
fn follow_held_part(
    time: Res<Time>,
    hand: Res<Hand>,
    settings: Res<InteractSettings>,
    camera: Query<&GlobalTransform, With<PlayerCamera>>,
    mut parts: Query<&mut Transform, With<Part>>,
) {
    let Some(held) = hand.held_entity() else {
        return;
    };
    let Ok(cam) = camera.get_single() else {
        return;
    };
    let Ok(mut transform) = parts.get_mut(held) else {
        return;
    };
    let cam = cam.compute_transform();
    let goal = cam.translation + *cam.forward() * hand.carry_distance;
    let lerp = (1.0 - (-settings.follow_rate * time.delta_seconds()).exp()).clamp(0.0, 1.0);
    transform.translation = transform.translation.lerp(goal, lerp);
    transform.rotation = cam.rotation;
}

fn apply_slot_preview(
    mut ev_look: EventReader<SlotLookChanged>,
    mut slots: Query<(&SlotVisual, &mut Handle<StandardMaterial>)>,
) {
    for ev in ev_look.read() {
        if let Ok((visual, mut material)) = slots.get_mut(ev.slot) {
            *material = if ev.looking && ev.type_matches {
                visual.preview.clone()
            } else {
                visual.normal.clone()
            };
        }
    }
}

/// Slot ghost markers hide while occupied so the installed part shows.
fn update_slot_markers(mut slots: Query<(&PartSlot, &mut Visibility)>) {
    for (slot, mut visibility) in &mut slots {
        *visibility = if slot.is_installed() {
            Visibility::Hidden
        } else {
            Visibility::Inherited
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hinge::{DoorKind, HingeFrame};
    use bevy::ecs::system::RunSystemOnce;

    fn interact_world() -> World {
        let mut world = World::new();
        world.init_resource::<InteractSettings>();
        world.init_resource::<InteractInput>();
        world.init_resource::<CurrentTarget>();
        world.init_resource::<LookedSlot>();
        world.init_resource::<Hand>();
        world.insert_resource(CarrySpeed(1.0));
        world.init_resource::<Events<SlotLookChanged>>();
        world.init_resource::<Events<PartInstalled>>();
        world.init_resource::<Events<PartRemoved>>();
        // Camera at the origin looking down -Z.
        world.spawn((PlayerCamera::default(), GlobalTransform::default()));
        world
    }

    fn spawn_world_part(world: &mut World, ty: PartType, pos: Vec3) -> Entity {
        world
            .spawn((
                Part { part_type: ty },
                PartLocation::World,
                Transform::from_translation(pos),
                GlobalTransform::from(Transform::from_translation(pos)),
                InteractVolume {
                    half_extents: Vec3::splat(0.25),
                },
            ))
            .id()
    }

    fn spawn_slot(world: &mut World, ty: PartType, pos: Vec3) -> Entity {
        world
            .spawn((
                PartSlot::new(ty),
                Transform::from_translation(pos),
                GlobalTransform::from(Transform::from_translation(pos)),
                InteractVolume {
                    half_extents: Vec3::splat(0.25),
                },
            ))
            .id()
    }

    fn activate(world: &mut World) {
        world.resource_mut::<InteractInput>().activate = true;
        world.run_system_once(handle_activate);
    }

    fn aim_at(world: &mut World, candidate: Candidate) {
        world.resource_mut::<CurrentTarget>().candidate = candidate;
    }

    /// Every part has exactly one location, and at most one is held.
    fn assert_invariants(world: &mut World) {
        let hand_held = world.resource::<Hand>().held_entity();
        let mut held_count = 0;
        let mut parts = world.query::<(Entity, &PartLocation)>();
        let locations: Vec<(Entity, PartLocation)> = parts
            .iter(world)
            .map(|(entity, loc)| (entity, *loc))
            .collect();
        for (entity, location) in &locations {
            if *location == PartLocation::Held {
                held_count += 1;
                assert_eq!(hand_held, Some(*entity));
            }
        }
        assert!(held_count <= 1);
        let mut slots = world.query::<(Entity, &PartSlot)>();
        let occupancy: Vec<(Entity, Option<Entity>)> = slots
            .iter(world)
            .map(|(entity, slot)| (entity, slot.occupant()))
            .collect();
        for (slot_entity, occupant) in occupancy {
            let installed_here = locations
                .iter()
                .filter(|(_, loc)| *loc == PartLocation::Installed(slot_entity))
                .count();
            match occupant {
                Some(part) => {
                    assert_eq!(installed_here, 1);
                    assert_eq!(
                        world.get::<PartLocation>(part).copied(),
                        Some(PartLocation::Installed(slot_entity))
                    );
                }
                None => assert_eq!(installed_here, 0),
            }
        }
    }

    #[test]
    fn ray_hits_box_ahead_and_misses_behind() {
        let hit = ray_box_intersection(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -2.0), Vec3::splat(0.5));
        assert!(hit.is_some());
        assert!((hit.unwrap() - 1.5).abs() < 1e-5);
        let behind =
            ray_box_intersection(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 2.0), Vec3::splat(0.5));
        assert!(behind.is_none());
    }

    #[test]
    fn ray_from_inside_box_hits_at_zero() {
        let hit = ray_box_intersection(Vec3::ZERO, Vec3::NEG_Z, Vec3::ZERO, Vec3::splat(1.0));
        assert_eq!(hit, Some(0.0));
    }

    #[test]
    fn resolver_picks_nearest_candidate_in_range() {
        let mut world = interact_world();
        let near = spawn_world_part(&mut world, PartType::Battery, Vec3::new(0.0, 0.0, -1.0));
        let _far = spawn_world_part(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -2.0));
        let _out = spawn_world_part(&mut world, PartType::Seat, Vec3::new(0.0, 0.0, -9.0));

        world.run_system_once(resolve_target);
        let target = world.resource::<CurrentTarget>();
        assert_eq!(target.candidate, Candidate::Part(near));
        assert!(target.eligible);
    }

    #[test]
    fn resolver_degrades_without_camera() {
        let mut world = interact_world();
        spawn_world_part(&mut world, PartType::Battery, Vec3::new(0.0, 0.0, -1.0));
        let cameras: Vec<Entity> = world
            .query_filtered::<Entity, With<PlayerCamera>>()
            .iter(&world)
            .collect();
        for cam in cameras {
            world.despawn(cam);
        }
        world.run_system_once(resolve_target);
        assert_eq!(world.resource::<CurrentTarget>().candidate, Candidate::None);
    }

    #[test]
    fn held_part_is_transparent_to_the_ray() {
        let mut world = interact_world();
        let part = spawn_world_part(&mut world, PartType::Battery, Vec3::new(0.0, 0.0, -1.0));
        let slot = spawn_slot(&mut world, PartType::Battery, Vec3::new(0.0, 0.0, -2.0));
        *world.get_mut::<PartLocation>(part).unwrap() = PartLocation::Held;
        world.resource_mut::<Hand>().held = Some((part, PartType::Battery));

        world.run_system_once(resolve_target);
        assert_eq!(
            world.resource::<CurrentTarget>().candidate,
            Candidate::Slot(slot)
        );
    }

    #[test]
    fn look_changed_fires_once_per_slot_change() {
        let mut world = interact_world();
        let slot_a = spawn_slot(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        let slot_b = spawn_slot(&mut world, PartType::Seat, Vec3::new(0.0, 3.0, -1.0));

        world.run_system_once(resolve_target);
        let events: Vec<(Entity, bool, bool)> = world
            .resource_mut::<Events<SlotLookChanged>>()
            .drain()
            .map(|ev| (ev.slot, ev.looking, ev.type_matches))
            .collect();
        assert_eq!(events, vec![(slot_a, true, false)]);

        // Same slot, same state: silent.
        world.run_system_once(resolve_target);
        assert_eq!(world.resource_mut::<Events<SlotLookChanged>>().drain().count(), 0);

        // Move slot B in front of slot A: clear then set, in that order.
        world.get_mut::<Transform>(slot_b).unwrap().translation = Vec3::new(0.0, 0.0, -0.5);
        *world.get_mut::<GlobalTransform>(slot_b).unwrap() =
            GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -0.5));
        world.run_system_once(resolve_target);
        let events: Vec<(Entity, bool, bool)> = world
            .resource_mut::<Events<SlotLookChanged>>()
            .drain()
            .map(|ev| (ev.slot, ev.looking, ev.type_matches))
            .collect();
        assert_eq!(events, vec![(slot_a, false, false), (slot_b, true, false)]);
    }

    #[test]
    fn look_changed_tracks_held_part_match() {
        let mut world = interact_world();
        let slot = spawn_slot(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        world.run_system_once(resolve_target);
        world.resource_mut::<Events<SlotLookChanged>>().drain().count();

        // Same slot, but now a matching part is in hand.
        let part = spawn_world_part(&mut world, PartType::Engine, Vec3::new(5.0, 0.0, 0.0));
        *world.get_mut::<PartLocation>(part).unwrap() = PartLocation::Held;
        world.resource_mut::<Hand>().held = Some((part, PartType::Engine));
        world.run_system_once(resolve_target);
        let events: Vec<(Entity, bool, bool)> = world
            .resource_mut::<Events<SlotLookChanged>>()
            .drain()
            .map(|ev| (ev.slot, ev.looking, ev.type_matches))
            .collect();
        assert_eq!(events, vec![(slot, true, true)]);
    }

    #[test]
    fn grab_then_wrong_slot_drops_to_world() {
        let mut world = interact_world();
        let engine = spawn_world_part(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        let seat_slot = spawn_slot(&mut world, PartType::Seat, Vec3::new(2.0, 0.0, 0.0));

        aim_at(&mut world, Candidate::Part(engine));
        activate(&mut world);
        assert_eq!(world.resource::<Hand>().held_type(), Some(PartType::Engine));
        assert_eq!(
            world.get::<PartLocation>(engine).copied(),
            Some(PartLocation::Held)
        );
        assert_eq!(world.resource::<CarrySpeed>().0, 0.5);
        assert_invariants(&mut world);

        aim_at(&mut world, Candidate::Slot(seat_slot));
        activate(&mut world);
        assert!(world.resource::<Hand>().is_empty());
        assert_eq!(
            world.get::<PartLocation>(engine).copied(),
            Some(PartLocation::World)
        );
        assert!(!world.get::<PartSlot>(seat_slot).unwrap().is_installed());
        assert_eq!(world.resource::<CarrySpeed>().0, 1.0);
        assert_invariants(&mut world);
    }

    #[test]
    fn grab_install_uninstall_round_trip() {
        let mut world = interact_world();
        let engine = spawn_world_part(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        let engine_slot = spawn_slot(&mut world, PartType::Engine, Vec3::new(2.0, 0.0, 0.0));

        aim_at(&mut world, Candidate::Part(engine));
        activate(&mut world);

        aim_at(&mut world, Candidate::Slot(engine_slot));
        activate(&mut world);
        assert!(world.resource::<Hand>().is_empty());
        assert_eq!(
            world.get::<PartLocation>(engine).copied(),
            Some(PartLocation::Installed(engine_slot))
        );
        assert_eq!(
            world.get::<PartSlot>(engine_slot).unwrap().occupant(),
            Some(engine)
        );
        assert_eq!(
            world.resource_mut::<Events<PartInstalled>>().drain().count(),
            1
        );
        assert_invariants(&mut world);

        // Removing yields the very same part back into the hand.
        activate(&mut world);
        assert_eq!(world.resource::<Hand>().held_entity(), Some(engine));
        assert_eq!(
            world.get::<PartLocation>(engine).copied(),
            Some(PartLocation::Held)
        );
        assert!(!world.get::<PartSlot>(engine_slot).unwrap().is_installed());
        assert_eq!(
            world.resource_mut::<Events<PartRemoved>>().drain().count(),
            1
        );
        assert_invariants(&mut world);
    }

    #[test]
    fn activate_with_no_candidate_and_empty_hand_is_a_noop() {
        let mut world = interact_world();
        let engine = spawn_world_part(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        aim_at(&mut world, Candidate::None);
        activate(&mut world);
        assert!(world.resource::<Hand>().is_empty());
        assert_eq!(
            world.get::<PartLocation>(engine).copied(),
            Some(PartLocation::World)
        );
    }

    #[test]
    fn activate_on_empty_slot_with_empty_hand_is_a_noop() {
        let mut world = interact_world();
        let slot = spawn_slot(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        aim_at(&mut world, Candidate::Slot(slot));
        activate(&mut world);
        assert!(world.resource::<Hand>().is_empty());
        assert!(!world.get::<PartSlot>(slot).unwrap().is_installed());
    }

    #[test]
    fn drop_with_no_candidate_while_carrying() {
        let mut world = interact_world();
        let seat = spawn_world_part(&mut world, PartType::Seat, Vec3::new(0.0, 0.0, -1.0));
        aim_at(&mut world, Candidate::Part(seat));
        activate(&mut world);
        assert!(!world.resource::<Hand>().is_empty());

        aim_at(&mut world, Candidate::None);
        activate(&mut world);
        assert!(world.resource::<Hand>().is_empty());
        assert_eq!(
            world.get::<PartLocation>(seat).copied(),
            Some(PartLocation::World)
        );
        // Full scale restored on drop.
        assert_eq!(world.get::<Transform>(seat).unwrap().scale, Vec3::ONE);
        assert_invariants(&mut world);
    }

    #[test]
    fn carry_distance_clamps_at_both_ends() {
        let mut world = interact_world();
        let seat = spawn_world_part(&mut world, PartType::Seat, Vec3::new(0.0, 0.0, -1.0));
        aim_at(&mut world, Candidate::Part(seat));
        activate(&mut world);

        world.resource_mut::<InteractInput>().scroll = 100.0;
        world.run_system_once(adjust_carry_distance);
        assert_eq!(world.resource::<Hand>().carry_distance, 2.0);

        world.resource_mut::<InteractInput>().scroll = -100.0;
        world.run_system_once(adjust_carry_distance);
        assert_eq!(world.resource::<Hand>().carry_distance, 0.5);
    }

    #[test]
    fn prompts_follow_hand_and_slot_state() {
        let mut world = interact_world();
        let slot = spawn_slot(&mut world, PartType::Engine, Vec3::new(0.0, 0.0, -1.0));
        world.run_system_once(resolve_target);
        {
            let target = world.resource::<CurrentTarget>();
            assert_eq!(target.prompt.as_deref(), Some("Install engine [F]"));
            assert!(!target.eligible);
        }

        let part = spawn_world_part(&mut world, PartType::Engine, Vec3::new(5.0, 0.0, 0.0));
        *world.get_mut::<PartLocation>(part).unwrap() = PartLocation::Held;
        world.resource_mut::<Hand>().held = Some((part, PartType::Engine));
        world.run_system_once(resolve_target);
        assert!(world.resource::<CurrentTarget>().eligible);

        let ty = PartType::Engine;
        world.get_mut::<PartSlot>(slot).unwrap().install(part, ty);
        *world.get_mut::<PartLocation>(part).unwrap() = PartLocation::Installed(slot);
        world.resource_mut::<Hand>().held = None;
        world.run_system_once(resolve_target);
        let target = world.resource::<CurrentTarget>();
        assert_eq!(target.prompt.as_deref(), Some("Remove engine [F]"));
        assert!(target.eligible);
    }

    #[test]
    fn non_operable_door_is_classified_but_not_eligible() {
        let mut world = interact_world();
        let slot = spawn_slot(&mut world, PartType::FrontDoorLeft, Vec3::new(5.0, 0.0, 0.0));
        let frame = HingeFrame::new(Vec3::ZERO, Vec3::Y, Transform::from_xyz(0.0, 0.0, -1.0));
        let door = world
            .spawn((
                HingeDoor::new(DoorKind::CarDoor, frame, 0.0, 70.0, Some(slot)),
                Transform::from_xyz(0.0, 0.0, -1.0),
                GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -1.0)),
                InteractVolume {
                    half_extents: Vec3::splat(0.25),
                },
            ))
            .id();

        world.run_system_once(resolve_target);
        let target = world.resource::<CurrentTarget>();
        assert_eq!(target.candidate, Candidate::Door(door));
        assert!(!target.eligible);
        assert!(target.prompt.is_none());
    }
}
