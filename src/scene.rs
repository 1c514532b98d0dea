use bevy::prelude::*;

use crate::hinge::{DoorKind, HingeDoor, HingeFrame};
use crate::interact::{InteractVolume, SlotVisual};
use crate::parts::{Assembly, Part, PartLocation, PartSlot, PartType};

/// Composition root: the whole garage is assembled here with explicit
/// spawn calls, so every slot/part/door reference is wired at creation.
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_garage, spawn_vehicle));
    }
}

/// One slot per catalog entry. `true` = the part starts installed; the
/// rest lie loose on the garage floor.
const SLOT_LAYOUT: [(PartType, Vec3, bool); 18] = [
    (PartType::FrontFenderLeft, Vec3::new(-1.05, 0.55, -1.5), true),
    (PartType::FrontFenderRight, Vec3::new(1.05, 0.55, -1.5), true),
    (PartType::FrontDoorLeft, Vec3::new(-1.05, 0.8, -0.4), true),
    (PartType::FrontDoorRight, Vec3::new(1.05, 0.8, -0.4), true),
    (PartType::RearDoorLeft, Vec3::new(-1.05, 0.8, 0.6), true),
    (PartType::RearDoorRight, Vec3::new(1.05, 0.8, 0.6), true),
    (PartType::SteeringWheel, Vec3::new(-0.4, 1.0, -0.7), false),
    (PartType::Seat, Vec3::new(-0.4, 0.9, 0.0), true),
    (PartType::Engine, Vec3::new(0.0, 0.8, -1.6), false),
    (PartType::Battery, Vec3::new(0.45, 0.85, -1.4), false),
    (PartType::Trunk, Vec3::new(0.0, 1.0, 1.9), true),
    (PartType::RearBumper, Vec3::new(0.0, 0.45, 2.2), true),
    (PartType::Hood, Vec3::new(0.0, 1.05, -1.3), false),
    (PartType::FuelTank, Vec3::new(0.9, 0.6, 1.4), false),
    (PartType::WheelFrontLeft, Vec3::new(-1.05, 0.35, -1.4), false),
    (PartType::WheelFrontRight, Vec3::new(1.05, 0.35, -1.4), false),
    (PartType::WheelRearLeft, Vec3::new(-1.05, 0.35, 1.4), false),
    (PartType::WheelRearRight, Vec3::new(1.05, 0.35, 1.4), false),
];

/// Where the loose parts wait for the player.
const LOOSE_SPOTS: [Vec3; 8] = [
    Vec3::new(-4.5, 0.0, 4.0),
    Vec3::new(-2.5, 0.0, 5.5),
    Vec3::new(-0.5, 0.0, 4.5),
    Vec3::new(1.5, 0.0, 6.0),
    Vec3::new(3.5, 0.0, 4.0),
    Vec3::new(5.0, 0.0, 5.5),
    Vec3::new(-5.5, 0.0, 6.5),
    Vec3::new(4.5, 0.0, 7.0),
];

fn part_size(ty: PartType) -> Vec3 {
    match ty {
        PartType::Engine => Vec3::new(0.8, 0.6, 0.7),
        PartType::Battery => Vec3::new(0.3, 0.25, 0.2),
        PartType::FuelTank => Vec3::new(0.6, 0.3, 0.5),
        PartType::Seat => Vec3::new(0.5, 0.9, 0.5),
        PartType::SteeringWheel => Vec3::new(0.4, 0.4, 0.1),
        PartType::Hood | PartType::Trunk => Vec3::new(1.4, 0.08, 1.1),
        PartType::RearBumper => Vec3::new(1.9, 0.25, 0.2),
        PartType::FrontFenderLeft | PartType::FrontFenderRight => Vec3::new(0.15, 0.4, 1.0),
        PartType::FrontDoorLeft
        | PartType::FrontDoorRight
        | PartType::RearDoorLeft
        | PartType::RearDoorRight => Vec3::new(0.1, 0.8, 0.9),
        PartType::WheelFrontLeft
        | PartType::WheelFrontRight
        | PartType::WheelRearLeft
        | PartType::WheelRearRight => Vec3::new(0.25, 0.65, 0.65),
    }
}

fn part_color(ty: PartType) -> Color {
    match ty {
        PartType::Engine => Color::srgb(0.45, 0.45, 0.5),
        PartType::Battery => Color::srgb(0.1, 0.1, 0.12),
        PartType::FuelTank => Color::srgb(0.7, 0.25, 0.2),
        PartType::Seat => Color::srgb(0.35, 0.22, 0.12),
        PartType::SteeringWheel => Color::srgb(0.12, 0.12, 0.12),
        PartType::Hood | PartType::Trunk => Color::srgb(0.65, 0.1, 0.1),
        PartType::RearBumper => Color::srgb(0.75, 0.75, 0.78),
        PartType::FrontFenderLeft | PartType::FrontFenderRight => Color::srgb(0.6, 0.1, 0.1),
        PartType::FrontDoorLeft
        | PartType::FrontDoorRight
        | PartType::RearDoorLeft
        | PartType::RearDoorRight => Color::srgb(0.62, 0.11, 0.1),
        PartType::WheelFrontLeft
        | PartType::WheelFrontRight
        | PartType::WheelRearLeft
        | PartType::WheelRearRight => Color::srgb(0.08, 0.08, 0.08),
    }
}

fn spawn_garage(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn(PbrBundle {
        mesh: meshes.add(Plane3d::default().mesh().size(30.0, 30.0)),
        material: materials.add(Color::srgb(0.25, 0.25, 0.27)),
        ..default()
    });

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 120.0,
    });
    for x in [-5.0, 5.0] {
        commands.spawn(PointLightBundle {
            point_light: PointLight {
                intensity: 2_000_000.0,
                range: 40.0,
                shadows_enabled: true,
                ..default()
            },
            transform: Transform::from_xyz(x, 5.0, 2.0),
            ..default()
        });
    }
}

fn spawn_vehicle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut assembly: ResMut<Assembly>,
) {
    // The car only starts once the drivetrain essentials are in.
    assembly.required = [
        PartType::Engine,
        PartType::Battery,
        PartType::FuelTank,
        PartType::SteeringWheel,
        PartType::WheelFrontLeft,
        PartType::WheelFrontRight,
        PartType::WheelRearLeft,
        PartType::WheelRearRight,
    ]
    .into_iter()
    .collect();

    // Chassis shell, not interactable.
    let shell = materials.add(Color::srgb(0.55, 0.09, 0.09));
    commands.spawn(PbrBundle {
        mesh: meshes.add(Cuboid::new(1.9, 0.5, 4.2)),
        material: shell.clone(),
        transform: Transform::from_xyz(0.0, 0.6, 0.0),
        ..default()
    });
    commands.spawn(PbrBundle {
        mesh: meshes.add(Cuboid::new(1.7, 0.7, 2.0)),
        material: shell,
        transform: Transform::from_xyz(0.0, 1.2, 0.1),
        ..default()
    });

    let mut slot_entities: Vec<(PartType, Entity)> = Vec::with_capacity(SLOT_LAYOUT.len());
    let mut loose_spot = LOOSE_SPOTS.iter().cycle();

    for (ty, mount, starts_installed) in SLOT_LAYOUT {
        let size = part_size(ty);
        let normal = materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, 0.12),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        });
        let preview = materials.add(StandardMaterial {
            base_color: Color::srgba(0.0, 1.0, 0.0, 0.35),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        });

        let slot_entity = commands
            .spawn((
                PbrBundle {
                    mesh: meshes.add(Cuboid::new(size.x, size.y, size.z)),
                    material: normal.clone(),
                    transform: Transform::from_translation(mount),
                    ..default()
                },
                SlotVisual { normal, preview },
                InteractVolume {
                    half_extents: size * 0.5 + Vec3::splat(0.05),
                },
            ))
            .id();

        let mut slot = PartSlot::new(ty);
        if starts_installed {
            let part_entity = spawn_part(
                &mut commands,
                &mut meshes,
                &mut materials,
                ty,
                mount,
                PartLocation::Installed(slot_entity),
            );
            if !slot.install(part_entity, ty) {
                warn!("pre-installed {} rejected by its slot", ty.label());
            }
        } else {
            let spot = loose_spot.next().copied().unwrap_or(Vec3::new(0.0, 0.0, 5.0));
            let rest = spot + Vec3::new(0.0, size.y * 0.5, 0.0);
            spawn_part(
                &mut commands,
                &mut meshes,
                &mut materials,
                ty,
                rest,
                PartLocation::World,
            );
        }
        commands.entity(slot_entity).insert(slot);
        slot_entities.push((ty, slot_entity));
    }

    spawn_doors(&mut commands, &mut meshes, &mut materials, &slot_entities);
}

fn spawn_part(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    ty: PartType,
    position: Vec3,
    location: PartLocation,
) -> Entity {
    let size = part_size(ty);
    commands
        .spawn((
            Part { part_type: ty },
            location,
            PbrBundle {
                mesh: meshes.add(Cuboid::new(size.x, size.y, size.z)),
                material: materials.add(part_color(ty)),
                transform: Transform::from_translation(position),
                ..default()
            },
            InteractVolume {
                half_extents: size * 0.5 + Vec3::splat(0.05),
            },
        ))
        .id()
}

/// Hinged panels. Each panel's hinge frame is fixed here at spawn; gated
/// panels only swing once the linked slot is filled.
fn spawn_doors(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    slots: &[(PartType, Entity)],
) {
    let slot_for = |ty: PartType| slots.iter().find(|(t, _)| *t == ty).map(|(_, e)| *e);
    let panel = materials.add(Color::srgb(0.5, 0.08, 0.08));

    struct DoorLayout {
        kind: DoorKind,
        size: Vec3,
        rest: Vec3,
        pivot: Vec3,
        axis: Vec3,
        max_angle: f32,
        gate: Option<PartType>,
    }

    let layouts = [
        DoorLayout {
            kind: DoorKind::CarDoor,
            size: Vec3::new(0.06, 0.8, 0.9),
            rest: Vec3::new(-1.12, 0.8, -0.4),
            pivot: Vec3::new(-1.12, 0.8, -0.85),
            axis: Vec3::Y,
            max_angle: 70.0,
            gate: Some(PartType::FrontDoorLeft),
        },
        DoorLayout {
            kind: DoorKind::CarDoor,
            size: Vec3::new(0.06, 0.8, 0.9),
            rest: Vec3::new(1.12, 0.8, -0.4),
            pivot: Vec3::new(1.12, 0.8, -0.85),
            axis: Vec3::NEG_Y,
            max_angle: 70.0,
            gate: Some(PartType::FrontDoorRight),
        },
        DoorLayout {
            kind: DoorKind::Hood,
            size: Vec3::new(1.5, 0.06, 1.2),
            rest: Vec3::new(0.0, 1.12, -1.3),
            pivot: Vec3::new(0.0, 1.12, -0.7),
            axis: Vec3::X,
            max_angle: 60.0,
            gate: Some(PartType::Hood),
        },
        DoorLayout {
            kind: DoorKind::Trunk,
            size: Vec3::new(1.5, 0.06, 1.0),
            rest: Vec3::new(0.0, 1.08, 1.9),
            pivot: Vec3::new(0.0, 1.08, 1.45),
            axis: Vec3::NEG_X,
            max_angle: 60.0,
            gate: Some(PartType::Trunk),
        },
        DoorLayout {
            kind: DoorKind::FuelCap,
            size: Vec3::new(0.05, 0.2, 0.2),
            rest: Vec3::new(0.97, 0.8, 1.4),
            pivot: Vec3::new(0.97, 0.8, 1.28),
            axis: Vec3::Y,
            max_angle: 80.0,
            gate: Some(PartType::FuelTank),
        },
    ];

    for layout in layouts {
        let rest = Transform::from_translation(layout.rest);
        let frame = HingeFrame::new(layout.pivot, layout.axis, rest);
        commands.spawn((
            HingeDoor::new(
                layout.kind,
                frame,
                0.0,
                layout.max_angle,
                layout.gate.and_then(slot_for),
            ),
            PbrBundle {
                mesh: meshes.add(Cuboid::new(layout.size.x, layout.size.y, layout.size.z)),
                material: panel.clone(),
                transform: rest,
                ..default()
            },
            InteractVolume {
                half_extents: layout.size * 0.5 + Vec3::splat(0.05),
            },
        ));
    }
}
