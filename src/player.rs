use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Playing,
    Menu,
}

/// Locomotion multiplier while carrying something heavy. Written by the
/// hand on grab/drop/install, read here.
#[derive(Resource)]
pub struct CarrySpeed(pub f32);

impl Default for CarrySpeed {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Resource)]
pub struct MoveSettings {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub crouch_speed: f32,
    pub input_smooth_rate: f32,
    pub jump_force: f32,
    pub gravity: f32,
    pub eye_height: f32,
    pub crouch_camera_drop: f32,
    pub crouch_transition_rate: f32,
    pub mouse_sensitivity: f32,
    pub max_look_angle: f32,
    pub walk_bob: (f32, f32),
    pub run_bob: (f32, f32),
    pub crouch_bob: (f32, f32),
    pub bob_smooth_rate: f32,
}

impl Default for MoveSettings {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            run_speed: 9.0,
            crouch_speed: 2.5,
            input_smooth_rate: 10.0,
            jump_force: 7.0,
            gravity: 20.0,
            eye_height: 1.6,
            crouch_camera_drop: 0.5,
            crouch_transition_rate: 8.0,
            // Degrees of turn per pixel of mouse travel.
            mouse_sensitivity: 0.12,
            max_look_angle: 80.0,
            walk_bob: (10.0, 0.03),
            run_bob: (14.0, 0.05),
            crouch_bob: (6.0, 0.015),
            bob_smooth_rate: 10.0,
        }
    }
}

/// Kinematic capsule root; translation.y is the feet, floor is y = 0.
#[derive(Component)]
pub struct PlayerBody;

#[derive(Component, Default)]
pub struct Locomotion {
    vertical_velocity: f32,
    smoothed_input: Vec2,
    pub grounded: bool,
    pub sprinting: bool,
    pub crouching: bool,
    pub crouch_ratio: f32,
}

impl Locomotion {
    pub fn moving(&self) -> bool {
        self.smoothed_input.length_squared() > 0.01
    }
}

/// First-person camera, child of the body. Pitch and bob are camera-local;
/// yaw lives on the body.
#[derive(Component, Default)]
pub struct PlayerCamera {
    pitch: f32,
    bob_timer: f32,
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MoveSettings>()
            .init_resource::<CarrySpeed>()
            .add_systems(Startup, spawn_player)
            .add_systems(
                Update,
                (mouse_look, movement).run_if(in_state(AppState::Playing)),
            )
            .add_systems(Update, (head_bob, menu_toggle))
            .add_systems(OnEnter(AppState::Playing), grab_cursor)
            .add_systems(OnEnter(AppState::Menu), release_cursor);
    }
}

fn spawn_player(mut commands: Commands, settings: Res<MoveSettings>) {
    commands
        .spawn((
            PlayerBody,
            Locomotion::default(),
            SpatialBundle::from_transform(Transform::from_xyz(0.0, 0.0, 6.0)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Camera3dBundle {
                    transform: Transform::from_xyz(0.0, settings.eye_height, 0.0),
                    ..default()
                },
                PlayerCamera::default(),
            ));
        });
}

fn mouse_look(
    settings: Res<MoveSettings>,
    mut motion: EventReader<MouseMotion>,
    mut body: Query<&mut Transform, (With<PlayerBody>, Without<PlayerCamera>)>,
    mut camera: Query<(&mut Transform, &mut PlayerCamera), Without<PlayerBody>>,
) {
    let Ok(mut body_transform) = body.get_single_mut() else {
        return;
    };
    let Ok((mut cam_transform, mut cam)) = camera.get_single_mut() else {
        return;
    };

    let mut delta = Vec2::ZERO;
    for ev in motion.read() {
        delta += ev.delta;
    }
    if delta == Vec2::ZERO {
        return;
    }

    let yaw = -delta.x * settings.mouse_sensitivity;
    body_transform.rotate_y(yaw.to_radians());

    cam.pitch = (cam.pitch - delta.y * settings.mouse_sensitivity)
        .clamp(-settings.max_look_angle, settings.max_look_angle);
    cam_transform.rotation = Quat::from_rotation_x(cam.pitch.to_radians());
}

fn movement(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<MoveSettings>,
    carry: Res<CarrySpeed>,
    mut body: Query<(&mut Transform, &mut Locomotion), With<PlayerBody>>,
) {
    let dt = time.delta_seconds();
    let Ok((mut transform, mut loco)) = body.get_single_mut() else {
        return;
    };

    let mut input = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        input.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        input.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        input.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        input.x += 1.0;
    }
    let input = input.normalize_or_zero();

    loco.crouching = keys.pressed(KeyCode::ControlLeft);
    loco.sprinting = keys.pressed(KeyCode::ShiftLeft) && !loco.crouching;

    let smooth = (1.0 - (-settings.input_smooth_rate * dt).exp()).clamp(0.0, 1.0);
    loco.smoothed_input = loco.smoothed_input.lerp(input, smooth);

    let crouch_target = if loco.crouching { 1.0 } else { 0.0 };
    let crouch_step = (1.0 - (-settings.crouch_transition_rate * dt).exp()).clamp(0.0, 1.0);
    loco.crouch_ratio += (crouch_target - loco.crouch_ratio) * crouch_step;

    let base_speed = if loco.crouching {
        settings.crouch_speed
    } else if loco.sprinting && loco.moving() {
        settings.run_speed
    } else {
        settings.walk_speed
    };
    let speed = base_speed * carry.0.clamp(0.1, 1.0);

    // The body only ever yaws, so forward/right stay horizontal.
    let forward = *transform.forward();
    let right = *transform.right();
    let horizontal = (right * loco.smoothed_input.x + forward * loco.smoothed_input.y) * speed;

    if loco.grounded && keys.just_pressed(KeyCode::Space) && !loco.crouching {
        loco.vertical_velocity = settings.jump_force;
    }
    loco.vertical_velocity -= settings.gravity * dt;

    transform.translation += horizontal * dt;
    transform.translation.y += loco.vertical_velocity * dt;
    if transform.translation.y <= 0.0 {
        transform.translation.y = 0.0;
        loco.vertical_velocity = loco.vertical_velocity.max(0.0);
        loco.grounded = true;
    } else {
        loco.grounded = false;
    }
}

/// Sine bob while grounded and moving, crouch offset folded into the base
/// height, smooth return to rest otherwise.
fn head_bob(
    time: Res<Time>,
    settings: Res<MoveSettings>,
    body: Query<&Locomotion, With<PlayerBody>>,
    mut camera: Query<(&mut Transform, &mut PlayerCamera)>,
) {
    let dt = time.delta_seconds();
    let Ok(loco) = body.get_single() else {
        return;
    };
    let Ok((mut transform, mut cam)) = camera.get_single_mut() else {
        return;
    };

    let base_y = settings.eye_height - loco.crouch_ratio * settings.crouch_camera_drop;
    let target_y = if loco.grounded && loco.moving() {
        let (bob_speed, bob_amount) = if loco.crouching {
            settings.crouch_bob
        } else if loco.sprinting {
            settings.run_bob
        } else {
            settings.walk_bob
        };
        cam.bob_timer += dt * bob_speed;
        base_y + cam.bob_timer.sin() * bob_amount
    } else {
        cam.bob_timer = 0.0;
        base_y
    };

    let smooth = (1.0 - (-settings.bob_smooth_rate * dt).exp()).clamp(0.0, 1.0);
    transform.translation.y += (target_y - transform.translation.y) * smooth;
}

fn menu_toggle(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<AppState>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        next_state.set(match state.get() {
            AppState::Playing => AppState::Menu,
            AppState::Menu => AppState::Playing,
        });
    }
}

fn grab_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.get_single_mut() {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
    }
}

fn release_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.get_single_mut() {
        window.cursor.grab_mode = CursorGrabMode::None;
        window.cursor.visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use std::time::Duration;

    fn movement_world() -> (World, Entity) {
        let mut world = World::new();
        world.init_resource::<MoveSettings>();
        world.init_resource::<CarrySpeed>();
        world.init_resource::<ButtonInput<KeyCode>>();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_millis(16));
        world.insert_resource(time);
        let body = world
            .spawn((PlayerBody, Locomotion::default(), Transform::default()))
            .id();
        (world, body)
    }

    #[test]
    fn body_stays_on_the_floor_under_gravity() {
        let (mut world, body) = movement_world();
        for _ in 0..10 {
            world
                .resource_mut::<Time>()
                .advance_by(Duration::from_millis(16));
            world.run_system_once(movement);
        }
        let transform = world.get::<Transform>(body).unwrap();
        assert_eq!(transform.translation.y, 0.0);
        assert!(world.get::<Locomotion>(body).unwrap().grounded);
    }

    #[test]
    fn crouch_ratio_rises_while_crouching() {
        let (mut world, body) = movement_world();
        world
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::ControlLeft);
        for _ in 0..30 {
            world
                .resource_mut::<Time>()
                .advance_by(Duration::from_millis(16));
            world.run_system_once(movement);
        }
        let loco = world.get::<Locomotion>(body).unwrap();
        assert!(loco.crouching);
        assert!(loco.crouch_ratio > 0.8);
    }
}
