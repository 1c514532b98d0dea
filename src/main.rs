mod hinge;
mod interact;
mod parts;
mod player;
mod scene;
mod ui;

use bevy::prelude::*;
use hinge::HingePlugin;
use interact::InteractPlugin;
use parts::AssemblyPlugin;
use player::{AppState, PlayerPlugin};
use scene::ScenePlugin;
use ui::UiPlugin;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.12, 0.12, 0.14)))
        .insert_resource(Msaa::Sample4)
        .init_state::<AppState>()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "rustbucket-rs — garage assembly".into(),
                resolution: (1400., 900.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            ScenePlugin,
            PlayerPlugin,
            InteractPlugin,
            HingePlugin,
            AssemblyPlugin,
            UiPlugin,
        ))
        .run();
}
