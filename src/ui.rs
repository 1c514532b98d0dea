use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::interact::{CurrentTarget, Hand, InteractSettings};
use crate::parts::{Assembly, AssemblyComplete};
use crate::player::{AppState, MoveSettings};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<UiState>()
            .init_resource::<CompleteBanner>()
            .add_systems(
                Update,
                (crosshair_ui, hud_ui, banner_ui).run_if(in_state(AppState::Playing)),
            )
            .add_systems(Update, menu_ui.run_if(in_state(AppState::Menu)))
            .add_systems(Update, watch_complete);
    }
}

#[derive(Resource)]
struct UiState {
    show_help: bool,
    show_progress: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_help: true,
            show_progress: true,
        }
    }
}

/// Countdown for the one-shot completion splash. Starts expired.
#[derive(Resource)]
struct CompleteBanner {
    timer: Timer,
}

impl Default for CompleteBanner {
    fn default() -> Self {
        let mut timer = Timer::from_seconds(4.0, TimerMode::Once);
        let duration = timer.duration();
        timer.tick(duration);
        Self { timer }
    }
}

fn watch_complete(
    mut ev_complete: EventReader<AssemblyComplete>,
    mut banner: ResMut<CompleteBanner>,
) {
    for _ in ev_complete.read() {
        banner.timer.reset();
    }
}

/// Dot crosshair plus the action prompt, painted straight onto the
/// foreground layer so no window chrome sits in the middle of the view.
fn crosshair_ui(mut contexts: EguiContexts, target: Res<CurrentTarget>) {
    let ctx = contexts.ctx_mut();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("crosshair"),
    ));
    let center = ctx.screen_rect().center();

    let color = if target.eligible {
        egui::Color32::from_rgb(90, 220, 90)
    } else {
        egui::Color32::from_gray(200)
    };
    painter.circle_filled(center, 2.5, color);
    painter.circle_stroke(center, 5.0, egui::Stroke::new(1.0, color));

    if let Some(prompt) = &target.prompt {
        painter.text(
            center + egui::vec2(0.0, 28.0),
            egui::Align2::CENTER_TOP,
            prompt,
            egui::FontId::proportional(16.0),
            egui::Color32::WHITE,
        );
    }
}

fn hud_ui(
    mut contexts: EguiContexts,
    ui_state: Res<UiState>,
    assembly: Res<Assembly>,
    hand: Res<Hand>,
) {
    if ui_state.show_progress {
        egui::Window::new("Garage")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
            .resizable(false)
            .show(contexts.ctx_mut(), |ui| {
                ui.label(format!(
                    "Installed: {} / {}",
                    assembly.installed_count, assembly.total_slots
                ));
                ui.add(egui::ProgressBar::new(assembly.progress()).show_percentage());
                if assembly.is_complete() {
                    ui.label("Fully assembled!");
                } else if assembly.can_start() {
                    ui.label("The engine would turn over.");
                } else {
                    ui.label("Not yet drivable.");
                }
                if let Some(ty) = hand.held_type() {
                    ui.separator();
                    ui.label(format!("Carrying: {}", ty.label()));
                }
            });
    }

    if ui_state.show_help {
        egui::Window::new("Help")
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
            .resizable(false)
            .show(contexts.ctx_mut(), |ui| {
                ui.label("WASD: Move");
                ui.label("Shift: Run");
                ui.label("Ctrl: Crouch");
                ui.label("Space: Jump");
                ui.label("F: Pick up / Install / Remove / Drop");
                ui.label("Mouse Wheel: Carry Distance");
                ui.label("Left Mouse (drag): Swing Doors");
                ui.label("Esc: Menu");
            });
    }
}

fn banner_ui(time: Res<Time>, mut contexts: EguiContexts, mut banner: ResMut<CompleteBanner>) {
    banner.timer.tick(time.delta());
    if banner.timer.finished() {
        return;
    }
    egui::Window::new("complete_banner")
        .title_bar(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 60.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.heading("The car is back in one piece!");
        });
}

fn menu_ui(
    mut contexts: EguiContexts,
    mut ui_state: ResMut<UiState>,
    mut interact: ResMut<InteractSettings>,
    mut movement: ResMut<MoveSettings>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    egui::Window::new("Paused")
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            if ui.button("Resume").clicked() {
                next_state.set(AppState::Playing);
            }

            ui.separator();

            ui.checkbox(&mut ui_state.show_help, "Show Help");
            ui.checkbox(&mut ui_state.show_progress, "Show Progress");

            ui.separator();

            ui.add(
                egui::Slider::new(&mut movement.mouse_sensitivity, 0.02..=0.5)
                    .text("Mouse Sensitivity"),
            );
            ui.add(egui::Slider::new(&mut interact.range, 1.0..=6.0).text("Reach"));
            ui.add(
                egui::Slider::new(&mut interact.scroll_sensitivity, 0.02..=0.5)
                    .text("Carry Scroll Speed"),
            );
        });
}
