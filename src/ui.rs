use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::input::{Control, Keybinds};
use crate::sim::{SimSettings, SimWorld};
use crate::tick::LoopState;

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, ui_system.run_if(in_state(LoopState::Running)));
    }
}

fn friction_label(friction: f64) -> &'static str {
    if friction < 0.0 {
        "heating"
    } else if friction > 0.0 {
        "cooling"
    } else {
        "off"
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    world: Res<SimWorld>,
    settings: Res<SimSettings>,
    keybinds: Res<Keybinds>,
) {
    let tunables = world.tunables;

    egui::Window::new("Tunables").show(contexts.ctx_mut(), |ui| {
        ui.label(format!("Bodies: {}", world.bodies().len()));
        ui.label(format!("Tick: {}", world.tick_count()));
        if let Some(body) = world.controlled() {
            ui.label(format!("Controlled mass: {:.3}", body.mass()));
        }

        ui.separator();

        ui.label(format!("Time scale: {:.5}", tunables.time_scale));
        ui.label(format!(
            "Friction: {:+.3} ({})",
            tunables.friction_fraction,
            friction_label(tunables.friction_fraction)
        ));
        ui.label(format!("Zoom: {:.1} px/unit", tunables.position_scaling_factor));
        ui.label(format!("G: {}", world.force_law().g));

        ui.separator();

        let p = world.momentum();
        ui.label(format!("Momentum: ({:.4}, {:.4})", p.x, p.y));
    });

    if settings.show_help {
        egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
            for control in Control::ALL {
                ui.label(format!("{:?}: {}", keybinds.key(control), control.label()));
            }
        });
    }
}
