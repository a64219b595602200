mod input;
mod physics;
mod render;
mod sim;
mod tick;
mod ui;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use input::InputPlugin;
use rand::rngs::StdRng;
use rand::SeedableRng;
use render::RenderPlugin;
use sim::{SimError, SimSettings, SimWorld};
use tick::TickPlugin;
use ui::UiPlugin;

fn main() -> Result<(), SimError> {
    let settings = SimSettings::default();

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let world = SimWorld::generate(&settings, &mut rng)?;

    let level = if settings.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "planets-rs — gravity sandbox".into(),
                        resolution: (settings.screen_size.x, settings.screen_size.y).into(),
                        ..default()
                    }),
                    // the tick loop owns shutdown
                    close_when_requested: false,
                    ..default()
                })
                .set(LogPlugin {
                    level,
                    ..default()
                }),
        )
        .add_plugins(TickPlugin {
            target_hz: settings.target_hz,
        })
        .insert_resource(world)
        .insert_resource(settings)
        .add_plugins((InputPlugin, RenderPlugin, UiPlugin))
        .run();

    Ok(())
}
