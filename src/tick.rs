//! Frame-synchronous main loop.
//!
//! Each fixed tick runs: poll input, check for quit, step the physics, apply
//! the held controls, then lay out the frame. Bevy's fixed timestep paces the
//! ticks to `target_hz`.

use bevy::prelude::*;
use bevy::window::WindowCloseRequested;

use crate::input::{apply_controls, poll_controls, ActiveControls, Control};
use crate::sim::{SimSettings, SimWorld};

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoopState {
    #[default]
    Running,
    Terminated,
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TickSet {
    Input,
    Simulate,
    Render,
}

/// Run one tick against the world. Returns the state the loop should be in
/// afterwards; a held quit control ends the loop before anything moves.
pub fn advance(world: &mut SimWorld, active: &[Control], control_accel: f64) -> LoopState {
    if active.contains(&Control::Quit) {
        return LoopState::Terminated;
    }
    world.step();
    apply_controls(world, active, control_accel);
    LoopState::Running
}

pub struct TickPlugin {
    pub target_hz: f64,
}

impl Plugin for TickPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<LoopState>()
            .insert_resource(Time::<Fixed>::from_hz(self.target_hz))
            .configure_sets(
                FixedUpdate,
                (TickSet::Input, TickSet::Simulate, TickSet::Render).chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    poll_controls.in_set(TickSet::Input),
                    run_tick.in_set(TickSet::Simulate),
                )
                    .run_if(in_state(LoopState::Running)),
            )
            .add_systems(Startup, announce_population)
            .add_systems(OnEnter(LoopState::Terminated), shut_down);
    }
}

fn announce_population(world: Res<SimWorld>, settings: Res<SimSettings>) {
    info!(
        "simulating {} bodies (seed {:?}), controlling mass {:.3}",
        world.bodies().len(),
        settings.seed,
        world.controlled().map_or(0.0, |b| b.mass())
    );
}

fn run_tick(
    mut world: ResMut<SimWorld>,
    active: Res<ActiveControls>,
    settings: Res<SimSettings>,
    mut close_requests: EventReader<WindowCloseRequested>,
    mut next_state: ResMut<NextState<LoopState>>,
) {
    // catch-up ticks later in the same frame must not run after a quit
    if matches!(*next_state, NextState::Pending(LoopState::Terminated)) {
        return;
    }

    let close_requested = close_requests.read().count() > 0;
    if close_requested {
        next_state.set(LoopState::Terminated);
        return;
    }

    if advance(&mut world, &active, settings.control_accel) == LoopState::Terminated {
        next_state.set(LoopState::Terminated);
        return;
    }

    if settings.verbose {
        for (i, body) in world.bodies().iter().enumerate() {
            debug!(
                "tick {} body {}: pos {:?} vel {:?}",
                world.tick_count(),
                i,
                body.position,
                body.velocity
            );
        }
    }
}

fn shut_down(world: Res<SimWorld>, mut exit: EventWriter<AppExit>) {
    info!("quitting after {} ticks", world.tick_count());
    exit.send(AppExit::Success);
}
