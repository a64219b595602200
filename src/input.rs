use bevy::prelude::*;

use crate::sim::SimWorld;

/// Every named control the player can hold down.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Control {
    Freeze,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Heat,
    Cool,
    ZoomIn,
    ZoomOut,
    SlowTime,
    SpeedTime,
    Quit,
}

impl Control {
    /// Evaluation order within a tick. Freeze comes before movement so a held
    /// arrow key still pushes the controlled body off a frozen start.
    pub const ALL: [Control; 12] = [
        Control::Freeze,
        Control::MoveUp,
        Control::MoveDown,
        Control::MoveLeft,
        Control::MoveRight,
        Control::Heat,
        Control::Cool,
        Control::ZoomIn,
        Control::ZoomOut,
        Control::SlowTime,
        Control::SpeedTime,
        Control::Quit,
    ];

    /// Apply this control's per-tick effect. `Quit` is handled by the tick
    /// loop and does nothing here.
    pub fn apply(self, world: &mut SimWorld, control_accel: f64) {
        let time_scale = world.tunables.time_scale;
        let kick = control_accel * time_scale;

        match self {
            Control::Freeze => world.freeze(),
            // screen rows grow downward, so "up" is -y
            Control::MoveUp => nudge(world, 0.0, -kick),
            Control::MoveDown => nudge(world, 0.0, kick),
            Control::MoveLeft => nudge(world, -kick, 0.0),
            Control::MoveRight => nudge(world, kick, 0.0),
            Control::Heat => {
                let friction = &mut world.tunables.friction_fraction;
                if *friction > 0.0 {
                    debug!("friction flipped negative, heating up");
                }
                *friction = -friction.abs();
            }
            Control::Cool => {
                let friction = &mut world.tunables.friction_fraction;
                if *friction < 0.0 {
                    debug!("friction flipped positive, cooling down");
                }
                *friction = friction.abs();
            }
            Control::ZoomIn => world.tunables.position_scaling_factor *= 1.0 + 2.0 * time_scale,
            Control::ZoomOut => world.tunables.position_scaling_factor *= 1.0 - 2.0 * time_scale,
            Control::SlowTime => world.tunables.time_scale *= 0.99,
            Control::SpeedTime => world.tunables.time_scale *= 1.01,
            Control::Quit => {}
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Control::Freeze => "Freeze velocities",
            Control::MoveUp => "Push up",
            Control::MoveDown => "Push down",
            Control::MoveLeft => "Push left",
            Control::MoveRight => "Push right",
            Control::Heat => "Negative friction (heat)",
            Control::Cool => "Positive friction (cool)",
            Control::ZoomIn => "Zoom in",
            Control::ZoomOut => "Zoom out",
            Control::SlowTime => "Slow down time",
            Control::SpeedTime => "Speed up time",
            Control::Quit => "Quit",
        }
    }
}

fn nudge(world: &mut SimWorld, dx: f64, dy: f64) {
    if let Some(body) = world.controlled_mut() {
        body.velocity.x += dx;
        body.velocity.y += dy;
    }
}

/// Apply every active control once, in [`Control::ALL`] order.
pub fn apply_controls(world: &mut SimWorld, active: &[Control], control_accel: f64) {
    for control in Control::ALL {
        if active.contains(&control) {
            control.apply(world, control_accel);
        }
    }
}

#[derive(Resource)]
pub struct Keybinds {
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub freeze: KeyCode,
    pub heat: KeyCode,
    pub cool: KeyCode,
    pub zoom_in: KeyCode,
    pub zoom_out: KeyCode,
    pub slow_time: KeyCode,
    pub speed_time: KeyCode,
    pub quit: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            up: KeyCode::ArrowUp,
            down: KeyCode::ArrowDown,
            left: KeyCode::ArrowLeft,
            right: KeyCode::ArrowRight,
            freeze: KeyCode::Space,
            heat: KeyCode::KeyR,
            cool: KeyCode::KeyF,
            zoom_in: KeyCode::KeyA,
            zoom_out: KeyCode::KeyZ,
            slow_time: KeyCode::KeyT,
            speed_time: KeyCode::KeyS,
            quit: KeyCode::Escape,
        }
    }
}

impl Keybinds {
    pub fn key(&self, control: Control) -> KeyCode {
        match control {
            Control::Freeze => self.freeze,
            Control::MoveUp => self.up,
            Control::MoveDown => self.down,
            Control::MoveLeft => self.left,
            Control::MoveRight => self.right,
            Control::Heat => self.heat,
            Control::Cool => self.cool,
            Control::ZoomIn => self.zoom_in,
            Control::ZoomOut => self.zoom_out,
            Control::SlowTime => self.slow_time,
            Control::SpeedTime => self.speed_time,
            Control::Quit => self.quit,
        }
    }

    /// Controls whose key is currently held.
    pub fn active(&self, keys: &ButtonInput<KeyCode>) -> Vec<Control> {
        Control::ALL
            .into_iter()
            .filter(|c| keys.pressed(self.key(*c)))
            .collect()
    }
}

/// Controls held down this tick, polled once at the start of the tick.
#[derive(Resource, Default, Debug, Deref, DerefMut)]
pub struct ActiveControls(pub Vec<Control>);

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>()
            .init_resource::<ActiveControls>();
    }
}

pub fn poll_controls(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut active: ResMut<ActiveControls>,
) {
    active.0 = keybinds.active(&keys);
}
