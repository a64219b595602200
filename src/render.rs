use bevy::math::primitives::Circle;
use bevy::math::{DVec2, IVec2};
use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};
use bevy::window::PrimaryWindow;

use crate::sim::{SimSettings, SimWorld};
use crate::tick::{LoopState, TickSet};

pub const BACKGROUND_COLOR: Color = Color::BLACK;
pub const HIGHLIGHT_COLOR: Color = Color::WHITE;

/// Which body an on-screen circle stands for.
#[derive(Component)]
pub struct BodySprite(pub usize);

/// Pixel position of a simulation point, with `origin` at the screen center.
/// Rows grow downward.
pub fn to_screen_coordinate(
    position: DVec2,
    origin: DVec2,
    scaling_factor: f64,
    screen_shape: DVec2,
) -> IVec2 {
    ((position - origin) * scaling_factor + screen_shape / 2.0)
        .floor()
        .as_ivec2()
}

/// Bevy's 2D camera sits at the window center with y pointing up.
pub fn screen_to_translation(screen: IVec2, screen_shape: Vec2, depth: f32) -> Vec3 {
    Vec3::new(
        screen.x as f32 - screen_shape.x / 2.0,
        screen_shape.y / 2.0 - screen.y as f32,
        depth,
    )
}

pub struct RenderPlugin;
impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(BACKGROUND_COLOR))
            .add_systems(Startup, (setup_camera, spawn_body_sprites))
            .add_systems(
                FixedUpdate,
                place_body_sprites
                    .in_set(TickSet::Render)
                    .run_if(in_state(LoopState::Running)),
            );
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

fn spawn_body_sprites(
    mut commands: Commands,
    world: Res<SimWorld>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (i, body) in world.bodies().iter().enumerate() {
        // the camera anchor is drawn on top, in the highlight color
        let (color, depth) = if i == 0 {
            (HIGHLIGHT_COLOR, 1.0)
        } else {
            (body.color(), 0.0)
        };

        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Circle::new(body.radius() as f32))),
                material: materials.add(ColorMaterial::from(color)),
                transform: Transform::from_xyz(0.0, 0.0, depth),
                ..default()
            },
            BodySprite(i),
        ));
    }
}

fn place_body_sprites(
    world: Res<SimWorld>,
    settings: Res<SimSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut sprites: Query<(&BodySprite, &mut Transform)>,
) {
    let Some(anchor) = world.controlled() else {
        return;
    };
    let screen_shape = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(settings.screen_size);
    let scale = world.tunables.position_scaling_factor;

    for (BodySprite(i), mut transform) in &mut sprites {
        let Some(body) = world.bodies().get(*i) else {
            continue;
        };
        let screen = to_screen_coordinate(
            body.position,
            anchor.position,
            scale,
            screen_shape.as_dvec2(),
        );
        let depth = transform.translation.z;
        transform.translation = screen_to_translation(screen, screen_shape, depth);
    }
}
