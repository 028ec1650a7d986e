use bevy::prelude::*;
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use bevy_probe_volume::{
    ProbeVolumePlugin,
    plugin::{CollisionOracle, QueuedVolume},
    points::ProbeSet,
    types::{LayerMask, Point},
    volume::ProbeVolume,
};
use nalgebra::Vector3;

const GROUND_LAYER: u32 = 0;
const PILLAR_LAYER: u32 = 1;

/// Positions of four pillars (infinite vertical cylinders of radius 0.6).
const PILLARS: [[f32; 2]; 4] = [[-3.0, -3.0], [-3.0, 3.0], [3.0, -3.0], [3.0, 3.0]];

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            ProbeVolumePlugin::default(),
            PanOrbitCameraPlugin,
        ))
        .insert_resource(CollisionOracle::new(scene_query))
        .add_systems(Startup, setup)
        .add_systems(Update, (resample_on_space, draw_probes))
        .run();
}

/// Analytic stand-in for a physics overlap test: a ground plane at y = 0 and
/// four pillars, each on its own layer.
fn scene_query(world: Point, margin: f32, mask: LayerMask) -> bool {
    if mask.intersects(LayerMask::layer(GROUND_LAYER)) && world.y < margin {
        return true;
    }

    if mask.intersects(LayerMask::layer(PILLAR_LAYER)) {
        for [px, pz] in PILLARS {
            let dx = world.x - px;
            let dz = world.z - pz;
            if (dx * dx + dz * dz).sqrt() < 0.6 + margin {
                return true;
            }
        }
    }

    false
}

fn setup(mut commands: Commands) {
    bevy::log::info!("Cave Probes Example — Space resamples, 1/2 change spacing");

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(10.0, 8.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        ProbeVolume::new(Vector3::new(10.0, 4.0, 10.0))
            .with_spacing(1.0)
            .with_margin(0.25)
            .with_mask(LayerMask::layer(GROUND_LAYER) | LayerMask::layer(PILLAR_LAYER)),
        Transform::from_xyz(0.0, 2.0, 0.0),
    ));
}

/// Space requeues every volume; 1 and 2 halve or double the spacing first.
fn resample_on_space(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut volumes: Query<(Entity, &mut ProbeVolume)>,
) {
    let halve = keyboard.just_pressed(KeyCode::Digit1);
    let double = keyboard.just_pressed(KeyCode::Digit2);
    let resample = keyboard.just_pressed(KeyCode::Space) || halve || double;

    if !resample {
        return;
    }

    for (entity, mut volume) in volumes.iter_mut() {
        if halve {
            volume.spacing /= 2.0;
        } else if double {
            volume.spacing *= 2.0;
        }
        commands.entity(entity).insert(QueuedVolume);
    }
}

fn draw_probes(mut gizmos: Gizmos, query: Query<(&ProbeVolume, &ProbeSet, &GlobalTransform)>) {
    for (volume, probes, global) in query.iter() {
        gizmos.cube(
            global.compute_transform().with_scale(Vec3::new(
                volume.size.x,
                volume.size.y,
                volume.size.z,
            )),
            Color::srgb(1.0, 1.0, 0.0),
        );

        for p in probes.iter() {
            let world = global.transform_point(Vec3::new(p.x, p.y, p.z));
            gizmos.sphere(world, 0.04, Color::srgb(0.3, 0.9, 1.0));
        }
    }
}
