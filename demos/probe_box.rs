use bevy::prelude::*;
use bevy_probe_volume::{
    ProbeVolumePlugin,
    plugin::CollisionOracle,
    points::ProbeSet,
    types::Point,
    volume::ProbeVolume,
};
use nalgebra::Vector3;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, ProbeVolumePlugin::default()))
        // Reject probes that fall within the margin of a sphere of radius 1.5
        // sitting at the world origin.
        .insert_resource(CollisionOracle::new(|world: Point, margin, _mask| {
            world.coords.norm() < 1.5 + margin
        }))
        .add_systems(Startup, setup)
        .add_systems(Update, draw_probes)
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    bevy::log::info!("Probe Box Example");

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(6.0, 5.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight::default(),
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    // The obstacle the oracle knows about.
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(1.5))),
        MeshMaterial3d(materials.add(Color::srgb(0.7, 0.3, 0.2))),
    ));

    // A 6x4x6 volume sampled every half unit; probes inside the sphere
    // (plus the margin) are dropped.
    commands.spawn(
        ProbeVolume::new(Vector3::new(6.0, 4.0, 6.0))
            .with_spacing(0.5)
            .with_margin(0.2),
    );
}

/// Draws the sampled probes and the volume bounds every frame.
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
            gizmos.sphere(world, 0.05, Color::srgb(0.3, 0.9, 1.0));
        }
    }
}
