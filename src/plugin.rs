use std::sync::Arc;

use bevy::{
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};

use crate::{
    error::Result,
    points::ProbeSet,
    sampler::sample_grid,
    types::{CollisionQuery, LayerMask, Point, Value},
    volume::ProbeVolume,
};

/// System sets for the probe placement pipeline.
///
/// Use these to order your own systems relative to probe generation:
///
/// ```rust,ignore
/// // Run after probes are computed but before they land in the ProbeSet —
/// // ideal for custom filtering or light-probe baking hooks:
/// app.add_systems(Update, inspect_batch.after(ProbeVolumeSet::Generate)
///                                      .before(ProbeVolumeSet::Apply));
/// ```
///
/// ```text
/// ProbeVolumeSet::Spawn  →  [async compute]  →  ProbeVolumeSet::Generate  →  [your systems]  →  ProbeVolumeSet::Apply
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProbeVolumeSet {
    /// Spawns an async compute task for each queued volume.
    Spawn,
    /// Polls async tasks and inserts [`SampledPoints`] on completion.
    Generate,
    /// Commits [`SampledPoints`] into the entity's [`ProbeSet`] and removes [`SampledPoints`].
    Apply,
}

/// Marker component added to [`ProbeVolume`] entities that are waiting to be
/// (re)sampled.
///
/// Removed automatically once the volume's probes have been generated and
/// applied. Re-insert it to resample a volume after editing its parameters:
///
/// ```rust,ignore
/// fn regenerate(mut commands: Commands, volumes: Query<Entity, With<ProbeVolume>>) {
///     for entity in volumes.iter() {
///         commands.entity(entity).insert(QueuedVolume);
///     }
/// }
/// ```
#[derive(Component)]
pub struct QueuedVolume;

/// Holds the in-flight async compute task for a [`ProbeVolume`].
///
/// Inserted by [`ProbeVolumeSet::Spawn`], removed once the task completes and
/// [`SampledPoints`] has been inserted by [`ProbeVolumeSet::Generate`].
#[derive(Component)]
pub struct ComputeTask(Task<Result<Vec<Point>>>);

/// Intermediate result component carrying one finished sampling pass.
///
/// Lives on the entity between [`ProbeVolumeSet::Generate`] and
/// [`ProbeVolumeSet::Apply`]; systems scheduled in between may inspect or
/// rewrite the batch before it is committed.
#[derive(Component)]
pub struct SampledPoints(pub Result<Vec<Point>>);

/// The collision oracle used for geometry avoidance, wrapped as a resource.
///
/// The inner query answers whether any geometry selected by the mask lies
/// within the margin of a world-space point. Back it with whatever spatial
/// query your scene has — a physics engine's overlap test, a BVH, or a plain
/// closure in tests:
///
/// ```rust,ignore
/// // Reject probes within `margin` of the ground plane:
/// app.insert_resource(CollisionOracle::new(|world, margin, _mask| {
///     world.y.abs() < margin
/// }));
/// ```
///
/// Without this resource, volumes sample as if avoidance were disabled.
#[derive(Resource, Clone)]
pub struct CollisionOracle(Arc<CollisionQuery>);

impl CollisionOracle {
    /// Wraps a query function. It must be safe for concurrent read access;
    /// sampling calls it from worker threads.
    pub fn new<F>(query: F) -> Self
    where
        F: Fn(Point, Value, LayerMask) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(query))
    }

    /// Runs a single query.
    pub fn query(&self, world: Point, margin: Value, mask: LayerMask) -> bool {
        (self.0)(world, margin, mask)
    }
}

/// Runtime configuration for the probe placement pipeline.
///
/// Inserted as a resource by [`ProbeVolumePlugin`]. Modify it at any time to
/// change behaviour:
///
/// ```rust,ignore
/// app.add_plugins(ProbeVolumePlugin { max_tasks_per_frame: 8, ..default() });
///
/// // Or change it at runtime:
/// fn my_system(mut config: ResMut<ProbeVolumeConfig>) {
///     config.max_tasks_per_frame = 1; // throttle during gameplay
/// }
/// ```
#[derive(Resource)]
pub struct ProbeVolumeConfig {
    /// Maximum number of async sampling tasks spawned per frame.
    ///
    /// Fine spacings over large boxes make for expensive tasks; lower values
    /// spread the load over more frames. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for ProbeVolumeConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that drives probe placement for [`ProbeVolume`] entities.
///
/// When the `auto_queue` feature is enabled, any [`ProbeVolume`] added to the
/// world is automatically sampled. Sampling runs on Bevy's
/// `AsyncComputeTaskPool` so the main thread is never blocked:
///
/// ```text
/// ProbeVolume added
///   → QueuedVolume inserted         (on_volume_add)
///   → ComputeTask spawned           (ProbeVolumeSet::Spawn)
///   → [async compute runs]
///   → SampledPoints inserted        (ProbeVolumeSet::Generate, once task completes)
///   → [your systems here]
///   → ProbeSet committed            (ProbeVolumeSet::Apply)
///   → QueuedVolume + SampledPoints removed
/// ```
pub struct ProbeVolumePlugin {
    /// Initial value for [`ProbeVolumeConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for ProbeVolumePlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: ProbeVolumeConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for ProbeVolumePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ProbeVolumeConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        });

        app.configure_sets(
            Update,
            (
                ProbeVolumeSet::Spawn,
                ProbeVolumeSet::Generate,
                ProbeVolumeSet::Apply,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                spawn_sample_tasks.in_set(ProbeVolumeSet::Spawn),
                poll_sample_tasks.in_set(ProbeVolumeSet::Generate),
                apply_sampled_points.in_set(ProbeVolumeSet::Apply),
            ),
        );

        #[cfg(feature = "auto_queue")]
        app.add_systems(Update, on_volume_add.before(ProbeVolumeSet::Spawn));
    }
}

/// Inserts [`QueuedVolume`] on every newly added [`ProbeVolume`] that doesn't already have it.
#[cfg(feature = "auto_queue")]
fn on_volume_add(
    mut commands: Commands,
    query: Query<Entity, (Added<ProbeVolume>, Without<QueuedVolume>)>,
) {
    for entity in query.iter() {
        commands.entity(entity).insert(QueuedVolume);
    }
}

/// Spawns async sampling tasks for [`QueuedVolume`]s, up to
/// [`ProbeVolumeConfig::max_tasks_per_frame`] per frame.
///
/// Each task captures the volume's parameters, the entity's world transform
/// and an `Arc` handle to the oracle, so edits made while the task is in
/// flight only affect the next run.
fn spawn_sample_tasks(
    mut commands: Commands,
    config: Res<ProbeVolumeConfig>,
    oracle: Option<Res<CollisionOracle>>,
    query: Query<
        (Entity, &ProbeVolume, &GlobalTransform),
        (With<QueuedVolume>, Without<ComputeTask>, Without<SampledPoints>),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, volume, global) in query.iter().take(config.max_tasks_per_frame) {
        let size = volume.size;
        let spacing = volume.spacing;
        let margin = volume.margin;
        let mask = volume.mask;

        // Arc::clone is a single pointer bump — no oracle state is copied.
        let oracle: Option<Arc<CollisionQuery>> = if volume.avoid_geometry {
            if oracle.is_none() {
                warn!("ProbeVolume wants geometry avoidance but no CollisionOracle resource exists; sampling everything");
            }
            oracle.as_ref().map(|o| Arc::clone(&o.0))
        } else {
            None
        };

        // GlobalTransform is Copy; the task gets a snapshot of this frame's pose.
        let global = *global;

        let task = task_pool.spawn(async move {
            let transform = |p: Point| {
                let world = global.transform_point(Vec3::new(p.x, p.y, p.z));
                Point::new(world.x, world.y, world.z)
            };
            sample_grid(size, spacing, transform, oracle.as_deref(), margin, mask)
        });

        commands.entity(entity).insert(ComputeTask(task));
    }
}

/// Polls in-flight [`ComputeTask`]s each frame and inserts [`SampledPoints`] on completion.
///
/// Non-blocking: tasks that haven't finished are skipped and retried next frame.
fn poll_sample_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        if let Some(result) = block_on(future::poll_once(&mut compute_task.0)) {
            commands
                .entity(entity)
                .insert(SampledPoints(result))
                .remove::<ComputeTask>();
        }
    }
}

/// Commits a finished [`SampledPoints`] batch into the entity's [`ProbeSet`],
/// then removes [`SampledPoints`] and [`QueuedVolume`].
///
/// A failed pass (invalid spacing or box size) is logged and leaves the
/// previous [`ProbeSet`] untouched — there are no partial results.
fn apply_sampled_points(
    mut commands: Commands,
    mut query: Query<(Entity, &SampledPoints, Option<&mut ProbeSet>), With<QueuedVolume>>,
) {
    for (entity, sampled, existing) in query.iter_mut() {
        match &sampled.0 {
            Ok(points) => {
                info!("Placed {} probes", points.len());
                match existing {
                    Some(mut set) => set.replace(points.clone()),
                    None => {
                        commands
                            .entity(entity)
                            .insert(ProbeSet::from_points(points.clone()));
                    }
                }
            }
            Err(err) => {
                warn!("Probe sampling failed: {}", err);
            }
        }

        commands
            .entity(entity)
            .remove::<SampledPoints>()
            .remove::<QueuedVolume>();
    }
}
