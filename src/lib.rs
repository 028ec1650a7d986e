pub mod error;
pub mod plugin;
pub mod points;
pub mod sampler;
pub mod types;
pub mod volume;

pub use plugin::ProbeVolumePlugin;
