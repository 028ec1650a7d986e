use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, ProbeVolumeError>;

#[derive(Debug, Display, From, PartialEq, Eq)]
#[display("{self:?}")]
pub enum ProbeVolumeError {
    /// Spacing was zero, negative or non-finite; the grid would never terminate.
    InvalidSpacing,
    /// A box size component was NaN or infinite.
    InvalidBoxSize,
}

impl std::error::Error for ProbeVolumeError {}
