/// A [`crate::scene::Scene`] that cannot be baked.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("grid must have at least one cell (got {width}x{height})")]
    EmptyGrid { width: u32, height: u32 },

    #[error("sample resolution must be at least 1")]
    ZeroResolution,

    #[error("max depth {depth} exceeds the limit of {limit}")]
    MaxDepth { depth: u32, limit: u32 },

    #[error("plate width must be positive and finite (got {0})")]
    PlateWidth(f64),

    #[error("material retransmission must lie in [0, 1] (got {0})")]
    Retransmission(f64),

    #[error("wavelength decay distance must be positive and finite (got {0})")]
    DecayDistance(f64),

    #[error("{name} rate is a percentage (got {rate})")]
    Rate { name: &'static str, rate: u32 },

    #[error("at least one propagation pass is required")]
    ZeroPasses,

    #[error("scene has no light sources")]
    NoLights,
}

/// Failure while writing baked lightmaps out.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no plates to export")]
    Empty,

    #[error("plate {index} has {actual} colors, expected {expected}")]
    ColorCount {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
