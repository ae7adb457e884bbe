use thiserror::Error;

/// Top-level error type for stride.
#[derive(Debug, Error)]
pub enum StrideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Bounds violation: {0}")]
    Bounds(#[from] BoundsError),

    #[error("Out of range: {0}")]
    Range(#[from] RangeError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

/// Result alias used across the stride crates.
pub type Result<T, E = StrideError> = std::result::Result<T, E>;

/// Configuration errors. Always fatal and raised before any variable exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported base representation: {0}")]
    UnsupportedBaseRepresentation(String),

    #[error("Unsupported solver: {0}")]
    UnsupportedSolver(String),

    #[error("Unsupported constraint: {0}")]
    UnsupportedConstraint(String),

    #[error("Unsupported cost: {0}")]
    UnsupportedCost(String),

    #[error("Missing contact timing for end-effector {0}")]
    MissingContactTiming(usize),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Disagreement between parts of the problem that must match exactly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("Total duration mismatch for {id}: expected {expected}, got {got}")]
    TotalDurationMismatch { id: String, expected: f64, got: f64 },

    #[error("Decision vector length mismatch: expected {expected}, got {got}")]
    VectorLength { expected: usize, got: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Phase count mismatch for {id}: expected {expected}, got {got}")]
    PhaseCountMismatch { id: String, expected: usize, got: usize },

    #[error("Duplicate component identifier: {0}")]
    DuplicateId(String),
}

/// A configured or initial value lies outside its bound.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("Phase {index} duration {value} outside [{min}, {max}]")]
    PhaseDuration {
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Force {value} on {id} exceeds limit {limit}")]
    ForceLimit { id: String, value: f64, limit: f64 },

    #[error("Initial value {value} of {id}[{index}] outside [{lower}, {upper}]")]
    InitialGuess {
        id: String,
        index: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("Cannot pin fixed value of {id} at node {node} to {value}")]
    FixedValue { id: String, node: usize, value: f64 },

    #[error("Invalid bound range: lower {lower} > upper {upper}")]
    InvalidRange { lower: f64, upper: f64 },
}

/// Queries outside the valid domain.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RangeError {
    #[error("Time {t} outside horizon [0, {total}]")]
    TimeOutOfRange { t: f64, total: f64 },

    #[error("Iterate {index} out of range: {count} recorded")]
    IterateOutOfRange { index: usize, count: usize },
}

/// Registry lookups by identifier and expected kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("Component not found: {0}")]
    NotFound(String),

    #[error("Component {id} has kind {found}, expected {expected}")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Failures reported by a solver backend, propagated unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("{backend} failed: {message}")]
    Failed { backend: String, message: String },

    #[error("{backend} reported an infeasible problem")]
    Infeasible { backend: String },

    #[error("{backend} hit the iteration limit ({iterations})")]
    IterationLimit { backend: String, iterations: usize },
}
