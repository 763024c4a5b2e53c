use thiserror::Error;

/// Per-point failure of a projection step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjError {
    #[error("Point out of domain: {0}")]
    OutOfDomain(String),

    #[error("Singular point: {0}")]
    SingularPoint(String),
}

/// Construction-time failure: registry lookups, parameter validation,
/// textual parameter strings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrsError {
    #[error("Unknown projection family: {0}")]
    UnknownFamily(String),

    #[error("Invalid parameter {param} for {family}: {reason}")]
    InvalidParameter {
        family: String,
        param: String,
        reason: String,
    },

    #[error("Missing required parameter {param} for {family}")]
    MissingRequiredParameter { family: String, param: String },

    #[error("Projection family already registered: {0}")]
    DuplicateFamily(String),

    #[error("Malformed parameter string: {0}")]
    MalformedProjString(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReprojectError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("CRS error: {0}")]
    Crs(#[from] CrsError),
}
