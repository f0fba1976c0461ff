use thiserror::Error;

/// Failure kinds surfaced by the route pipeline.
///
/// Every locator, planner and normalizer returns these so the enhancer can
/// propagate a single typed error to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A coordinate or parameter is not a finite number.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The journey-planning response is missing fields the pipeline needs.
    #[error("malformed upstream response: {0}")]
    MalformedUpstream(String),

    /// The journey-planning service returned no journeys.
    #[error("upstream returned no journeys")]
    UpstreamEmpty,

    /// Transport or availability failure of the spot store or an external service.
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read place kinds file {path}: {source}")]
    PlaceKindsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse place kinds file: {0}")]
    PlaceKindsParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
