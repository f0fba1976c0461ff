use sencity_core::RouteError;
use thiserror::Error;

/// Errors returned by the Navitia API client.
#[derive(Debug, Error)]
pub enum NavitiaError {
    /// Network or TLS failure, or a non-2xx status without a Navitia error body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Navitia answered with an `{"error": {"id", "message"}}` body.
    #[error("Navitia API error ({id}): {message}")]
    Api { id: String, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request parameter was rejected before sending.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl NavitiaError {
    /// Navitia error ids that mean "no journey exists" rather than a failure.
    pub(crate) fn is_no_solution(&self) -> bool {
        matches!(
            self,
            NavitiaError::Api { id, .. }
                if id == "no_solution" || id == "no_origin_nor_destination"
                    || id == "no_origin" || id == "no_destination"
        )
    }
}

impl From<NavitiaError> for RouteError {
    fn from(err: NavitiaError) -> Self {
        match err {
            NavitiaError::Deserialize { .. } => RouteError::MalformedUpstream(err.to_string()),
            NavitiaError::InvalidRequest(msg) => RouteError::InvalidInput(msg),
            NavitiaError::Http(_) | NavitiaError::Api { .. } => {
                RouteError::Upstream(err.to_string())
            }
        }
    }
}
