use super::types::AgentrailError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub status_code: u16,
    pub exit_code: i32,
}

impl AgentrailError {
    /// Classify this error into a stable type code, HTTP status and process exit code.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Caller errors
            AgentrailError::NotFound(_) => ErrorClassification {
                error_type: "NotFound",
                status_code: 404,
                exit_code: 3,
            },
            AgentrailError::InvalidArgument(_) => ErrorClassification {
                error_type: "InvalidArgument",
                status_code: 400,
                exit_code: 4,
            },
            AgentrailError::Validation(_) => ErrorClassification {
                error_type: "ValidationError",
                status_code: 422,
                exit_code: 4,
            },
            AgentrailError::Config(_) | AgentrailError::Yaml(_) => ErrorClassification {
                error_type: "ConfigError",
                status_code: 400,
                exit_code: 2,
            },

            // Execution outcomes
            AgentrailError::StepFailure { .. } => ErrorClassification {
                error_type: "StepFailure",
                status_code: 422,
                exit_code: 5,
            },
            AgentrailError::Agent(_) | AgentrailError::AgentPartial { .. } => ErrorClassification {
                error_type: "AgentError",
                status_code: 422,
                exit_code: 5,
            },
            AgentrailError::Cancelled(_) => ErrorClassification {
                error_type: "Cancelled",
                status_code: 409,
                exit_code: 6,
            },

            // Storage
            AgentrailError::Tracking(_) => ErrorClassification {
                error_type: "TrackingError",
                status_code: 503,
                exit_code: 7,
            },
            AgentrailError::Persistence(_) => ErrorClassification {
                error_type: "PersistenceError",
                status_code: 503,
                exit_code: 7,
            },
            AgentrailError::Serialization { .. } | AgentrailError::Json(_) => ErrorClassification {
                error_type: "SerializationError",
                status_code: 500,
                exit_code: 1,
            },

            AgentrailError::Io(_) => ErrorClassification {
                error_type: "IoError",
                status_code: 500,
                exit_code: 1,
            },
            AgentrailError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                status_code: 500,
                exit_code: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let class = AgentrailError::NotFound("agent type 'x'".into()).classify();
        assert_eq!(class.error_type, "NotFound");
        assert_eq!(class.status_code, 404);
    }

    #[test]
    fn test_invalid_argument_is_client_error() {
        let class = AgentrailError::InvalidArgument("empty type tag".into()).classify();
        assert_eq!(class.status_code, 400);
        assert_eq!(class.exit_code, 4);
    }

    #[test]
    fn test_persistence_is_unavailable() {
        let class = AgentrailError::Persistence("disk full".into()).classify();
        assert_eq!(class.error_type, "PersistenceError");
        assert_eq!(class.status_code, 503);
    }

    #[test]
    fn test_serialization_names_field() {
        let err = AgentrailError::serialization("output", "key must be a string");
        assert!(err.to_string().contains("'output'"));
        assert_eq!(err.classify().error_type, "SerializationError");
    }

    #[test]
    fn test_config_exit_code() {
        let class = AgentrailError::Config("bad".into()).classify();
        assert_eq!(class.exit_code, 2);
    }

    #[test]
    fn test_cancelled_is_conflict() {
        assert_eq!(AgentrailError::Cancelled("stop".into()).classify().status_code, 409);
    }
}
