use crate::errors::AgentrailError;

const DANGEROUS_PATTERNS: &[&str] = &[
    "../",
    "..\\",
    "<script",
    "javascript:",
    "vbscript:",
    "data:",
    "file:",
];

/// Reject config documents whose string values carry traversal or script patterns.
pub fn validate_security_patterns(value: &serde_yaml::Value) -> Result<(), AgentrailError> {
    check_value(value, &[])
}

fn check_value(value: &serde_yaml::Value, path: &[String]) -> Result<(), AgentrailError> {
    match value {
        serde_yaml::Value::String(s) => {
            let lower = s.to_lowercase();
            if let Some(pattern) = DANGEROUS_PATTERNS.iter().find(|p| lower.contains(*p)) {
                let path_str = if path.is_empty() { "root".to_string() } else { path.join(".") };
                return Err(AgentrailError::Config(format!(
                    "Dangerous pattern '{}' found at config path: {}",
                    pattern, path_str
                )));
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let mut child = path.to_vec();
                child.push(k.as_str().unwrap_or("unknown").to_string());
                check_value(v, &child)?;
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let mut child = path.to_vec();
                child.push(format!("[{}]", i));
                check_value(v, &child)?;
            }
            Ok(())
        }
        serde_yaml::Value::Tagged(tagged) => check_value(&tagged.value, path),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(yaml: &str) -> Result<(), AgentrailError> {
        validate_security_patterns(&serde_yaml::from_str::<serde_yaml::Value>(yaml).unwrap())
    }

    #[test]
    fn test_safe_config_passes() {
        assert!(scan("database:\n  path: ./data/agentrail.db\nserver:\n  port: 8080").is_ok());
    }

    #[test]
    fn test_directory_traversal_blocked() {
        assert!(scan("database:\n  path: ../../etc/passwd").is_err());
    }

    #[test]
    fn test_script_injection_blocked() {
        assert!(scan("value: '<script>alert(1)</script>'").is_err());
        assert!(scan("url: 'javascript:void(0)'").is_err());
    }

    #[test]
    fn test_nested_chain_parameter_blocked() {
        let err = scan("chains:\n  - name: x\n    steps:\n      - agent_type: document\n        parameters:\n          source: 'file:///etc/shadow'")
            .unwrap_err();
        assert!(err.to_string().contains("chains.[0].steps.[0].parameters.source"));
    }

    #[test]
    fn test_non_string_values_pass() {
        assert!(scan("port: 8080\nenabled: true\nratio: 0.5").is_ok());
    }
}
