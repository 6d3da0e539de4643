use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "database": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "minLength": 1 }
                },
                "additionalProperties": false
            },
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
                    "api_token": { "type": "string", "minLength": 1 }
                },
                "additionalProperties": false
            },
            "agents": {
                "type": "object",
                "properties": {
                    "enabled": {
                        "type": "array",
                        "items": { "type": "string", "enum": ["document", "design", "code-gen", "automation"] },
                        "uniqueItems": true
                    }
                }
            },
            "chains": {
                "type": "array",
                "items": { "$ref": "#/$defs/chain" }
            }
        },
        "$defs": {
            "chain": {
                "type": "object",
                "required": ["name", "steps"],
                "properties": {
                    "id": { "type": "string" },
                    "name": { "type": "string", "minLength": 1 },
                    "description": { "type": "string" },
                    "steps": { "type": "array", "items": { "$ref": "#/$defs/step" } }
                }
            },
            "step": {
                "type": "object",
                "required": ["agent_type"],
                "properties": {
                    "order": { "type": "integer", "minimum": 0 },
                    "agent_type": { "type": "string", "minLength": 1 },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "input_mapping": {
                        "type": "object",
                        "additionalProperties": { "type": "string" }
                    },
                    "parameters": { "type": "object" },
                    "continue_on_fail": { "type": "boolean" }
                }
            }
        }
    })
});

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_for(instance: Value) -> usize {
        let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA).unwrap();
        let count = match compiled.validate(&instance) {
            Ok(()) => 0,
            Err(errors) => errors.count(),
        };
        count
    }

    #[test]
    fn test_schema_compiles() {
        assert!(jsonschema::JSONSchema::compile(&CONFIG_SCHEMA).is_ok());
    }

    #[test]
    fn test_valid_config_has_no_errors() {
        let instance = json!({
            "database": { "path": "./runs.db" },
            "server": { "port": 9000 },
            "agents": { "enabled": ["document", "design"] },
            "chains": [{
                "id": "docs",
                "name": "Docs",
                "steps": [{ "agent_type": "document", "continue_on_fail": true }]
            }]
        });
        assert_eq!(errors_for(instance), 0);
    }

    #[test]
    fn test_schema_flags_bad_values() {
        assert!(errors_for(json!({ "server": { "port": 0 } })) > 0);
        assert!(errors_for(json!({ "agents": { "enabled": ["mailer"] } })) > 0);
        assert!(errors_for(json!({ "chains": [{ "name": "x" }] })) > 0);
    }
}
