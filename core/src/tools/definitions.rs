//! Tool definitions for Mimic agents.
//!
//! One builder per tool; each agent assembles its registry from these.

use crate::traits::{Tool, ToolParameters};
use serde_json::json;
use std::collections::HashMap;

/// Create the `make_http_request` tool definition (exploration).
pub fn make_http_request_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "method".to_string(),
        json!({
            "type": "string",
            "enum": ["GET", "POST", "PUT", "DELETE", "PATCH"],
            "description": "HTTP method to use"
        }),
    );
    properties.insert(
        "path".to_string(),
        json!({
            "type": "string",
            "description": "API path (e.g., '/api/books' or '/health')"
        }),
    );
    properties.insert(
        "headers".to_string(),
        json!({
            "type": "object",
            "description": "Optional HTTP headers",
            "additionalProperties": {"type": "string"}
        }),
    );
    properties.insert(
        "body".to_string(),
        json!({
            "type": "object",
            "description": "Optional request body for POST/PUT requests"
        }),
    );

    Tool {
        name: "make_http_request".to_string(),
        description: "Make an HTTP request to the target API to explore endpoints. \
                      Use this to discover what endpoints exist and how they behave."
            .to_string(),
        parameters: ToolParameters {
            required: vec!["method".to_string(), "path".to_string()],
            properties,
        },
    }
}

/// Create the `record_observation` tool definition (exploration).
pub fn record_observation_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "observation".to_string(),
        json!({
            "type": "string",
            "description": "The observation or insight you want to record"
        }),
    );
    properties.insert(
        "category".to_string(),
        json!({
            "type": "string",
            "enum": ["endpoint", "data_model", "relationship", "validation",
                     "authentication", "general"],
            "description": "Category of the observation"
        }),
    );

    Tool {
        name: "record_observation".to_string(),
        description: "Record an observation or insight about the API structure, data \
                      models, or behavior. Use this to document what you learn."
            .to_string(),
        parameters: ToolParameters {
            required: vec!["observation".to_string(), "category".to_string()],
            properties,
        },
    }
}

/// Create the `complete_exploration` tool definition (exploration).
pub fn complete_exploration_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "summary".to_string(),
        json!({
            "type": "string",
            "description": "A brief summary of what you discovered about the API"
        }),
    );

    Tool {
        name: "complete_exploration".to_string(),
        description: "Signal that you have completed exploring the API and have gathered \
                      enough information. Use this when you have a thorough understanding \
                      of the API."
            .to_string(),
        parameters: ToolParameters {
            required: vec!["summary".to_string()],
            properties,
        },
    }
}

/// Create the `output_specification` tool definition (specification).
pub fn output_specification_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "specification".to_string(),
        json!({
            "type": "object",
            "description": "Complete API specification including endpoints, data models, \
                            and database schema"
        }),
    );

    Tool {
        name: "output_specification".to_string(),
        description: "Output the final API specification as JSON".to_string(),
        parameters: ToolParameters {
            required: vec!["specification".to_string()],
            properties,
        },
    }
}

/// Create the `write_file` tool definition (code generation).
pub fn write_file_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "path".to_string(),
        json!({
            "type": "string",
            "description": "Relative path within the output directory (e.g., 'src/index.ts')"
        }),
    );
    properties.insert(
        "content".to_string(),
        json!({
            "type": "string",
            "description": "File content to write"
        }),
    );

    Tool {
        name: "write_file".to_string(),
        description: "Write content to a file in the output directory. Creates parent \
                      directories as needed; writing the same path again overwrites it."
            .to_string(),
        parameters: ToolParameters {
            required: vec!["path".to_string(), "content".to_string()],
            properties,
        },
    }
}

/// Create the `create_seed_database` tool definition (code generation).
pub fn create_seed_database_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "schema_path".to_string(),
        json!({
            "type": "string",
            "description": "Path to the schema.sql file (relative to output dir)"
        }),
    );
    properties.insert(
        "output_path".to_string(),
        json!({
            "type": "string",
            "description": "Path where seed.db should be created (relative to output dir)"
        }),
    );

    Tool {
        name: "create_seed_database".to_string(),
        description: "Create the seed database by executing schema.sql against a fresh \
                      SQLite store (WAL mode, foreign keys enabled)."
            .to_string(),
        parameters: ToolParameters {
            required: vec!["schema_path".to_string(), "output_path".to_string()],
            properties,
        },
    }
}

/// Create the `run_validation` tool definition (code generation).
pub fn run_validation_tool() -> Tool {
    Tool {
        name: "run_validation".to_string(),
        description: "Run the validation pipeline against the generated project: install \
                      dependencies, build, then start the server and check its health \
                      endpoint. Returns which phase failed and why, so you can fix the \
                      generated files and re-run."
            .to_string(),
        parameters: ToolParameters {
            required: vec![],
            properties: HashMap::new(),
        },
    }
}

/// Create the `complete_generation` tool definition (code generation).
pub fn complete_generation_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "summary".to_string(),
        json!({
            "type": "string",
            "description": "Summary of what was generated"
        }),
    );

    Tool {
        name: "complete_generation".to_string(),
        description: "Signal that code generation is complete. Only call this after \
                      run_validation has reported success."
            .to_string(),
        parameters: ToolParameters {
            required: vec!["summary".to_string()],
            properties,
        },
    }
}
