//! The three Mimic agents: exploration, specification, and code
//! generation. Each is a thin configuration of the generic agent loop
//! with its own tool registry and prompts.

pub mod explorer;
pub mod generator;
pub mod specifier;

pub use explorer::{ExplorationAgent, ExplorationReport};
pub use generator::{GenerationAgent, GenerationReport};
pub use specifier::{SpecificationAgent, SpecificationResult};

use serde::{Deserialize, Serialize};

/// One categorized finding recorded during exploration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub category: String,
    pub observation: String,
}
