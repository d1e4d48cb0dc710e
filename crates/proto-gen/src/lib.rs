//! Protocol definition generation (Pass 4)
//!
//! Turns an [`AnalysisResult`](proto_model::AnalysisResult) into the exported
//! [`ProtocolDefinition`](proto_model::ProtocolDefinition), validates it,
//! and derives supplementary validation rules. [`infer_definition`] runs
//! every pass over a raw byte buffer.
//!
//! # Example
//!
//! ```rust
//! use proto_gen::{infer_definition, PipelineConfig};
//!
//! let log = "   0.360 kg    G\r\n".repeat(10);
//! let generated = infer_definition(log.as_bytes(), &PipelineConfig::default()).unwrap();
//!
//! assert!(generated.is_valid());
//! println!("{}", generated.to_json().unwrap());
//! ```

pub mod error;
pub mod generator;
pub mod markers;
pub mod pipeline;
pub mod rules;
pub mod validate;

pub use error::GenError;
pub use generator::{GeneratedDefinition, GeneratorConfig, ProtocolDefinitionGenerator};
pub use pipeline::{infer_definition, PipelineConfig};
pub use rules::generate_rules;
pub use validate::{validate, IdentifierPolicy};
