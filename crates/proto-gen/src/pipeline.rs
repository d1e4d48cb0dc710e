//! End-to-end inference: raw bytes in, protocol definition out

use proto_analyze::{AnalyzerConfig, PatternAnalyzer};
use proto_detect::{DetectorConfig, ProtocolDetector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GenError;
use crate::generator::{GeneratedDefinition, GeneratorConfig, ProtocolDefinitionGenerator};

/// Configuration of every pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub analyzer: AnalyzerConfig,
    pub generator: GeneratorConfig,
}

/// Run detection, analysis and generation over a captured log
///
/// Only an unusable analyzer configuration is an error; uncertain input
/// yields a low-confidence definition and validation messages instead.
pub fn infer_definition(
    data: &[u8],
    config: &PipelineConfig,
) -> Result<GeneratedDefinition, GenError> {
    let detection = ProtocolDetector::with_config(config.detector.clone()).detect(data);
    let analysis = PatternAnalyzer::with_config(config.analyzer.clone()).analyze(data, &detection)?;
    info!(
        "{} messages, strategy: {}",
        analysis.message_count, analysis.suggested_strategy
    );
    Ok(ProtocolDefinitionGenerator::with_config(config.generator.clone()).generate(&analysis))
}
