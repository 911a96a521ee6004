use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    pub upload_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub costs: CostsConfig,
}

fn default_database_path() -> String {
    crate::db::default_database_path()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "vistoria.db".to_string())
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_region() -> String {
    "RJ".to_string()
}

/// OpenAI-compatible provider used for vision, transcription and text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_vision_model")]
    pub text_model: String,
    /// API key given inline. Prefer `api_key_file` or `api_key_env_var`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_ai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_api_key_env_var() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_ai_timeout() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_ai_endpoint(),
            vision_model: default_vision_model(),
            transcription_model: default_transcription_model(),
            text_model: default_vision_model(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

/// Object detection service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Detections at or below this confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_detector_timeout")]
    pub timeout_secs: u64,
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_detector_timeout() -> u64 {
    30
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            min_confidence: default_min_confidence(),
            timeout_secs: default_detector_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["por".to_string()]
}

fn default_dpi() -> u32 {
    300
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: default_languages(),
            dpi: 300,
        }
    }
}

/// Pricing constants for the cost rollup and the comparator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostsConfig {
    /// Unit cost for damaged or missing items without a tariff.
    #[serde(default = "default_fallback_item_cost")]
    pub fallback_item_cost: f64,
    /// Flat cost per deteriorated item in a comparison.
    #[serde(default = "default_deterioration_unit_cost")]
    pub deterioration_unit_cost: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_fallback_item_cost() -> f64 {
    50.0
}

fn default_deterioration_unit_cost() -> f64 {
    100.0
}

fn default_currency() -> String {
    "BRL".to_string()
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            fallback_item_cost: default_fallback_item_cost(),
            deterioration_unit_cost: default_deterioration_unit_cost(),
            currency: default_currency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let costs = CostsConfig::default();
        assert_eq!(costs.fallback_item_cost, 50.0);
        assert_eq!(costs.deterioration_unit_cost, 100.0);
        assert_eq!(costs.currency, "BRL");

        let detector = DetectorConfig::default();
        assert!(!detector.enabled);
        assert_eq!(detector.min_confidence, 0.5);

        let ai = AiConfig::default();
        assert!(!ai.enabled);
        assert_eq!(ai.api_key_env_var.as_deref(), Some("OPENAI_API_KEY"));
    }

    #[test]
    fn test_inline_api_key_not_serialized() {
        let ai = AiConfig {
            api_key: Some("sk-test".to_string()),
            ..AiConfig::default()
        };
        let json = serde_json::to_string(&ai).unwrap();
        assert!(!json.contains("sk-test"));
    }
}
