use serde::{Deserialize, Serialize};

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert on the stock market. You will be told about a certain stock to talk \
about and will be an expert on that stock. Until you're told to be an expert on a new \
stock, do not answer questions about anything else except if they're related to that stock. \
Avoid putting references to sources in your answers. When you are limited to certain stocks, \
avoid talking about other stocks.";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-04-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHateSpeech,
    HarmCategoryDangerousContent,
    HarmCategorySexuallyExplicit,
    HarmCategoryHarassment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: i32,
    pub response_modalities: Vec<String>,
}

/// Fixed generation parameters shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub system_instruction: String,
    pub sampling: SamplingConfig,
    pub safety_settings: Vec<SafetySetting>,
    pub google_search: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let safety_settings = [
            HarmCategory::HarmCategoryHateSpeech,
            HarmCategory::HarmCategoryDangerousContent,
            HarmCategory::HarmCategorySexuallyExplicit,
            HarmCategory::HarmCategoryHarassment,
        ]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::Off,
        })
        .collect();

        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            sampling: SamplingConfig {
                max_output_tokens: 8192,
                temperature: 1.0,
                top_p: 0.95,
                seed: 0,
                response_modalities: vec!["TEXT".to_string()],
            },
            safety_settings,
            google_search: true,
        }
    }
}
