//! LLM-backed advice generation.

use tikpulse_core::AppConfig;
use tikpulse_extract::{
    AccountMetrics, ExtractionResult, Niche, PerformanceLevel, ProfileSnapshot, RateSet,
};

use crate::client::{ChatClient, ChatMessage};
use crate::error::AdviceError;
use crate::prompts::{account_prompt, video_prompt, SYSTEM_PROMPT};
use crate::report::{parse_report, AdviceReport};

const TEMPERATURE: f32 = 0.3;
const CHAT_TIMEOUT_SECS: u64 = 60;

/// Prompt inputs for one analysed video.
#[derive(Debug, Clone, Copy)]
pub struct VideoContext<'a> {
    pub username: &'a str,
    pub result: &'a ExtractionResult,
    pub rates: &'a RateSet,
    pub niche: Niche,
    pub performance: PerformanceLevel,
}

/// Prompt inputs for one analysed account.
#[derive(Debug, Clone, Copy)]
pub struct AccountContext<'a> {
    /// Requested handle; used when the page did not expose one.
    pub username: &'a str,
    pub snapshot: &'a ProfileSnapshot,
    pub metrics: &'a AccountMetrics,
    pub niche: Niche,
}

#[derive(Debug, Clone)]
pub struct AdviceGenerator {
    chat: ChatClient,
}

impl AdviceGenerator {
    #[must_use]
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    /// `Ok(None)` when AI advice is disabled or no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AdviceError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, AdviceError> {
        if !config.ai_available() {
            return Ok(None);
        }
        let Some(api_key) = config.openai_api_key.as_deref() else {
            return Ok(None);
        };
        let chat = ChatClient::new(
            api_key,
            config.ai_base_url.as_str(),
            config.ai_model.as_str(),
            CHAT_TIMEOUT_SECS,
        )?;
        Ok(Some(Self::new(chat)))
    }

    /// # Errors
    ///
    /// Propagates chat failures and [`AdviceError::Parse`] for replies that
    /// are not a JSON report.
    pub async fn video_advice(&self, ctx: &VideoContext<'_>) -> Result<AdviceReport, AdviceError> {
        self.ask(video_prompt(ctx)).await
    }

    /// # Errors
    ///
    /// Same as [`AdviceGenerator::video_advice`].
    pub async fn account_advice(
        &self,
        ctx: &AccountContext<'_>,
    ) -> Result<AdviceReport, AdviceError> {
        self.ask(account_prompt(ctx)).await
    }

    async fn ask(&self, prompt: String) -> Result<AdviceReport, AdviceError> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let content = self.chat.complete_json(&messages, TEMPERATURE).await?;
        let report = parse_report(&content)?;
        tracing::debug!(
            model = self.chat.model(),
            advice_items = report.advice.len(),
            "advice report parsed"
        );
        Ok(report)
    }
}
