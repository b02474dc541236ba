//! Coaching advice for analysed videos and accounts.
//!
//! Two sources: an OpenAI-compatible chat model that returns a structured
//! JSON report, and deterministic heuristics used for the free tier or
//! whenever the model is unavailable.

pub mod client;
pub mod error;
pub mod generator;
pub mod heuristic;
pub mod report;

mod prompts;

pub use client::{ChatClient, ChatMessage};
pub use error::AdviceError;
pub use generator::{AccountContext, AdviceGenerator, VideoContext};
pub use heuristic::{heuristic_account_advice, heuristic_video_advice, AccountSignals};
pub use report::{parse_report, AdviceItem, AdviceReport};
