use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("chat API returned no content")]
    EmptyResponse,

    #[error("could not parse advice report: {0}")]
    Parse(String),
}
