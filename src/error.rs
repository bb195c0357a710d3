use std::path::PathBuf;

use axum::http::StatusCode;

/// Failures that reach the caller. Per-block and per-row problems never do;
/// they are skipped where they occur.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("No URL provided")]
    EmptyUrl,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Could not find matches table on page")]
    NoMatchTable,

    #[error("No matches found in table")]
    NoMatchesFound,

    #[error("Missing input files:\n{}", display_paths(.0))]
    MissingInput(Vec<PathBuf>),

    #[error("players.json not found: {}", .0.display())]
    MissingSidecar(PathBuf),
}

impl ScrapeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ScrapeError::EmptyUrl
            | ScrapeError::InvalidRequest(_)
            | ScrapeError::Fetch(_)
            | ScrapeError::NoMatchTable
            | ScrapeError::NoMatchesFound => StatusCode::BAD_REQUEST,
            ScrapeError::MissingInput(_) | ScrapeError::MissingSidecar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Process exit code when this error ends a CLI run.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScrapeError::MissingInput(_) | ScrapeError::MissingSidecar(_) => 2,
            _ => 1,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
