/// Input validation for chat commands
use blockwatch_core::ServerKey;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("You need to specify a server address")]
    NoServerAddress,
}

/// Finds the first server address in command text
///
/// Rules:
/// - Tokens are whitespace-separated
/// - A token counts if it parses as `host[:port]` and has a dot, a port, or is `localhost`
/// - Surrounding `<>` and backticks are ignored (Discord link/code formatting)
pub fn extract_server_key(text: &str) -> Result<ServerKey, ValidationError> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c| matches!(c, '<' | '>' | '`')))
        .filter(|token| looks_like_address(token))
        .find_map(|token| ServerKey::parse(token).ok())
        .ok_or(ValidationError::NoServerAddress)
}

fn looks_like_address(token: &str) -> bool {
    token.contains('.') || token.contains(':') || token.eq_ignore_ascii_case("localhost")
}
