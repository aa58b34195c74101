//! State carried through the cleaning graph

use crate::llm::TokenUsage;
use serde::{Deserialize, Serialize};

/// Input prompt for one batch and the model's reply to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningState {
    pub input_text: String,
    #[serde(default)]
    pub structured_response: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl CleaningState {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_defaults_to_empty() {
        let state: CleaningState = serde_json::from_str(r#"{"input_text": "rows"}"#).unwrap();
        assert_eq!(state, CleaningState::new("rows"));
        assert!(state.structured_response.is_empty());
    }
}
