//! Decoded stream events and the assembled generation result

/// One decoded unit of an incremental response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    /// Text carried by the record, if any
    pub text_fragment: Option<String>,
    /// Whether this record is the completion marker
    pub done: bool,
}

impl StreamEvent {
    /// Create an event carrying a fragment
    pub fn fragment(text: impl Into<String>, done: bool) -> Self {
        Self {
            text_fragment: Some(text.into()),
            done,
        }
    }
}

/// Outcome of one streaming generation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    /// Concatenation of every fragment in arrival order
    pub full_text: String,
    /// The completion marker was received
    pub completed: bool,
    /// The cycle was stopped by the caller's cancellation signal
    pub cancelled: bool,
    /// Transport or server error that ended the cycle early
    pub error: Option<String>,
}
