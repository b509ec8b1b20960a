use serde::{Deserialize, Serialize};

/// Outcome of matching XML layer records onto HTML components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// `<element>` records seen in the XML.
    pub total_elements: usize,
    /// XML layers with a thickness above zero.
    pub total_layers: usize,
    /// XML layers attached to a component.
    pub matched_layers: usize,
    pub unmatched_layers: usize,
}

impl MatchSummary {
    /// No thickness data at all: a warning state, not an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_layers == 0
    }
}
