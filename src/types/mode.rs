//! Protocol mode of a connection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which higher-level protocol the link is believed to speak.
///
/// Starts as `Unclassified` and moves to `Text` or `Framed` exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum LinkMode {
    #[default]
    Unclassified,
    Text,
    Framed,
}

impl LinkMode {
    pub fn is_classified(self) -> bool {
        self != LinkMode::Unclassified
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkMode::Unclassified => "unclassified",
            LinkMode::Text => "text",
            LinkMode::Framed => "framed",
        };
        f.write_str(name)
    }
}
