//! Renderer Configuration
//!
//! Options that apply to every render a [`Renderer`](crate::Renderer)
//! performs. They can be built in code or loaded from JSON:
//!
//! ```
//! use graft_core::RendererConfig;
//!
//! let config = RendererConfig::from_json(r#"{ "hydrate": true }"#).unwrap();
//! assert!(config.hydrate);
//! assert!(!config.svg);
//! ```

use serde::{Deserialize, Serialize};

/// Options for a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererConfig {
    /// Adopt the children a node already has on its first render instead of
    /// appending new ones after them.
    pub hydrate: bool,

    /// Render the root in the SVG namespace.
    pub svg: bool,
}

impl RendererConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = hydrate;
        self
    }

    pub fn with_svg(mut self, svg: bool) -> Self {
        self.svg = svg;
        self
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_round_trip() {
        assert_eq!(RendererConfig::from_json("{}").unwrap(), RendererConfig::default());

        let config = RendererConfig::default().with_svg(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RendererConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(RendererConfig::from_json("{ hydrate: yes }").is_err());
    }
}
