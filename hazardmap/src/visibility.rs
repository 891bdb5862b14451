//! Showing and hiding layers by their logical names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::map::LayerCollection;

/// Names of the toggles the viewer has by default.
pub const DEFAULT_TOGGLES: [&str; 3] = ["roads", "flood", "fire"];

/// Named on/off switches of the UI. A toggle applies to every layer with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityToggles(BTreeMap<String, bool>);

impl Default for VisibilityToggles {
    /// `roads`, `flood` and `fire` toggles, all enabled.
    fn default() -> Self {
        Self(
            DEFAULT_TOGGLES
                .iter()
                .map(|name| (name.to_string(), true))
                .collect(),
        )
    }
}

impl VisibilityToggles {
    /// Toggles without any entries.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets the toggle, adding it if it does not exist.
    pub fn set(&mut self, name: impl Into<String>, enabled: bool) {
        self.0.insert(name.into(), enabled);
    }

    /// State of the toggle, `None` if there is no toggle with this name.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    /// Iterates over toggles and their states.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.0.iter().map(|(name, enabled)| (name.as_str(), *enabled))
    }
}

/// Applies [`VisibilityToggles`] to the layers of a map.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisibilityController;

impl VisibilityController {
    /// Sets visibility of every layer that has a toggle with its name. Layers without a toggle
    /// are left as they are. Returns the number of affected layers.
    pub fn apply(toggles: &VisibilityToggles, layers: &mut LayerCollection) -> usize {
        let count = layers.update_visibility(|layer| toggles.get(layer.name()));
        log::debug!("Visibility toggles applied to {count} layers");
        count
    }
}
