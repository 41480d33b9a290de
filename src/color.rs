//! Node color assignment handed to chord and Sankey renderers.

use indexmap::IndexMap;

use crate::constants::color::{
    COLOR_SEED, LIGHTNESS_MIN, LIGHTNESS_SPREAD, SATURATION_MIN, SATURATION_SPREAD,
};
use crate::hash::unit_interval;
use crate::types::ColorValue;

/// Capability mapping node identities to colors.
///
/// Implementations must return the same color for the same node for the
/// lifetime of the assignment.
pub trait ColorAssignment {
    /// Color for `node`.
    fn color_for(&mut self, node: &str) -> ColorValue;

    /// Colors for `nodes`, in order.
    fn colors_for(&mut self, nodes: &[String]) -> Vec<ColorValue> {
        nodes.iter().map(|node| self.color_for(node)).collect()
    }
}

/// Session-scoped cache of deterministic HSL colors.
#[derive(Clone, Debug)]
pub struct SessionColorAssignment {
    seed: u64,
    assigned: IndexMap<String, ColorValue>,
}

impl SessionColorAssignment {
    /// New session using the default seed.
    pub fn new() -> Self {
        Self::with_seed(COLOR_SEED)
    }

    /// New session with an explicit seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            assigned: IndexMap::new(),
        }
    }

    /// Nodes colored so far, in first-request order.
    pub fn assigned(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assigned
            .iter()
            .map(|(node, color)| (node.as_str(), color.as_str()))
    }

    fn derive(&self, node: &str) -> ColorValue {
        let hue = unit_interval(self.seed, node, 0) * 360.0;
        let saturation = SATURATION_MIN + unit_interval(self.seed, node, 1) * SATURATION_SPREAD;
        let lightness = LIGHTNESS_MIN + unit_interval(self.seed, node, 2) * LIGHTNESS_SPREAD;
        format!(
            "hsl({hue:.1}, {:.1}%, {:.1}%)",
            saturation * 100.0,
            lightness * 100.0
        )
    }
}

impl Default for SessionColorAssignment {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAssignment for SessionColorAssignment {
    fn color_for(&mut self, node: &str) -> ColorValue {
        if let Some(color) = self.assigned.get(node) {
            return color.clone();
        }
        let color = self.derive(node);
        self.assigned.insert(node.to_string(), color.clone());
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(color: &str) -> Vec<f64> {
        color
            .trim_start_matches("hsl(")
            .trim_end_matches(')')
            .split(", ")
            .map(|part| part.trim_end_matches('%').parse().unwrap())
            .collect()
    }

    #[test]
    fn colors_are_stable_across_sessions() {
        let mut first = SessionColorAssignment::new();
        let mut second = SessionColorAssignment::new();
        assert_eq!(first.color_for("Ghana"), second.color_for("Ghana"));
        assert_eq!(first.color_for("Ghana"), first.color_for("Ghana"));
        assert_eq!(first.assigned().count(), 1);
    }

    #[test]
    fn colors_stay_in_configured_ranges() {
        let mut colors = SessionColorAssignment::new();
        let nodes: Vec<String> = ["Chad", "Ghana", "Niger", "Nigeria", "Togo"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        for color in colors.colors_for(&nodes) {
            let parts = components(&color);
            assert!((0.0..=360.0).contains(&parts[0]));
            assert!((75.0..=100.0).contains(&parts[1]));
            assert!((55.0..=65.0).contains(&parts[2]));
        }
    }
}
