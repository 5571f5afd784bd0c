//! Ordered multi-select membership

use serde::{Deserialize, Serialize};

/// Ordered set driven by button presses.
///
/// Every multi-select step (details, deep blocks 1, 3 and 4) mutates its
/// selection through [`ToggleSet::toggle`] only. Items keep the position at
/// which they were first pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToggleSet {
    items: Vec<String>,
}

impl ToggleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `option` if present, append it otherwise.
    ///
    /// Returns `true` when the option is selected after the call.
    pub fn toggle(&mut self, option: &str) -> bool {
        if let Some(pos) = self.items.iter().position(|item| item == option) {
            self.items.remove(pos);
            false
        } else {
            self.items.push(option.to_string());
            true
        }
    }

    pub fn contains(&self, option: &str) -> bool {
        self.items.iter().any(|item| item == option)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut set = ToggleSet::new();
        assert!(set.toggle("eyes"));
        assert!(set.contains("eyes"));
        assert!(!set.toggle("eyes"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_toggle_keeps_insertion_order() {
        let mut set = ToggleSet::new();
        set.toggle("b");
        set.toggle("a");
        set.toggle("c");
        set.toggle("a");
        set.toggle("a");
        assert_eq!(set.as_slice(), &["b", "c", "a"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut set = ToggleSet::new();
        set.toggle("x");
        set.toggle("y");
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["x","y"]"#);
    }

    proptest! {
        #[test]
        fn prop_present_iff_odd_presses(
            presses in prop::collection::vec(0usize..4, 0..40),
        ) {
            let options = ["a", "b", "c", "d"];
            let mut set = ToggleSet::new();
            for &i in &presses {
                set.toggle(options[i]);
            }
            for (i, option) in options.iter().enumerate() {
                let count = presses.iter().filter(|&&p| p == i).count();
                prop_assert_eq!(set.contains(option), count % 2 == 1);
            }
            prop_assert!(set.len() <= options.len());
        }
    }
}
