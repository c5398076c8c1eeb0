//! Set of ingredient ids the cook has already used.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientTracker {
    used: BTreeSet<String>,
}

impl IngredientTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Flip membership of `id`. Returns whether it is now marked used.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.used.remove(id) {
            false
        } else {
            self.used.insert(id.to_string());
            true
        }
    }

    pub fn is_used(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    pub fn used_ids(&self) -> Vec<String> {
        self.used.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_set() {
        let mut tracker = IngredientTracker::from_ids(["ing-salt-1 tsp"]);
        let original = tracker.clone();

        assert!(tracker.toggle("ing-flour-200g"));
        assert!(tracker.is_used("ing-flour-200g"));
        assert!(!tracker.toggle("ing-flour-200g"));
        assert_eq!(tracker, original);

        assert!(!tracker.toggle("ing-salt-1 tsp"));
        assert!(tracker.toggle("ing-salt-1 tsp"));
        assert_eq!(tracker, original);
    }

    #[test]
    fn test_used_ids_sorted() {
        let tracker = IngredientTracker::from_ids(["b", "a", "c"]);
        assert_eq!(tracker.used_ids(), vec!["a", "b", "c"]);
        assert!(IngredientTracker::new().used_ids().is_empty());
    }
}
