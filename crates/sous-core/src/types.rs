use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Recipe
// =============================================================================

/// A recipe as handed to the session engine.
///
/// Immutable once a session starts: step order is fixed for the lifetime
/// of the session, and steps are addressed by zero-based index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub total_time_minutes: u32,
    #[serde(default)]
    pub servings: u32,
    pub steps: Vec<RecipeStep>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    /// Number of steps in the recipe.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Index of the last step, or `None` for a recipe without steps.
    pub fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    pub fn step(&self, index: usize) -> Option<&RecipeStep> {
        self.steps.get(index)
    }

    /// Resolve a step id back to its position.
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    /// Ingredients referenced by the step at `index`.
    pub fn ingredients_for_step(&self, index: usize) -> Vec<&Ingredient> {
        let Some(step) = self.step(index) else {
            return Vec::new();
        };
        step.ingredient_ids
            .iter()
            .filter_map(|id| self.ingredients.iter().find(|i| &i.id == id))
            .collect()
    }
}

/// One instruction unit of a recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    /// Stable id derived from the step's position (`step-0`, `step-1`, ...).
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub estimated_minutes: u32,
    /// References into the recipe's ingredient set.
    #[serde(default)]
    pub ingredient_ids: Vec<String>,
}

impl RecipeStep {
    /// Build a step whose id is derived from its position.
    pub fn new(index: usize, text: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            id: step_id(index),
            text: text.into(),
            estimated_minutes,
            ingredient_ids: Vec::new(),
        }
    }

    pub fn with_ingredients(mut self, ingredient_ids: Vec<String>) -> Self {
        self.ingredient_ids = ingredient_ids;
        self
    }
}

/// Position-derived step id.
pub fn step_id(index: usize) -> String {
    format!("step-{}", index)
}

/// A recipe ingredient with a derived, reproducible id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub quantity: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        let name = name.into();
        let quantity = quantity.into();
        Self {
            id: ingredient_id(&name, &quantity),
            name,
            quantity,
        }
    }
}

/// Derive an ingredient id from its name and quantity string.
///
/// `ing-<normalized name>-<quantity>`, where the name is lower-cased and
/// whitespace runs collapse to single hyphens. The same logical ingredient
/// maps to the same id even when reconstructed from persisted data.
pub fn ingredient_id(name: &str, quantity: &str) -> String {
    format!("ing-{}-{}", normalize_name(name), quantity)
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

// =============================================================================
// Timers
// =============================================================================

/// Opaque, generator-assigned timer identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub Uuid);

impl TimerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A countdown bound to a step.
///
/// Invariants: `remaining_seconds <= total_seconds`, and `is_complete`
/// implies `!is_running && remaining_seconds == 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub id: TimerId,
    /// Back-reference to the owning step. Not ownership.
    pub step_id: String,
    pub label: String,
    pub total_seconds: u32,
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub is_complete: bool,
}

impl TimerState {
    /// Whether the tick loop should advance this timer.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_complete
    }
}

/// Request to create a timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTimer {
    pub step_id: String,
    pub label: String,
    pub total_seconds: u32,
}

// =============================================================================
// Persisted session
// =============================================================================

/// The durable shape of a cooking session, one record per store.
///
/// Restoring this record reproduces the session exactly; nothing is
/// re-derived on load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub recipe: Option<Recipe>,
    pub raw_recipe_source: Option<String>,
    pub current_step_index: usize,
    pub used_ingredient_ids: Vec<String>,
    pub completed_step_indices: Vec<usize>,
    pub timers: Vec<TimerState>,
    pub is_completed: bool,
    pub started_at: Option<Timestamp>,
    pub last_active_at: Option<Timestamp>,
    pub is_paused: bool,
}

impl SessionSnapshot {
    pub fn has_active_session(&self) -> bool {
        self.recipe.is_some() && !self.is_completed
    }
}

// =============================================================================
// Timestamp
// =============================================================================

/// Unix timestamp in seconds (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        let flour = Ingredient::new("Plain Flour", "200g");
        let eggs = Ingredient::new("Eggs", "2");
        Recipe {
            id: "r1".to_string(),
            title: "Pancakes".to_string(),
            total_time_minutes: 20,
            servings: 4,
            steps: vec![
                RecipeStep::new(0, "Whisk flour and eggs", 0)
                    .with_ingredients(vec![flour.id.clone(), eggs.id.clone()]),
                RecipeStep::new(1, "Rest the batter", 10),
                RecipeStep::new(2, "Fry", 5),
            ],
            ingredients: vec![flour, eggs],
        }
    }

    #[test]
    fn test_ingredient_id_normalizes_name() {
        assert_eq!(ingredient_id("Plain Flour", "200g"), "ing-plain-flour-200g");
        assert_eq!(
            ingredient_id("  Extra   Virgin\tOlive Oil ", "2 tbsp"),
            "ing-extra-virgin-olive-oil-2 tbsp"
        );
    }

    #[test]
    fn test_ingredient_id_is_reproducible() {
        let a = Ingredient::new("Brown Sugar", "1 cup");
        let b = Ingredient::new("brown   sugar", "1 cup");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_ingredient_id_depends_on_quantity() {
        assert_ne!(ingredient_id("Salt", "1 tsp"), ingredient_id("Salt", "2 tsp"));
    }

    #[test]
    fn test_step_ids_are_positional() {
        let recipe = sample_recipe();
        assert_eq!(recipe.steps[0].id, "step-0");
        assert_eq!(recipe.steps[2].id, "step-2");
        assert_eq!(recipe.step_index("step-1"), Some(1));
        assert_eq!(recipe.step_index("step-9"), None);
    }

    #[test]
    fn test_last_index() {
        let mut recipe = sample_recipe();
        assert_eq!(recipe.last_index(), Some(2));
        recipe.steps.clear();
        assert_eq!(recipe.last_index(), None);
    }

    #[test]
    fn test_ingredients_for_step() {
        let recipe = sample_recipe();
        let names: Vec<&str> = recipe
            .ingredients_for_step(0)
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Plain Flour", "Eggs"]);
        assert!(recipe.ingredients_for_step(1).is_empty());
        assert!(recipe.ingredients_for_step(99).is_empty());
    }

    #[test]
    fn test_recipe_json_uses_camel_case() {
        let recipe = sample_recipe();
        let json = serde_json::to_string(&recipe).unwrap();
        assert!(json.contains("\"totalTimeMinutes\":20"));
        assert!(json.contains("\"estimatedMinutes\":10"));
        assert!(json.contains("\"ingredientIds\""));
    }

    #[test]
    fn test_recipe_json_optional_fields_default() {
        let json = r#"{"id":"x","title":"Toast","steps":[{"id":"step-0","text":"Toast bread"}]}"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.servings, 0);
        assert_eq!(recipe.steps[0].estimated_minutes, 0);
        assert!(recipe.ingredients.is_empty());
    }

    #[test]
    fn test_snapshot_has_active_session() {
        let mut snapshot = SessionSnapshot::default();
        assert!(!snapshot.has_active_session());

        snapshot.recipe = Some(sample_recipe());
        assert!(snapshot.has_active_session());

        snapshot.is_completed = true;
        assert!(!snapshot.has_active_session());
    }

    #[test]
    fn test_snapshot_field_names() {
        let snapshot = SessionSnapshot::default();
        let value = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "recipe",
            "rawRecipeSource",
            "currentStepIndex",
            "usedIngredientIds",
            "completedStepIndices",
            "timers",
            "isCompleted",
            "startedAt",
            "lastActiveAt",
            "isPaused",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_timer_is_ticking() {
        let mut timer = TimerState {
            id: TimerId::generate(),
            step_id: step_id(0),
            label: "Step 1".to_string(),
            total_seconds: 60,
            remaining_seconds: 60,
            is_running: false,
            is_complete: false,
        };
        assert!(!timer.is_ticking());
        timer.is_running = true;
        assert!(timer.is_ticking());
    }

    #[test]
    fn test_timestamp_to_datetime_roundtrip() {
        let now = Utc::now();
        let ts = Timestamp::from_datetime(now);
        assert_eq!(ts.to_datetime().timestamp(), now.timestamp());
    }
}
