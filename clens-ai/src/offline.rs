//! Offline Protocol Generator
//!
//! Builds a complete protocol on-device when the external reasoning engine
//! is unreachable. Output is deterministic for a given inventory apart from
//! the protocol id. Fusion-only fields are left absent so the result can go
//! through the fusion layer like any engine-generated protocol.

use crate::fusion::normalize_name;
use crate::registry::{ModelRegistry, ModelType};
use clens_common::models::{
    DrinkPairing, Ingredient, NeuralProtocol, Nutrition, ProtocolStep, UserPreferences,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

const PRIMARY_FALLBACK: &str = "Botanical";
const SECONDARY_FALLBACK: &str = "Secondary Element";
const UNVERSIONED: &str = "unversioned";
const STEP_TIMER_SECONDS: u32 = 240;

struct Blueprint {
    title: &'static str,
    description: &'static str,
    steps: [(&'static str, &'static str); 3],
}

static BLUEPRINTS: [Blueprint; 2] = [
    Blueprint {
        title: "Sovereign {primary} Composition",
        description: "An architectural exploration of {primary} textures, harmonized with {secondary} using local Edge Model {version}.",
        steps: [
            ("Deconstruct {primary} into geometric primitives to maximize surface interaction.", "Structural Slicing"),
            ("Synthesize an emulsion of {secondary} and base lipids to create a high-viscosity foundation.", "Thermal Gelation"),
            ("Plate using a radial symmetry grid, ensuring 35% negative space.", "Minimalist Assembly"),
        ],
    },
    Blueprint {
        title: "Deconstructed {primary} & {secondary} Study",
        description: "Isolating essential flavor profiles of {primary} via Edge Engine {version} and pairing with high-acidity nodes of {secondary}.",
        steps: [
            ("Stabilize the {primary} structure using a precision chill cycle.", "Cryogenic Tempering"),
            ("Perform a rapid atmospheric reduction of {secondary} to concentrate the ester profile.", "Atmospheric Reduction"),
            ("Assemble with vertical architecture to create a multisensory topographical map.", "Technical Plating"),
        ],
    },
];

/// Nutrients per 100 g
#[derive(Debug, Clone, Copy)]
struct NutrientDensity {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

const fn density(calories: f64, protein: f64, carbs: f64, fat: f64) -> NutrientDensity {
    NutrientDensity {
        calories,
        protein,
        carbs,
        fat,
    }
}

const DEFAULT_DENSITY: NutrientDensity = density(100.0, 5.0, 10.0, 5.0);

fn nutrient_density(category: &str) -> NutrientDensity {
    match category.trim().to_lowercase().as_str() {
        "fruit" => density(50.0, 0.5, 12.0, 0.2),
        "vegetable" => density(25.0, 1.5, 5.0, 0.1),
        "protein" => density(220.0, 22.0, 0.0, 14.0),
        "dairy" => density(160.0, 9.0, 4.0, 12.0),
        "herb" => density(5.0, 0.1, 1.0, 0.1),
        "condiment" => density(300.0, 0.5, 5.0, 32.0),
        _ => DEFAULT_DENSITY,
    }
}

static SUBSTITUTIONS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let table: [(&str, &[&str]); 7] = [
        ("butter", &["olive oil", "ghee", "coconut oil"]),
        ("milk", &["soy milk", "oat milk", "cream"]),
        ("lemon", &["lime", "vinegar", "verjuice"]),
        ("onion", &["shallot", "leek", "chives"]),
        ("chicken", &["tofu", "pork", "turkey"]),
        ("egg", &["flax egg", "aquafaba", "yogurt"]),
        ("heavy cream", &["coconut cream", "cashew cream", "yogurt"]),
    ];
    table.into_iter().collect()
});

/// Offline alternatives for an ingredient; empty when none are known
pub fn find_offline_substitutions(name: &str) -> Vec<String> {
    SUBSTITUTIONS
        .get(name.trim().to_lowercase().as_str())
        .map(|alts| alts.iter().map(|a| a.to_string()).collect())
        .unwrap_or_default()
}

/// Sum nutrients over the inventory, rounded to whole units
pub fn offline_nutrition(inventory: &[Ingredient]) -> Nutrition {
    let mut total = Nutrition::default();
    for ingredient in inventory {
        let d = nutrient_density(&ingredient.category);
        let factor = ingredient.mass_grams / 100.0;
        total.calories += d.calories * factor;
        total.protein += d.protein * factor;
        total.carbs += d.carbs * factor;
        total.fat += d.fat * factor;
    }

    Nutrition {
        calories: total.calories.round(),
        protein: total.protein.round(),
        carbs: total.carbs.round(),
        fat: total.fat.round(),
    }
}

fn blueprint_for(primary: &str) -> &'static Blueprint {
    let key: usize = normalize_name(primary).bytes().map(usize::from).sum();
    &BLUEPRINTS[key % BLUEPRINTS.len()]
}

fn render(template: &str, primary: &str, secondary: &str, version: &str) -> String {
    template
        .replace("{primary}", primary)
        .replace("{secondary}", secondary)
        .replace("{version}", version)
}

/// Generate an unfused protocol from the inventory alone
///
/// Preferences are accepted for parity with the engine request; the
/// blueprints do not vary by preference.
pub fn synthesize_offline_protocol(
    inventory: &[Ingredient],
    _preferences: &UserPreferences,
    registry: &ModelRegistry,
) -> NeuralProtocol {
    let primary = inventory.first().map_or(PRIMARY_FALLBACK, |i| i.name.as_str());
    let secondary = inventory.get(1).map_or(SECONDARY_FALLBACK, |i| i.name.as_str());

    let version = registry
        .models_by_type(ModelType::Reasoning)
        .into_iter()
        .next()
        .map(|m| m.version)
        .unwrap_or_else(|| UNVERSIONED.to_string());

    let blueprint = blueprint_for(primary);
    let simple = Uuid::new_v4().simple().to_string();
    let id = format!("edge_{}", &simple[..9]);

    debug!(
        protocol_id = %id,
        primary = %primary,
        engine_version = %version,
        "Synthesized offline protocol"
    );

    NeuralProtocol {
        id,
        title: render(blueprint.title, primary, secondary, &version),
        description: render(blueprint.description, primary, secondary, &version),
        complexity: "Medium".to_string(),
        duration_minutes: 30,
        ingredients_used: inventory.iter().map(|i| i.name.clone()).collect(),
        missing_ingredients: Vec::new(),
        instructions: blueprint
            .steps
            .iter()
            .enumerate()
            .map(|(i, (instruction, technique))| ProtocolStep {
                order: i as u32 + 1,
                instruction: render(instruction, primary, secondary, &version),
                technique: technique.to_string(),
                timer_seconds: Some(STEP_TIMER_SECONDS),
            })
            .collect(),
        nutrition: offline_nutrition(inventory),
        molecular_affinity: None,
        impact_metrics: None,
        substitution_risk: None,
        plating_tips: vec![
            "Utilize matte textures for visual depth".to_string(),
            "Ensure color temperature balance between components".to_string(),
            "Inference generated via sovereign edge compute".to_string(),
        ],
        drink_pairing: Some(DrinkPairing {
            name: "Ambient Palate Cleanser".to_string(),
            description: "Non-carbonated, room-temperature mineral infusion to preserve delicate molecular nodes.".to_string(),
        }),
        is_offline: true,
        fusion_applied: false,
    }
}
