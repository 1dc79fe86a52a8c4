//! Impact calculator
//!
//! Environmental impact of cooking an ingredient set rather than wasting it.
//! Always a pure function of the ingredients.

use clens_common::models::{ImpactMetrics, Ingredient};

/// Per-kilogram impact coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactCoefficient {
    pub co2_kg: f64,
    pub water_litres: f64,
}

const DEFAULT_COEFFICIENT: ImpactCoefficient = ImpactCoefficient {
    co2_kg: 1.0,
    water_litres: 500.0,
};

/// Coefficient for a category; unmapped categories use the default
pub fn coefficient_for(category: &str) -> ImpactCoefficient {
    match category.trim().to_lowercase().as_str() {
        "fruit" => ImpactCoefficient {
            co2_kg: 0.4,
            water_litres: 960.0,
        },
        "vegetable" => ImpactCoefficient {
            co2_kg: 0.5,
            water_litres: 320.0,
        },
        "protein" => ImpactCoefficient {
            co2_kg: 12.0,
            water_litres: 4300.0,
        },
        "dairy" => ImpactCoefficient {
            co2_kg: 3.2,
            water_litres: 1000.0,
        },
        _ => DEFAULT_COEFFICIENT,
    }
}

/// Accumulate CO2, water and waste avoided over an ingredient set
///
/// CO2 is rounded to two decimals, water to the nearest litre.
pub fn calculate_impact<'a, I>(inventory: I) -> ImpactMetrics
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let mut co2 = 0.0;
    let mut water = 0.0;
    let mut waste = 0.0;

    for ingredient in inventory {
        let coefficient = coefficient_for(&ingredient.category);
        let mass_kg = ingredient.mass_grams / 1000.0;

        co2 += coefficient.co2_kg * mass_kg;
        water += coefficient.water_litres * mass_kg;
        waste += ingredient.mass_grams;
    }

    ImpactMetrics {
        co2_saved_kg: (co2 * 100.0).round() / 100.0,
        water_saved_litres: water.round().max(0.0) as u64,
        waste_avoided_grams: waste,
    }
}
