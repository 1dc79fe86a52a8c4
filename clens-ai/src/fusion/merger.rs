//! Merger
//!
//! Injects perception facts (mass, vitality) into a protocol's narrative
//! steps. The original instruction text is never rewritten; annotations are
//! appended in inventory order.

use clens_common::models::{Ingredient, NeuralProtocol, ProtocolStep};
use tracing::debug;

const LOW_VITALITY_NOTE: &str = " (Bio-Vitality Alert: Increase heat intensity for safety)";

/// Annotation suffix for one step, empty when no inventory item is mentioned
fn step_annotations(step: &ProtocolStep, inventory: &[&Ingredient]) -> String {
    let instruction = step.instruction.to_lowercase();
    let mut note = String::new();

    for ingredient in inventory {
        let name = ingredient.name.trim().to_lowercase();
        if name.is_empty() || !instruction.contains(&name) {
            continue;
        }

        note.push_str(&format!(" [Utilize {}g]", ingredient.mass_grams));
        if ingredient.is_spoilage_risk() {
            note.push_str(LOW_VITALITY_NOTE);
        }
    }

    note
}

/// Return a copy of `protocol` with technical annotations on each step
///
/// Re-merging an already merged protocol with the same inventory is a no-op:
/// a step that already ends with its computed annotations is left alone.
pub fn merge_metadata<'a, I>(inventory: I, protocol: &NeuralProtocol) -> NeuralProtocol
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let inventory: Vec<&Ingredient> = inventory.into_iter().collect();
    let mut annotated_steps = 0;

    let instructions = protocol
        .instructions
        .iter()
        .map(|step| {
            let note = step_annotations(step, &inventory);
            let base = step.instruction.trim_end();

            if note.is_empty() || base.ends_with(&note) {
                return step.clone();
            }

            annotated_steps += 1;
            ProtocolStep {
                instruction: format!("{}{}", base, note),
                ..step.clone()
            }
        })
        .collect();

    debug!(
        protocol_id = %protocol.id,
        annotated_steps,
        "Merged perception metadata into protocol steps"
    );

    NeuralProtocol {
        instructions,
        ..protocol.clone()
    }
}
