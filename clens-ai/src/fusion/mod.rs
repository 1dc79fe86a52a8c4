//! Fusion Layer
//!
//! Reconciles a perceived inventory with an externally generated protocol.
//!
//! **Sequence:** sanity gate → dismissed filter → validator → merger →
//! confidence → impact (validated subset only) → risk classification.
//!
//! `fuse` never fails. Any fusion error, or a panic inside a fusion step,
//! yields the input protocol unchanged.

pub mod confidence;
pub mod impact;
pub mod merger;
pub mod validator;

pub use confidence::composite_affinity;
pub use impact::calculate_impact;
pub use merger::merge_metadata;
pub use validator::{is_sane, normalize_name, validate_ingredients, ValidationOutcome};

use clens_common::models::{Ingredient, NeuralProtocol, SubstitutionRisk};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fusion error
///
/// Never escapes `fuse`; returned by `try_fuse` for callers that want the reason.
#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    /// Inventory contains non-positive mass or negative vitality
    #[error("Sanity check failed: {0}")]
    SanityCheckFailed(String),

    /// Protocol was produced by an earlier fusion pass
    #[error("Protocol {0} has already been fused")]
    AlreadyFused(String),

    #[error("Internal fusion error: {0}")]
    Internal(String),
}

/// Map a hallucination count to a substitution risk
pub fn classify_risk(hallucination_count: usize) -> SubstitutionRisk {
    match hallucination_count {
        0 => SubstitutionRisk::Safe,
        1 => SubstitutionRisk::Experimental,
        _ => SubstitutionRisk::Risky,
    }
}

/// Run one reconciliation pass, reporting why it could not complete
///
/// The input protocol is never modified; the result is a new protocol.
pub fn try_fuse(
    inventory: &[Ingredient],
    protocol: &NeuralProtocol,
) -> Result<NeuralProtocol, FusionError> {
    if !is_sane(inventory) {
        let offenders: Vec<&str> = inventory
            .iter()
            .filter(|i| !(i.mass_grams > 0.0 && i.vitality_score >= 0.0))
            .map(|i| i.name.as_str())
            .collect();
        return Err(FusionError::SanityCheckFailed(format!(
            "invalid mass or vitality for {}",
            offenders.join(", ")
        )));
    }

    // Merger annotations must be applied exactly once. Fusion fields that
    // came with the protocol are overwritten below, never trusted.
    if protocol.is_fused() {
        return Err(FusionError::AlreadyFused(protocol.id.clone()));
    }

    let active: Vec<&Ingredient> = inventory.iter().filter(|i| !i.is_dismissed()).collect();
    debug!(
        protocol_id = %protocol.id,
        inventory = inventory.len(),
        active = active.len(),
        "Starting fusion pass"
    );

    let outcome = validate_ingredients(active.iter().copied(), protocol);

    let mut missing = protocol.missing_ingredients.clone();
    missing.extend(outcome.identified_hallucinations.iter().cloned());

    let reconciled = NeuralProtocol {
        ingredients_used: outcome.validated_used.clone(),
        missing_ingredients: missing,
        ..protocol.clone()
    };

    let mut fused = merge_metadata(active.iter().copied(), &reconciled);
    fused.fusion_applied = true;
    fused.molecular_affinity = Some(composite_affinity(&fused));

    let confirmed: HashSet<String> = outcome
        .validated_used
        .iter()
        .map(|n| normalize_name(n))
        .collect();
    let impact = calculate_impact(
        active
            .iter()
            .copied()
            .filter(|i| confirmed.contains(&normalize_name(&i.name))),
    );
    if !impact.co2_saved_kg.is_finite() || !impact.waste_avoided_grams.is_finite() {
        return Err(FusionError::Internal(
            "impact calculation produced a non-finite value".to_string(),
        ));
    }
    fused.impact_metrics = Some(impact);

    let risk = classify_risk(outcome.hallucination_count());
    fused.substitution_risk = Some(risk);

    info!(
        protocol_id = %fused.id,
        validated = outcome.validated_used.len(),
        hallucinations = outcome.hallucination_count(),
        risk = %risk,
        "Fusion pass complete"
    );

    Ok(fused)
}

/// Reconcile `inventory` with `protocol`
///
/// Falls back to a copy of `protocol` on any failure.
pub fn fuse(inventory: &[Ingredient], protocol: &NeuralProtocol) -> NeuralProtocol {
    match panic::catch_unwind(AssertUnwindSafe(|| try_fuse(inventory, protocol))) {
        Ok(Ok(fused)) => fused,
        Ok(Err(FusionError::AlreadyFused(id))) => {
            debug!(protocol_id = %id, "Protocol already fused, returning as-is");
            protocol.clone()
        }
        Ok(Err(e @ FusionError::SanityCheckFailed(_))) => {
            warn!(
                protocol_id = %protocol.id,
                error = %e,
                "Fusion aborted, returning unreconciled protocol"
            );
            protocol.clone()
        }
        Ok(Err(e)) => {
            warn!(
                protocol_id = %protocol.id,
                error = %e,
                "Fusion failed, returning unreconciled protocol"
            );
            protocol.clone()
        }
        Err(_) => {
            warn!(
                protocol_id = %protocol.id,
                "Fusion step panicked, returning unreconciled protocol"
            );
            protocol.clone()
        }
    }
}
