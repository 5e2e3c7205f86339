//! Required-column check with optional synthetic healing.

use super::{Dataset, SchemaSpec, Value};
use crate::error::{PipelineError, Result};
use rand::Rng;
use tracing::{info, warn};

/// Ensure every required column exists and drop rows of the excluded category.
///
/// Missing columns fail with [`PipelineError::Schema`] unless `auto_heal` is set,
/// in which case each one is filled from its generator.
pub fn validate<R: Rng>(
    table: &Dataset,
    schema: &SchemaSpec,
    auto_heal: bool,
    rng: &mut R,
) -> Result<Dataset> {
    let missing: Vec<String> = schema
        .required()
        .iter()
        .filter(|c| !table.has_column(&c.name))
        .map(|c| c.name.clone())
        .collect();

    if !missing.is_empty() && !auto_heal {
        return Err(PipelineError::Schema { missing });
    }

    let mut out = table.clone();
    for spec in schema.required().iter().filter(|c| missing.contains(&c.name)) {
        out.set_column(spec.name.clone(), spec.generator.generate(out.n_rows(), rng));
        warn!(column = %spec.name, rows = out.n_rows(), "auto-healed missing column");
    }

    if let Some((column, excluded)) = schema.excluded_category() {
        if let Some(values) = out.column(column) {
            let keep: Vec<bool> = values
                .iter()
                .map(|v| !matches!(v, Value::Text(s) if s == excluded))
                .collect();
            let dropped = keep.iter().filter(|k| !**k).count();
            if dropped > 0 {
                out = out.retain_rows(|i| keep[i]);
                info!(column, value = excluded, dropped, "removed deprecated category rows");
            }
        }
    }

    Ok(out)
}
