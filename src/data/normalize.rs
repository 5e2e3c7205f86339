use super::{Dataset, Value};
use crate::numeric::round_dp;

/// Min-max scale each named numeric column onto 0–100 (1 decimal).
///
/// Columns whose minimum equals their maximum, and absent columns, are left as-is.
pub fn normalize(table: &Dataset, columns: &[&str]) -> Dataset {
    let mut out = table.clone();
    for &name in columns {
        let Some(col) = out.column(name) else { continue };
        let present: Vec<f64> = col.iter().filter_map(Value::as_f64).collect();
        let (Some(min), Some(max)) = (
            present.iter().copied().reduce(f64::min),
            present.iter().copied().reduce(f64::max),
        ) else {
            continue;
        };
        if max <= min {
            continue;
        }
        let scaled = col
            .iter()
            .map(|v| match v {
                Value::Number(x) => Value::Number(round_dp((x - min) / (max - min) * 100.0, 1)),
                other => other.clone(),
            })
            .collect();
        out.set_column(name, scaled);
    }
    out
}
