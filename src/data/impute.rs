//! Null filling: median for numeric columns, mode for categorical ones.

use super::{Dataset, SchemaSpec, Value};
use crate::numeric::median;
use std::collections::BTreeMap;
use tracing::info;

const UNKNOWN: &str = "Unknown";

/// Replace nulls using statistics of the current table.
///
/// Numeric columns take the median of their non-null numbers. Categorical
/// columns take the most frequent value; ties resolve to the smallest value in
/// ascending order, and an all-null column becomes `"Unknown"`.
pub fn impute(table: &Dataset, schema: &SchemaSpec) -> Dataset {
    let mut out = table.clone();
    let mut filled = 0usize;

    for name in schema.numeric_columns() {
        let Some(col) = out.column(name) else { continue };
        let nulls = col.iter().filter(|v| v.is_null()).count();
        if nulls == 0 {
            continue;
        }
        let present: Vec<f64> = col.iter().filter_map(Value::as_f64).collect();
        // an all-null numeric column has no median; leave it for the matrix fill
        let Some(fill) = median(&present) else { continue };
        let values = col
            .iter()
            .map(|v| if v.is_null() { Value::Number(fill) } else { v.clone() })
            .collect();
        out.set_column(name.clone(), values);
        filled += nulls;
    }

    for name in schema.categorical_columns() {
        let Some(col) = out.column(name) else { continue };
        let nulls = col.iter().filter(|v| v.is_null()).count();
        if nulls == 0 {
            continue;
        }
        let fill = mode(col).unwrap_or_else(|| Value::Text(UNKNOWN.to_string()));
        let values = col
            .iter()
            .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
            .collect();
        out.set_column(name.clone(), values);
        filled += nulls;
    }

    info!(filled, "imputed missing values");
    out
}

/// Most frequent non-null value. Ties go to the smallest number (by value),
/// then to the first text value in ascending order.
fn mode(col: &[Value]) -> Option<Value> {
    let mut numbers: Vec<f64> = col.iter().filter_map(Value::as_f64).collect();
    numbers.sort_by(f64::total_cmp);
    let mut candidates: Vec<(Value, usize)> = Vec::new();
    for n in numbers {
        match candidates.last_mut() {
            Some((Value::Number(prev), count)) if *prev == n => *count += 1,
            _ => candidates.push((Value::Number(n), 1)),
        }
    }

    let mut texts: BTreeMap<&str, usize> = BTreeMap::new();
    for s in col.iter().filter_map(Value::as_str) {
        *texts.entry(s).or_insert(0) += 1;
    }
    candidates.extend(texts.into_iter().map(|(s, c)| (Value::from(s), c)));

    let best = candidates.iter().map(|(_, c)| *c).max()?;
    candidates.into_iter().find(|(_, c)| *c == best).map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Dataset {
        let headers = vec![
            "learning_hours".to_string(),
            "state".to_string(),
            "area_type".to_string(),
        ];
        let rows = vec![
            vec![Value::Number(10.0), Value::from("Punjab"), Value::Null],
            vec![Value::Null, Value::from("Bihar"), Value::Null],
            vec![Value::Number(30.0), Value::Null, Value::Null],
            vec![Value::Number(20.0), Value::from("Punjab"), Value::Null],
            vec![Value::Number(40.0), Value::from("Bihar"), Value::Null],
        ];
        Dataset::from_rows(&headers, rows)
    }

    #[test]
    fn numeric_nulls_take_median() {
        let out = impute(&table(), &SchemaSpec::default());
        assert_eq!(out.column("learning_hours").unwrap()[1], Value::Number(25.0));
    }

    #[test]
    fn categorical_tie_breaks_ascending() {
        let out = impute(&table(), &SchemaSpec::default());
        // Bihar and Punjab both appear twice
        assert_eq!(out.column("state").unwrap()[2], Value::from("Bihar"));
    }

    #[test]
    fn all_null_categorical_becomes_unknown() {
        let out = impute(&table(), &SchemaSpec::default());
        assert!(out
            .column("area_type")
            .unwrap()
            .iter()
            .all(|v| v.as_str() == Some("Unknown")));
    }

    #[test]
    fn numeric_categories_tie_break_by_value() {
        let schema = SchemaSpec::new(Vec::new(), Vec::new(), vec!["tier".to_string()], None);
        let rows = [10.0, 9.0, 10.0, 9.0]
            .iter()
            .map(|v| vec![Value::Number(*v)])
            .chain(std::iter::once(vec![Value::Null]))
            .collect();
        let ds = Dataset::from_rows(&["tier".to_string()], rows);
        let out = impute(&ds, &schema);
        assert_eq!(out.column("tier").unwrap()[4], Value::Number(9.0));
    }

    #[test]
    fn imputation_is_idempotent() {
        let schema = SchemaSpec::default();
        let once = impute(&table(), &schema);
        let twice = impute(&once, &schema);
        assert_eq!(once, twice);
    }
}
