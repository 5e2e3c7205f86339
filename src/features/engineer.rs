//! Derived feature columns computed from base behavioral and socio-economic inputs.

use crate::data::schema::BEHAVIORAL_COLUMNS;
use crate::data::{Dataset, Value};
use crate::numeric::round_dp;
use tracing::info;

/// Add every derived column whose inputs are present; others are skipped silently.
///
/// A derived cell is null when any of its inputs is null in that row
/// (`behavioral_avg` averages whichever behavioral cells are numeric).
pub fn engineer(table: &Dataset) -> Dataset {
    let mut out = table.clone();
    let mut created: Vec<&str> = Vec::new();

    let behavioral: Vec<Vec<Option<f64>>> = BEHAVIORAL_COLUMNS
        .iter()
        .filter_map(|c| out.numeric(c))
        .collect();
    if !behavioral.is_empty() {
        let values = (0..out.n_rows())
            .map(|i| {
                let present: Vec<f64> = behavioral.iter().filter_map(|c| c[i]).collect();
                if present.is_empty() {
                    Value::Null
                } else {
                    let avg = present.iter().sum::<f64>() / present.len() as f64;
                    Value::Number(round_dp(avg, 1))
                }
            })
            .collect();
        out.set_column("behavioral_avg", values);
        created.push("behavioral_avg");
    }

    let pairs: [(&str, &str, &str, fn(f64, f64) -> f64, u32); 6] = [
        ("output_to_learning_ratio", "creation_output", "learning_behavior", |a, b| a / (b + 1.0), 2),
        ("consistency_score", "experience_consistency", "offline_capability", |a, b| a * b / 100.0, 1),
        ("digital_economic_index", "digital_presence", "economic_activity", |a, b| (a + b) / 2.0, 1),
        ("digital_index", "internet_penetration", "urban_population_percent", |a, b| a * b / 100.0, 1),
        ("economic_activity_index", "per_capita_income", "workforce_participation", |a, b| a * b / 100_000.0, 2),
        ("opportunity_gap", "literacy_rate", "unemployment_rate", |a, b| a - b, 1),
    ];

    for (name, left, right, formula, decimals) in pairs {
        let (Some(a), Some(b)) = (out.numeric(left), out.numeric(right)) else {
            continue;
        };
        let values = a
            .iter()
            .zip(&b)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => {
                    let v = formula(*a, *b);
                    if v.is_finite() {
                        Value::Number(round_dp(v, decimals))
                    } else {
                        Value::Null
                    }
                }
                _ => Value::Null,
            })
            .collect();
        out.set_column(name, values);
        created.push(name);
    }

    info!(count = created.len(), features = ?created, "engineered features");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cols: &[(&str, f64)]) -> Dataset {
        let headers: Vec<String> = cols.iter().map(|(c, _)| c.to_string()).collect();
        Dataset::from_rows(&headers, vec![cols.iter().map(|(_, v)| Value::Number(*v)).collect()])
    }

    fn cell(ds: &Dataset, name: &str) -> f64 {
        ds.column(name).unwrap()[0].as_f64().unwrap()
    }

    #[test]
    fn behavioral_formulas() {
        let ds = row(&[
            ("creation_output", 80.0),
            ("learning_behavior", 59.0),
            ("experience_consistency", 70.0),
            ("economic_activity", 40.0),
            ("innovation_problem_solving", 65.0),
            ("collaboration_community", 55.0),
            ("offline_capability", 90.0),
            ("digital_presence", 31.0),
        ]);
        let out = engineer(&ds);
        assert_eq!(cell(&out, "behavioral_avg"), 61.3);
        assert_eq!(cell(&out, "output_to_learning_ratio"), 1.33);
        assert_eq!(cell(&out, "consistency_score"), 63.0);
        assert_eq!(cell(&out, "digital_economic_index"), 35.5);
        assert!(!out.has_column("digital_index"));
    }

    #[test]
    fn socio_economic_formulas() {
        let ds = row(&[
            ("internet_penetration", 60.0),
            ("urban_population_percent", 45.0),
            ("per_capita_income", 150_000.0),
            ("workforce_participation", 52.5),
            ("literacy_rate", 88.4),
            ("unemployment_rate", 7.1),
        ]);
        let out = engineer(&ds);
        assert_eq!(cell(&out, "digital_index"), 27.0);
        assert_eq!(cell(&out, "economic_activity_index"), 78.75);
        assert_eq!(cell(&out, "opportunity_gap"), 81.3);
        assert!(!out.has_column("behavioral_avg"));
    }

    #[test]
    fn null_input_yields_null_output() {
        let headers = vec!["literacy_rate".to_string(), "unemployment_rate".to_string()];
        let ds = Dataset::from_rows(&headers, vec![vec![Value::Number(80.0), Value::Null]]);
        let out = engineer(&ds);
        assert!(out.column("opportunity_gap").unwrap()[0].is_null());
    }
}
