//! Canonical columns and their synthetic generators.
//!
//! [`SchemaSpec`] is an immutable value handed to the validator and imputer;
//! nothing here is global mutable state.

use super::Value;
use crate::numeric::round_dp;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Base model features, in matrix order.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "creation_output",
    "learning_behavior",
    "experience_consistency",
    "economic_activity",
    "innovation_problem_solving",
    "collaboration_community",
    "offline_capability",
    "digital_presence",
    "learning_hours",
    "projects",
];

/// The eight behavioral dimensions averaged into `behavioral_avg`.
pub const BEHAVIORAL_COLUMNS: [&str; 8] = [
    "creation_output",
    "learning_behavior",
    "experience_consistency",
    "economic_activity",
    "innovation_problem_solving",
    "collaboration_community",
    "offline_capability",
    "digital_presence",
];

/// Derived features, in the order they are appended to the matrix.
pub const ENGINEERED_COLUMNS: [&str; 7] = [
    "behavioral_avg",
    "output_to_learning_ratio",
    "consistency_score",
    "digital_economic_index",
    "digital_index",
    "economic_activity_index",
    "opportunity_gap",
];

pub const CATEGORICAL_COLUMNS: [&str; 5] =
    ["state", "domain", "area_type", "digital_access", "opportunity_level"];

pub const TARGET_COLUMN: &str = "skill_score";
pub const DOMAIN_COLUMN: &str = "domain";
/// Legacy domain dropped from every validated table.
pub const DEPRECATED_DOMAIN: &str = "Healthcare";

const STATES: [&str; 8] = [
    "Maharashtra",
    "Karnataka",
    "Punjab",
    "Bihar",
    "Tamil Nadu",
    "Gujarat",
    "Kerala",
    "Uttar Pradesh",
];
const DIGITAL_ACCESS: [&str; 4] = ["High", "Regular", "Limited", "Occasional"];
const OPPORTUNITY_LEVELS: [&str; 3] = ["High", "Moderate", "Low"];
const HEAL_DOMAINS: [&str; 4] = [
    "Retail & Sales",
    "Manufacturing & Operations",
    "Agriculture & Allied",
    "Construction & Skilled Trades",
];
const AREA_TYPES: [&str; 3] = ["Urban", "Semi-Urban", "Rural"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Synthetic value source for one column, parameterized only by row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnGenerator {
    /// Integers in `low..high` (upper bound exclusive).
    IntRange { low: i64, high: i64 },
    /// Uniform floats in `low..high`, rounded to `decimals`.
    Uniform { low: f64, high: f64, decimals: u32 },
    /// Uniform pick from a fixed category list.
    Choice { values: Vec<String> },
}

impl ColumnGenerator {
    fn choice(values: &[&str]) -> Self {
        ColumnGenerator::Choice {
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn generate<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<Value> {
        match self {
            ColumnGenerator::IntRange { low, high } => (0..n)
                .map(|_| Value::Number(rng.gen_range(*low..*high) as f64))
                .collect(),
            ColumnGenerator::Uniform { low, high, decimals } => (0..n)
                .map(|_| Value::Number(round_dp(rng.gen_range(*low..*high), *decimals)))
                .collect(),
            ColumnGenerator::Choice { values } => (0..n)
                .map(|_| {
                    values
                        .choose(rng)
                        .map(|s| Value::Text(s.clone()))
                        .unwrap_or(Value::Null)
                })
                .collect(),
        }
    }

    /// Inclusive bounds every generated numeric value falls within.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            ColumnGenerator::IntRange { low, high } => Some((*low as f64, (*high - 1) as f64)),
            ColumnGenerator::Uniform { low, high, .. } => Some((*low, *high)),
            ColumnGenerator::Choice { .. } => None,
        }
    }

    pub fn choices(&self) -> Option<&[String]> {
        match self {
            ColumnGenerator::Choice { values } => Some(values),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub generator: ColumnGenerator,
}

impl ColumnSpec {
    fn numeric(name: &str, generator: ColumnGenerator) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
            generator,
        }
    }

    fn categorical(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Categorical,
            generator: ColumnGenerator::choice(values),
        }
    }
}

/// Required columns, imputation column lists and the excluded legacy category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    required: Vec<ColumnSpec>,
    numeric: Vec<String>,
    categorical: Vec<String>,
    excluded: Option<(String, String)>,
}

impl SchemaSpec {
    pub fn new(
        required: Vec<ColumnSpec>,
        numeric: Vec<String>,
        categorical: Vec<String>,
        excluded: Option<(String, String)>,
    ) -> Self {
        Self {
            required,
            numeric,
            categorical,
            excluded,
        }
    }

    pub fn required(&self) -> &[ColumnSpec] {
        &self.required
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.required.iter().find(|c| c.name == name)
    }

    /// Columns imputed with the median.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric
    }

    /// Columns imputed with the mode.
    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical
    }

    /// `(column, value)` whose rows are always dropped.
    pub fn excluded_category(&self) -> Option<(&str, &str)> {
        self.excluded
            .as_ref()
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

impl Default for SchemaSpec {
    fn default() -> Self {
        let behavioral = ColumnGenerator::IntRange { low: 20, high: 90 };
        let mut required: Vec<ColumnSpec> = FEATURE_COLUMNS
            .iter()
            .map(|c| ColumnSpec::numeric(c, behavioral.clone()))
            .collect();
        required.extend([
            ColumnSpec::categorical("state", &STATES),
            ColumnSpec::categorical("digital_access", &DIGITAL_ACCESS),
            ColumnSpec::categorical("opportunity_level", &OPPORTUNITY_LEVELS),
            ColumnSpec::categorical(DOMAIN_COLUMN, &HEAL_DOMAINS),
            ColumnSpec::categorical("area_type", &AREA_TYPES),
            ColumnSpec::numeric(TARGET_COLUMN, ColumnGenerator::IntRange { low: 30, high: 90 }),
        ]);
        let uniform = |low: f64, high: f64, decimals: u32| ColumnGenerator::Uniform {
            low,
            high,
            decimals,
        };
        required.extend([
            ColumnSpec::numeric("internet_penetration", uniform(20.0, 95.0, 1)),
            ColumnSpec::numeric("urban_population_percent", uniform(15.0, 85.0, 1)),
            ColumnSpec::numeric("per_capita_income", uniform(30_000.0, 350_000.0, 0)),
            ColumnSpec::numeric("workforce_participation", uniform(30.0, 75.0, 1)),
            ColumnSpec::numeric("literacy_rate", uniform(55.0, 98.0, 1)),
            ColumnSpec::numeric("unemployment_rate", uniform(2.0, 25.0, 1)),
        ]);

        let mut numeric: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        numeric.push(TARGET_COLUMN.to_string());

        Self {
            required,
            numeric,
            categorical: CATEGORICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            excluded: Some((DOMAIN_COLUMN.to_string(), DEPRECATED_DOMAIN.to_string())),
        }
    }
}
