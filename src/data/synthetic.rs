//! Synthetic talent profiles for demos, tests and benchmarks.
//!
//! Signals are shaped by domain so the skill score is learnable; about 2% of
//! rows are overwritten with implausible "bot farm" values.

use super::schema::{FEATURE_COLUMNS, TARGET_COLUMN};
use super::{Dataset, Value};
use crate::numeric::round_dp;
use rand::seq::SliceRandom;
use rand::Rng;

pub const DOMAINS: [&str; 10] = [
    "Technology",
    "Data & Research",
    "Business",
    "Creative",
    "Skilled Trades",
    "Social Impact",
    "Agriculture",
    "Healthcare",
    "Education",
    "Craft & Artisan",
];

const STATES: [&str; 10] = [
    "Maharashtra",
    "Karnataka",
    "Tamil Nadu",
    "Delhi",
    "Uttar Pradesh",
    "Gujarat",
    "West Bengal",
    "Bihar",
    "Kerala",
    "Punjab",
];

const ANOMALY_RATE: f64 = 0.02;

/// Approximately normal draw (Irwin-Hall sum of twelve uniforms).
fn gauss<R: Rng>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    let s: f64 = (0..12).map(|_| rng.gen::<f64>()).sum();
    mean + sd * (s - 6.0)
}

fn signal<R: Rng>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    round_dp(gauss(rng, mean, sd).clamp(0.0, 100.0), 1)
}

fn count<R: Rng>(rng: &mut R, mean: u32) -> f64 {
    rng.gen_range(0..=mean * 2) as f64
}

/// Generate `n` complete profiles.
pub fn generate_profiles<R: Rng>(n: usize, rng: &mut R) -> Dataset {
    let mut headers: Vec<String> = ["domain", "state", "area_type", "opportunity_level", "digital_access"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend(FEATURE_COLUMNS.iter().map(|s| s.to_string()));
    headers.push(TARGET_COLUMN.to_string());
    headers.extend(
        [
            "internet_penetration",
            "urban_population_percent",
            "per_capita_income",
            "workforce_participation",
            "literacy_rate",
            "unemployment_rate",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
        let domain = *DOMAINS.choose(rng).unwrap_or(&"Business");
        let state = *STATES.choose(rng).unwrap_or(&"Delhi");
        let roll: f64 = rng.gen();
        let (area, opportunity, digital) = if roll < 0.2 {
            ("Urban", "High", "Regular")
        } else if roll < 0.35 {
            ("Semi-Urban", "Moderate", "Limited")
        } else {
            ("Rural", "Low", "Occasional")
        };

        let tech = matches!(domain, "Technology" | "Data & Research");
        let trades = matches!(domain, "Skilled Trades" | "Agriculture");
        let creative = matches!(domain, "Creative" | "Craft & Artisan");

        let creation = if creative {
            signal(rng, 85.0, 10.0)
        } else if tech || trades {
            signal(rng, 72.0, 15.0)
        } else {
            signal(rng, 50.0, 20.0)
        };
        let learning = if tech || domain == "Education" {
            signal(rng, 75.0, 15.0)
        } else if domain == "Agriculture" {
            signal(rng, 40.0, 20.0)
        } else {
            signal(rng, 60.0, 20.0)
        };
        let experience = if trades {
            signal(rng, 80.0, 15.0)
        } else {
            signal(rng, 60.0, 20.0)
        };
        let economic = if matches!(domain, "Business" | "Technology") {
            signal(rng, 70.0, 20.0)
        } else {
            signal(rng, 50.0, 20.0)
        };
        let innovation = if tech || trades {
            signal(rng, 68.0, 18.0)
        } else {
            signal(rng, 40.0, 20.0)
        };
        let collaboration = signal(rng, 50.0, 20.0);
        let offline = if trades || creative || domain == "Social Impact" {
            signal(rng, 85.0, 10.0)
        } else {
            signal(rng, 40.0, 25.0)
        };
        let presence = if matches!(domain, "Technology" | "Business" | "Creative") {
            signal(rng, 85.0, 10.0)
        } else {
            signal(rng, 45.0, 22.0)
        };
        let hours = round_dp(gauss(rng, 18.0, 6.0).abs(), 1);
        let projects = count(rng, if creative { 20 } else { 8 });

        let score = 0.2 * creation
            + 0.2 * learning
            + 0.2 * innovation
            + 0.2 * experience
            + 0.1 * presence
            + 0.1 * offline
            + gauss(rng, 0.0, 2.0);
        let score = round_dp(score.clamp(0.0, 100.0), 1);

        let mut row: Vec<Value> = vec![
            domain.into(),
            state.into(),
            area.into(),
            opportunity.into(),
            digital.into(),
        ];
        row.extend(
            [
                creation,
                learning,
                experience,
                economic,
                innovation,
                collaboration,
                offline,
                presence,
                hours,
                projects,
                score,
            ]
            .map(Value::Number),
        );
        row.extend(
            [
                round_dp(rng.gen_range(20.0..95.0), 1),
                round_dp(rng.gen_range(15.0..85.0), 1),
                round_dp(rng.gen_range(30_000.0..350_000.0), 0),
                round_dp(rng.gen_range(30.0..75.0), 1),
                round_dp(rng.gen_range(55.0..98.0), 1),
                round_dp(rng.gen_range(2.0..25.0), 1),
            ]
            .map(Value::Number),
        );

        if rng.gen_bool(ANOMALY_RATE) {
            // offsets: 5 categorical columns precede the features
            row[5] = Value::Number(100.0); // creation_output
            row[5 + 4] = Value::Number(100.0); // innovation_problem_solving
            row[5 + 8] = Value::Number(160.0); // learning_hours
            row[5 + 10] = Value::Number(100.0); // skill_score
        }
        rows.push(row);
    }
    Dataset::from_rows(&headers, rows)
}
