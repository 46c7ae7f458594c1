//! Ranks pathologies given a partial patient presentation.
//!
//! Records are read from the JSON file named by the first argument, or generated when no file is
//! given. Set `RUST_LOG=debug` to follow graph construction and message passing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use symptom_graph as sg;

use std::env;
use std::fs::File;
use std::io::BufReader;

/// (pathology, [(symptom, probability present, max severity)])
const PROFILES: &[(&str, &[(&str, f64, i64)])] = &[
    ("Influenza", &[("Fever", 0.9, 10), ("Cough", 0.7, 6), ("Fatigue", 0.8, 8)]),
    ("Common cold", &[("Cough", 0.6, 4), ("Sore throat", 0.7, 5), ("Fever", 0.2, 3)]),
    ("Migraine", &[("Headache", 0.95, 10), ("Nausea", 0.5, 6), ("Fatigue", 0.3, 4)]),
    ("Gastroenteritis", &[("Nausea", 0.85, 8), ("Fever", 0.4, 5), ("Fatigue", 0.5, 5)])
];

fn synthetic_records(n: usize, seed: u64) -> Vec<sg::SymptomRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let genders = ["Female", "Male"];

    (0..n).map(|_| {
        let (pathology, profile) = PROFILES[rng.gen_range(0..PROFILES.len())];

        let mut symptoms = Vec::new();
        for &(text, p, max) in profile.iter() {
            if rng.gen_bool(p) {
                symptoms.push(sg::SymptomObservation {
                    text: String::from(text),
                    severity: rng.gen_range(1..=max)
                });
            }
        }

        sg::SymptomRecord {
            age: rng.gen_range(1..90),
            gender: String::from(genders[rng.gen_range(0..2)]),
            pathology: String::from(pathology),
            symptoms
        }
    }).collect()
}

fn main() -> sg::Result<()> {
    env_logger::init();

    /////////////////////////////////////////////////////
    // Step 1: Load or generate records
    let records = match env::args().nth(1) {
        Some(path) => sg::read_records(BufReader::new(File::open(path)?))?,
        None => synthetic_records(5_000, 425)
    };

    /////////////////////////////////////////////////////
    // Step 2: Build the graph
    let stats = sg::SymptomStatistics::from_records(&records);
    let mut graph = sg::FactorGraph::from_statistics(&stats)?;

    /////////////////////////////////////////////////////
    // Step 3: Clamp the presentation
    graph.set_gender("Female")?;
    if graph.contains("Fever") {
        graph.set_symptom("Fever", true)?;
    }
    if graph.contains("Headache") {
        graph.set_symptom("Headache", false)?;
    }

    /////////////////////////////////////////////////////
    // Step 4: Infer
    graph.propagate()?;
    let ranking = sg::pathology_ranking(&mut graph)?;

    if ranking.is_empty() {
        println!("no matching records");
        return Ok(());
    }

    for (pathology, p) in ranking.iter() {
        println!("P({} | Gender = Female, Fever, no Headache) = {:.4}", pathology, p);
    }

    Ok(())
}
