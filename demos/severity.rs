//! Prints the smoothed severity density of a symptom under each pathology it occurs with.
//!
//! Usage: `severity [SYMPTOM]` (default `Cough`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use symptom_graph as sg;

use std::env;

fn synthetic_records(n: usize, seed: u64) -> Vec<sg::SymptomRecord> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n).map(|_| {
        // bronchitis coughs are severe, colds mild
        let (pathology, lo, hi) = if rng.gen_bool(0.4) { ("Bronchitis", 4, 10) } else { ("Common cold", 1, 5) };
        let mut symptoms = vec![sg::SymptomObservation {
            text: String::from("Cough"),
            severity: rng.gen_range(lo..=hi)
        }];
        if rng.gen_bool(0.3) {
            symptoms.push(sg::SymptomObservation { text: String::from("Fever"), severity: rng.gen_range(1..=6) });
        }

        sg::SymptomRecord {
            age: rng.gen_range(5..80),
            gender: String::from(if rng.gen_bool(0.5) { "Female" } else { "Male" }),
            pathology: String::from(pathology),
            symptoms
        }
    }).collect()
}

fn main() -> sg::Result<()> {
    env_logger::init();

    let symptom = env::args().nth(1).unwrap_or_else(|| String::from("Cough"));
    let stats = sg::SymptomStatistics::from_records(&synthetic_records(2_000, 7));
    let mut graph = sg::FactorGraph::from_statistics(&stats)?;
    let neighbors = graph.config().smoothing_neighbors;

    graph.set_symptom(&symptom, true)?;
    graph.propagate()?;

    let table = sg::symptom_pathology_table(&mut graph, &symptom)?;
    let (lo, hi) = match sg::severity_range(&mut graph, &symptom)? {
        Some(range) => range,
        None => {
            println!("no matching records");
            return Ok(());
        }
    };

    for (pathology, p) in table.iter() {
        println!("{} (P = {:.4})", pathology, p);

        let density = sg::severity_density(&mut graph, &symptom, pathology, neighbors)?;
        for severity in lo..=hi {
            println!("  severity {:>2}: {:.4}", severity, density.pmf(severity)?);
        }
    }

    Ok(())
}
