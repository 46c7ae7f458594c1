//! Tabulated answers read off the marginals of an inferred `FactorGraph`.
//!
//! Every query expects `sum_product` to have run on the graph with the evidence of interest
//! clamped, and computes the marginals it needs itself.

use crate::graph::{pss_name, FactorGraph, PATHOLOGY};
use crate::smoothing::KnnDensity;
use crate::util::{GraphError, Result};
use crate::variable::Value;

use indexmap::IndexMap;
use itertools::Itertools;

use std::cmp::Ordering;


fn descending(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
}

/// The posterior probability of every pathology, most probable first.
///
/// Pathologies with zero (or non-finite) probability are left out, so an empty ranking means no
/// record matches the evidence.
///
/// # Errors
/// * `GraphError::NotReady` if inference has not run
pub fn pathology_ranking(graph: &mut FactorGraph) -> Result<Vec<(String, f64)>> {
    graph.compute_marginals(PATHOLOGY)?;
    let pathology = graph.variable(PATHOLOGY)?;

    let mut ranking = Vec::new();
    for value in pathology.values().iter() {
        let p = pathology.marginal_pmf(value)?;
        if p.is_finite() && p > 0.0 {
            ranking.push((value.to_string(), p));
        }
    }

    ranking.sort_by(descending);
    Ok(ranking)
}

/// The (symptom present, severity, weight) rows of a symptom's joint marginal for each pathology
fn present_rows(graph: &mut FactorGraph, symptom: &str) -> Result<Vec<(String, i64, f64)>> {
    let pss = pss_name(symptom);
    graph.compute_marginals(&pss)?;

    let rows = graph.factor(&pss)?.marginal_table()?;
    let total: f64 = rows.iter().map(|(_, w)| w).sum();

    let mut present = Vec::new();
    for (assignment, w) in rows {
        if let [Value::Text(ref p), Value::Bool(true), Value::Int(s)] = assignment[..] {
            let w = if total > 0.0 { w / total } else { 0.0 };
            present.push((p.clone(), s, w));
        }
    }

    Ok(present)
}

/// The probability of each pathology jointly with `symptom` being present, renormalized over
/// pathologies and sorted most probable first. Empty if the symptom has no weight.
///
/// # Errors
/// * `GraphError::UnknownNode` if `symptom` is not in the graph
/// * `GraphError::NotReady` if inference has not run
pub fn symptom_pathology_table(graph: &mut FactorGraph, symptom: &str) -> Result<Vec<(String, f64)>> {
    let mut by_pathology: IndexMap<String, f64> = IndexMap::new();
    for (p, _, w) in present_rows(graph, symptom)? {
        *by_pathology.entry(p).or_insert(0.0) += w;
    }

    let total: f64 = by_pathology.values().sum();
    if total <= 0.0 {
        return Ok(Vec::new());
    }

    let mut table: Vec<(String, f64)> = by_pathology.into_iter()
                                                    .map(|(p, w)| (p, w / total))
                                                    .collect();
    table.sort_by(descending);
    Ok(table)
}

/// The lowest and highest severity of `symptom` that carry weight when it is present, if any.
pub fn severity_range(graph: &mut FactorGraph, symptom: &str) -> Result<Option<(i64, i64)>> {
    let range = present_rows(graph, symptom)?.into_iter()
                                             .filter(|&(_, _, w)| w > 0.0)
                                             .map(|(_, s, _)| s)
                                             .minmax()
                                             .into_option();
    Ok(range)
}

/// Smooth the severity weights of `symptom` under `pathology` into a density.
///
/// # Args
/// * `neighbors`: the neighbor count, capped at the number of severities
///
/// # Errors
/// * `GraphError::InvalidValue` if `pathology` is not a pathology of the graph, or any error of
///   `KnnDensity::fit`
/// * `GraphError::NotReady` if inference has not run
pub fn severity_density(
    graph: &mut FactorGraph,
    symptom: &str,
    pathology: &str,
    neighbors: usize,
) -> Result<KnnDensity> {
    if ! graph.variable(PATHOLOGY)?.values().contains(&Value::from(pathology)) {
        return Err(GraphError::invalid(format!("unknown pathology {}", pathology)));
    }

    let (x, y): (Vec<i64>, Vec<f64>) = present_rows(graph, symptom)?
        .into_iter()
        .filter(|(p, _, _)| p == pathology)
        .map(|(_, s, w)| (s, w))
        .unzip();

    let mut density = KnnDensity::new(neighbors.min(x.len()));
    density.fit(&x, &y)?;
    Ok(density)
}
