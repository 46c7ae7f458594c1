//! Frequency statistics over symptom records.
//!
//! A `SymptomStatistics` holds the sufficient statistics the factor graph is built from: the
//! distinct values of every variable and the joint counts behind the age/gender/pathology and
//! pathology/symptom/severity potentials.

use crate::util::Result;

use log::debug;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;


/// A symptom reported in a record, with its severity score
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomObservation {
    pub text: String,
    #[serde(default)]
    pub severity: i64
}

/// One synthetic patient presentation: who the patient is, what they were diagnosed with and
/// which symptoms they reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub age: i64,
    pub gender: String,
    pub pathology: String,
    #[serde(default)]
    pub symptoms: Vec<SymptomObservation>
}

impl SymptomRecord {

    /// The severity of `symptom` in this record, or `None` if it was not reported. A symptom
    /// reported more than once counts with its first severity.
    pub fn severity_of(&self, symptom: &str) -> Option<i64> {
        self.symptoms.iter().find(|s| s.text == symptom).map(|s| s.severity)
    }
}

/// Read a JSON array of `SymptomRecord`s
pub fn read_records<R: Read>(reader: R) -> Result<Vec<SymptomRecord>> {
    Ok(serde_json::from_reader(reader)?)
}


/// Key of the age/gender/pathology counts
pub type AgpKey = (i64, String, String);

/// Key of the per-symptom counts: (pathology, symptom present, severity)
pub type PssKey = (String, bool, i64);


/// Distinct values and joint frequency tables of a record collection.
///
/// All value lists are sorted, so two collections with the same records always produce the same
/// statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymptomStatistics {

    /// Distinct patient genders
    pub genders: Vec<String>,

    /// Distinct pathologies
    pub pathologies: Vec<String>,

    /// Distinct symptoms
    pub symptoms: Vec<String>,

    /// Distinct severities of each symptom. Always contains 0, the severity of an absent symptom.
    pub severities: BTreeMap<String, Vec<i64>>,

    /// Number of records for each (age, gender, pathology)
    pub age_gender_pathology: BTreeMap<AgpKey, u64>,

    /// For each symptom, number of records for each (pathology, present, severity). A record
    /// without the symptom counts as (pathology, false, 0).
    pub pathology_symptom_severity: BTreeMap<String, BTreeMap<PssKey, u64>>

}

impl SymptomStatistics {

    /// Aggregate the statistics of a record collection
    pub fn from_records(records: &[SymptomRecord]) -> Self {
        let genders: BTreeSet<&str> = records.iter().map(|r| r.gender.as_str()).collect();
        let pathologies: BTreeSet<&str> = records.iter().map(|r| r.pathology.as_str()).collect();
        let symptoms: BTreeSet<&str> = records.iter()
                                              .flat_map(|r| r.symptoms.iter())
                                              .map(|s| s.text.as_str())
                                              .collect();

        let mut age_gender_pathology = BTreeMap::new();
        for r in records {
            *age_gender_pathology.entry((r.age, r.gender.clone(), r.pathology.clone()))
                                 .or_insert(0) += 1;
        }

        let mut severities = BTreeMap::new();
        let mut pathology_symptom_severity = BTreeMap::new();
        for &symptom in symptoms.iter() {
            let mut observed = BTreeSet::new();
            observed.insert(0);

            let mut counts = BTreeMap::new();
            for r in records {
                let key = match r.severity_of(symptom) {
                    Some(severity) => {
                        observed.insert(severity);
                        (r.pathology.clone(), true, severity)
                    },
                    None => (r.pathology.clone(), false, 0)
                };
                *counts.entry(key).or_insert(0) += 1;
            }

            severities.insert(String::from(symptom), observed.into_iter().collect());
            pathology_symptom_severity.insert(String::from(symptom), counts);
        }

        debug!(
            "aggregated {} records: {} genders, {} pathologies, {} symptoms",
            records.len(), genders.len(), pathologies.len(), symptoms.len()
        );

        SymptomStatistics {
            genders: genders.into_iter().map(String::from).collect(),
            pathologies: pathologies.into_iter().map(String::from).collect(),
            symptoms: symptoms.into_iter().map(String::from).collect(),
            severities,
            age_gender_pathology,
            pathology_symptom_severity
        }
    }

    /// Total number of records behind the statistics
    pub fn record_count(&self) -> u64 {
        self.age_gender_pathology.values().sum()
    }

    /// The distinct severities of `symptom`
    pub fn severities_of(&self, symptom: &str) -> Option<&[i64]> {
        self.severities.get(symptom).map(|v| v.as_slice())
    }

    /// The (pathology, present, severity) counts of `symptom`
    pub fn symptom_counts(&self, symptom: &str) -> Option<&BTreeMap<PssKey, u64>> {
        self.pathology_symptom_severity.get(symptom)
    }
}
