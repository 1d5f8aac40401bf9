//! Keyword lexicon for structuring notes.
//!
//! Matching is plain case-insensitive substring search over the note, so a
//! term is found wherever one of its spellings appears. Each category keeps
//! lexicon order in the resulting record.

use super::record::StructuredRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Value recorded for a vital sign that is mentioned without a reading.
pub const UNSPECIFIED_VALUE: &str = "mencionada, valor não especificado";

/// Vital sign name used for blood pressure.
pub const BLOOD_PRESSURE: &str = "pressão arterial";

/// Vital sign name used for body temperature.
pub const TEMPERATURE: &str = "temperatura";

#[allow(clippy::expect_used)]
static BLOOD_PRESSURE_READING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"press[aã]o[^0-9]{0,30}(\d{2,3})\s*(?:/|x|por)\s*(\d{1,3})")
        .expect("blood pressure pattern is valid")
});

#[allow(clippy::expect_used)]
static TEMPERATURE_READING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"temperatura[^0-9]{0,20}(\d{2}(?:[.,]\d)?)")
        .expect("temperature pattern is valid")
});

/// A term and the spellings that match it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// The label written to the record.
    pub label: String,
    /// Lowercase spellings to search for.
    pub spellings: Vec<String>,
}

impl Term {
    /// Creates a term matched by its own label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            spellings: vec![label.to_lowercase()],
            label,
        }
    }

    /// Adds another spelling, such as the unaccented form.
    #[must_use]
    pub fn or(mut self, spelling: impl Into<String>) -> Self {
        self.spellings.push(spelling.into().to_lowercase());
        self
    }

    /// Returns true if any spelling occurs in `lowered`.
    #[must_use]
    pub fn matches(&self, lowered: &str) -> bool {
        self.spellings.iter().any(|s| lowered.contains(s.as_str()))
    }
}

/// Terms known to the structure stage, per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    /// Symptom terms.
    pub symptoms: Vec<Term>,
    /// Diagnosis terms.
    pub diagnoses: Vec<Term>,
    /// Medication terms.
    pub medications: Vec<Term>,
    /// Procedure terms.
    pub procedures: Vec<Term>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::portuguese()
    }
}

impl Lexicon {
    /// The built-in Portuguese clinical vocabulary.
    #[must_use]
    pub fn portuguese() -> Self {
        Self {
            symptoms: vec![
                Term::new("dor"),
                Term::new("febre"),
                Term::new("tosse"),
                Term::new("náusea").or("nausea"),
                Term::new("tontura"),
            ],
            diagnoses: vec![
                Term::new("diabetes"),
                Term::new("hipertensão").or("hipertensao"),
                Term::new("asma"),
            ],
            medications: vec![
                Term::new("insulina"),
                Term::new("dipirona"),
                Term::new("paracetamol"),
                Term::new("metformina"),
            ],
            procedures: vec![
                Term::new("cirurgia"),
                Term::new("eletrocardiograma"),
                Term::new("raio-x").or("raio x"),
            ],
        }
    }

    /// Extracts a structured record from a note.
    #[must_use]
    pub fn extract(&self, note: &str) -> StructuredRecord {
        let lowered = note.to_lowercase();
        let mut record = StructuredRecord::for_note(note);

        record.symptoms = matching(&self.symptoms, &lowered);
        record.diagnoses = matching(&self.diagnoses, &lowered);
        record.medications = matching(&self.medications, &lowered);
        record.procedures = matching(&self.procedures, &lowered);

        if lowered.contains("pressão") || lowered.contains("pressao") {
            let value = BLOOD_PRESSURE_READING
                .captures(&lowered)
                .map_or_else(|| UNSPECIFIED_VALUE.to_string(), |c| format!("{}/{}", &c[1], &c[2]));
            record.vital_signs.insert(BLOOD_PRESSURE.to_string(), value);
        }

        if lowered.contains(TEMPERATURE) {
            let value = TEMPERATURE_READING.captures(&lowered).map_or_else(
                || UNSPECIFIED_VALUE.to_string(),
                |c| format!("{} °C", c[1].replace(',', ".")),
            );
            record.vital_signs.insert(TEMPERATURE.to_string(), value);
        }

        record
    }
}

fn matching(terms: &[Term], lowered: &str) -> Vec<String> {
    terms
        .iter()
        .filter(|t| t.matches(lowered))
        .map(|t| t.label.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symptoms_in_lexicon_order() {
        let record = Lexicon::default().extract("Paciente com febre e dor de cabeça");
        assert_eq!(record.symptoms, vec!["dor", "febre"]);
        assert_eq!(record.notes, "Paciente com febre e dor de cabeça");
    }

    #[test]
    fn test_case_insensitive() {
        let record = Lexicon::default().extract("FEBRE alta, DIABETES tipo 2, usa Insulina");
        assert_eq!(record.symptoms, vec!["febre"]);
        assert_eq!(record.diagnoses, vec!["diabetes"]);
        assert_eq!(record.medications, vec!["insulina"]);
    }

    #[test]
    fn test_unaccented_spelling() {
        let record = Lexicon::default().extract("historico de hipertensao e nausea");
        assert_eq!(record.diagnoses, vec!["hipertensão"]);
        assert_eq!(record.symptoms, vec!["náusea"]);
    }

    #[test]
    fn test_pressure_without_reading() {
        let record = Lexicon::default().extract("verificar a pressão amanhã");
        assert_eq!(
            record.vital_signs.get(BLOOD_PRESSURE).map(String::as_str),
            Some(UNSPECIFIED_VALUE)
        );
    }

    #[test]
    fn test_pressure_with_reading() {
        let lexicon = Lexicon::default();
        let slash = lexicon.extract("Pressao arterial de 120/80 hoje");
        assert_eq!(slash.vital_signs[BLOOD_PRESSURE], "120/80");

        let spoken = lexicon.extract("pressão 12 por 8");
        assert_eq!(spoken.vital_signs[BLOOD_PRESSURE], "12/8");
    }

    #[test]
    fn test_temperature() {
        let lexicon = Lexicon::default();
        let read = lexicon.extract("temperatura de 38,5 graus");
        assert_eq!(read.vital_signs[TEMPERATURE], "38.5 °C");

        let unread = lexicon.extract("medir temperatura");
        assert_eq!(unread.vital_signs[TEMPERATURE], UNSPECIFIED_VALUE);
    }

    #[test]
    fn test_nothing_found() {
        let record = Lexicon::default().extract("consulta de rotina");
        assert!(record.is_empty());
    }

    #[test]
    fn test_procedures() {
        let record = Lexicon::default().extract("solicitar raio x e eletrocardiograma");
        assert_eq!(record.procedures, vec!["eletrocardiograma", "raio-x"]);
    }
}
