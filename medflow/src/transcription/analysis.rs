//! Human-readable summary of a structured record.

use super::record::StructuredRecord;

/// Renders the preliminary analysis shown to the clinician.
///
/// Each category prints its findings or a line saying none were found.
/// Procedures are listed only when present.
#[must_use]
pub fn render_analysis(record: &StructuredRecord) -> String {
    let mut out = String::from("Análise preliminar:\n");

    list_line(
        &mut out,
        &record.symptoms,
        "Sintomas identificados",
        "Nenhum sintoma claramente identificado",
    );
    list_line(
        &mut out,
        &record.diagnoses,
        "Possíveis diagnósticos",
        "Nenhum diagnóstico identificado",
    );
    list_line(
        &mut out,
        &record.medications,
        "Medicamentos mencionados",
        "Nenhum medicamento mencionado",
    );
    if !record.procedures.is_empty() {
        out.push_str(&format!(
            "- Procedimentos mencionados: {}\n",
            record.procedures.join(", ")
        ));
    }

    if record.vital_signs.is_empty() {
        out.push_str("- Nenhum sinal vital mencionado\n");
    } else {
        out.push_str("- Sinais vitais mencionados: ");
        for (sign, value) in &record.vital_signs {
            out.push_str(&format!("{sign}: {value}; "));
        }
        out.push('\n');
    }

    out
}

fn list_line(out: &mut String, items: &[String], heading: &str, none: &str) {
    if items.is_empty() {
        out.push_str(&format!("- {none}\n"));
    } else {
        out.push_str(&format!("- {heading}: {}\n", items.join(", ")));
    }
}
