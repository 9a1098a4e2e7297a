use crate::types::{RecordSet, Value};

/// Destination table for the vaccine-to-disease relation.
pub const BRIDGE_TABLE: &str = "vaccine_disease_bridge";

/// Column names of the bridge relation.
pub const BRIDGE_COLUMNS: [&str; 2] = ["vaccine_code", "target_disease_code"];

/// Which diseases each antigen code immunizes against. A vaccine may target
/// several diseases and a disease may be covered by several vaccines.
const VACCINE_DISEASE_PAIRS: [(&str, &str); 19] = [
    ("DTPCV1", "DIPHTHERIA"),
    ("DTPCV1", "PERTUSSIS"),
    ("DTPCV1", "TTETANUS"),
    ("DTPCV3", "DIPHTHERIA"),
    ("DTPCV3", "PERTUSSIS"),
    ("DTPCV3", "TTETANUS"),
    ("DIPHCV4", "DIPHTHERIA"),
    ("DIPHCV5", "DIPHTHERIA"),
    ("DIPHCV6", "DIPHTHERIA"),
    ("MCV1", "MEASLES"),
    ("MCV2", "MEASLES"),
    ("RCV1", "RUBELLA"),
    ("RCV1", "CRS"),
    ("MUMPS", "MUMPS"),
    ("POL3", "POLIO"),
    ("IPV1", "POLIO"),
    ("YFV", "YFEVER"),
    ("JAPENC", "JAPENC"),
    ("MEN_A", "INVASIVE_MENING"),
];

/// Builds the bridge relation. The content is fixed, so every run produces
/// the same record set regardless of which source files are present.
pub fn bridge_record_set() -> RecordSet {
    let columns = BRIDGE_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows = VACCINE_DISEASE_PAIRS
        .iter()
        .map(|(vaccine, disease)| {
            vec![
                Value::Text((*vaccine).to_string()),
                Value::Text((*disease).to_string()),
            ]
        })
        .collect();
    RecordSet::from_parts(columns, rows)
}
