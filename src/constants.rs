use crate::types::RoutingEntry;

/// Fixed routing from source file to destination table. The batch walks
/// this list in order.
pub const ROUTING_TABLE: [RoutingEntry; 5] = [
    RoutingEntry {
        name: "coverage",
        source_file: "coverage-data.xlsx",
        table: "vaccination_coverage",
    },
    RoutingEntry {
        name: "incidence",
        source_file: "incidence-rate-data.xlsx",
        table: "disease_incidence",
    },
    RoutingEntry {
        name: "cases",
        source_file: "reported-cases-data.xlsx",
        table: "reported_cases",
    },
    RoutingEntry {
        name: "introduction",
        source_file: "vaccine-introduction-data.xlsx",
        table: "vaccine_introduction",
    },
    RoutingEntry {
        name: "schedule",
        source_file: "vaccine-schedule-data.xlsx",
        table: "vaccine_schedule",
    },
];

/// Columns coerced to numeric form wherever they appear. `year` is listed
/// first so row drops under the null-preserving policy happen before the
/// remaining columns are converted.
pub const NUMERIC_COLUMNS: [&str; 7] = [
    "year",
    "coverage",
    "cases",
    "incidence_rate",
    "target_number",
    "doses",
    "schedulerounds",
];

/// The column whose null cells disqualify a whole row under the
/// null-preserving policy.
pub const REQUIRED_YEAR_COLUMN: &str = "year";

/// Looks up a routing entry by its short handle.
pub fn entry_by_name(name: &str) -> Option<&'static RoutingEntry> {
    ROUTING_TABLE.iter().find(|entry| entry.name == name)
}

/// Short handles accepted by the `--sources` filter.
pub fn supported_sources() -> Vec<&'static str> {
    ROUTING_TABLE.iter().map(|entry| entry.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_covers_five_sources_with_unique_tables() {
        assert_eq!(ROUTING_TABLE.len(), 5);
        let mut tables: Vec<&str> = ROUTING_TABLE.iter().map(|e| e.table).collect();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), 5);
    }

    #[test]
    fn entry_lookup_by_handle() {
        let entry = entry_by_name("coverage").unwrap();
        assert_eq!(entry.source_file, "coverage-data.xlsx");
        assert_eq!(entry.table, "vaccination_coverage");
        assert!(entry_by_name("nope").is_none());
    }

    #[test]
    fn year_is_coerced_before_other_numeric_columns() {
        assert_eq!(NUMERIC_COLUMNS[0], REQUIRED_YEAR_COLUMN);
    }
}
