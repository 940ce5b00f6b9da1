//! Natural-language instruction sent with the dataset.

/// Metrics the analysis focuses on
pub const METRICS_OF_INTEREST: &[&str] = &[
    "system.memory.used.percent",
    "system.cpu.percent",
    "system.network.tcp.connections",
];

/// Base instruction: focus metrics, freedom of method, and the expected report shape
pub const ANALYSIS_INSTRUCTION: &str = "\
Analyze this system metrics data for anomalies.

Focus on these metrics:
- system.memory.used.percent
- system.cpu.percent
- system.network.tcp.connections

Use any statistical or ML method you think is appropriate.

Be brief and actionable.

Reference output template (numbers will differ):

The distribution ranges from 1 to 99, a difference of 98
The average CPU Utilization(%) is 50.208
Maximum total CPU Utilization(%) of 99 was observed on 10 Nov 2025, 7:00 PM, whereas the minimum total CPU Utilization(%) of 1 was observed on 3 different hours
The total CPU Utilization(%) increased the most by 109.84% over the past 2 hours and dropped the most by 40.81% over the past 8 hours
Highest hour-over-hour increase in total CPU Utilization(%) was observed on 05 Nov 2025, 3:00 AM (6,700%) whereas hour-over-hour total CPU Utilization(%) declined the most on 01 Nov 2025, 9:00 PM by 98.96%
Total CPU Utilization(%) remained above 74.604 throughout the period from 05 Nov 2025, 10:00 AM to 05 Nov 2025, 12:00 PM
Total CPU Utilization(%) remained below 25.604 throughout the period from 03 Nov 2025, 5:00 AM to 03 Nov 2025, 7:00 AM
";

/// Instruction for a dataset with the given columns.
///
/// Appends which focus metrics the table lacks so the service does not invent them.
pub fn build_instruction(headers: &[String]) -> String {
    let missing: Vec<&str> = METRICS_OF_INTEREST
        .iter()
        .copied()
        .filter(|m| !headers.iter().any(|h| h == m))
        .collect();

    if missing.is_empty() {
        return ANALYSIS_INSTRUCTION.to_string();
    }

    format!(
        "{}\nThe following focus metrics are not present in this dataset, skip them: {}\n",
        ANALYSIS_INSTRUCTION,
        missing.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_instruction_names_all_focus_metrics() {
        for metric in METRICS_OF_INTEREST {
            assert!(ANALYSIS_INSTRUCTION.contains(metric));
        }
    }

    #[test]
    fn test_complete_dataset_uses_base_instruction() {
        let h = headers(&[
            "timestamp",
            "system.memory.used.percent",
            "system.cpu.percent",
            "system.network.tcp.connections",
        ]);
        assert_eq!(build_instruction(&h), ANALYSIS_INSTRUCTION);
    }

    #[test]
    fn test_missing_metrics_are_listed() {
        let h = headers(&["timestamp", "system.cpu.percent"]);
        let instruction = build_instruction(&h);

        assert!(instruction.starts_with(ANALYSIS_INSTRUCTION));
        assert!(instruction.contains(
            "skip them: system.memory.used.percent, system.network.tcp.connections"
        ));
    }
}
