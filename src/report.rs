// Final run summary printed to the console.
use crate::poller::PollStats;

pub struct RunSummary {
    pub elapsed_secs: f64,
    pub total_records: usize,
    pub stats: PollStats,
}

pub fn render(summary: &RunSummary) -> String {
    let speed = if summary.total_records > 0 {
        summary.elapsed_secs / summary.total_records as f64
    } else {
        0.0
    };

    let mut out = String::new();
    out.push_str("\n=== Run Summary ===\n");
    out.push_str(&format!("Total time: {:.2} s\n", summary.elapsed_secs));
    out.push_str(&format!("Valid addresses: {}\n", summary.stats.valid_addresses));
    out.push_str(&format!(
        "Records needing a check: {}\n",
        summary.stats.need_check.len()
    ));
    out.push_str(&format!("Query speed: {:.4} s/record\n", speed));

    if summary.stats.need_check.is_empty() {
        out.push_str("\nNo records need a check\n");
    } else {
        out.push_str("\n=== Names to check ===\n");
        for name in &summary.stats.need_check {
            out.push_str(&format!("- {}\n", name));
        }
    }
    out
}

pub fn print_summary(summary: &RunSummary) {
    print!("{}", render(summary));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_names_and_speed() {
        let summary = RunSummary {
            elapsed_secs: 10.0,
            total_records: 4,
            stats: PollStats {
                valid_addresses: 3,
                need_check: vec!["alice".to_string(), "bob".to_string()],
            },
        };
        let text = render(&summary);
        assert!(text.contains("Valid addresses: 3"));
        assert!(text.contains("Records needing a check: 2"));
        assert!(text.contains("- alice"));
        assert!(text.contains("- bob"));
        assert!(text.contains("2.5000 s/record"));
    }

    #[test]
    fn empty_run_renders_cleanly() {
        let summary = RunSummary {
            elapsed_secs: 0.5,
            total_records: 0,
            stats: PollStats::default(),
        };
        let text = render(&summary);
        assert!(text.contains("No records need a check"));
        assert!(text.contains("0.0000 s/record"));
    }
}
