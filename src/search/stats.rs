use log::info;

/// Counters aggregated during a search and reported on the diagnostic
/// stream when it ends.
#[derive(Default, Debug, Clone, Copy)]
pub struct SearchStats {
    pub nodes: u64,
    pub hash_probes: u64,
    pub hash_hits: u64,
    pub hash_score_cuts: u64,
    pub hash_move_attempts: u64,
    pub hash_move_cuts: u64,
    pub fail_highs: u64,
    pub first_fail_highs: u64,
    pub qs_nodes: u64,
    pub qs_fail_highs: u64,
    pub qs_first_fail_highs: u64,
}

fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator * 10_000 / denominator) as f64 / 100.0
}

impl SearchStats {
    pub fn reset(&mut self) {
        *self = SearchStats::default();
    }

    pub fn log_summary(&self) {
        info!(
            "hash hitrate: {:.2}% of {} probes",
            percentage(self.hash_hits, self.hash_probes),
            self.hash_probes
        );
        info!(
            "hash score cut rate: {:.2}% of {} hash hits",
            percentage(self.hash_score_cuts, self.hash_hits),
            self.hash_hits
        );
        info!(
            "hash move cut rate: {:.2}% of {} hash moves",
            percentage(self.hash_move_cuts, self.hash_move_attempts),
            self.hash_move_attempts
        );
        info!(
            "first fail high rate: {:.2}% of {} fail highs",
            percentage(self.first_fail_highs, self.fail_highs),
            self.fail_highs
        );
        info!(
            "qs nodes: {} ({:.2}% of all nodes)",
            self.qs_nodes,
            percentage(self.qs_nodes, self.nodes)
        );
        info!(
            "qs first fail high rate: {:.2}% of {} qs fail highs",
            percentage(self.qs_first_fail_highs, self.qs_fail_highs),
            self.qs_fail_highs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_truncated_to_hundredths() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }
}
