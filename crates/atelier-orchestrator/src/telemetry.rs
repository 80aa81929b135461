//! Per-turn telemetry: timestamps, per-node timings, counters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Counters accumulated over one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnCounters {
    /// Graph nodes executed.
    pub nodes_executed: usize,
    /// Agent failures trapped by the executor.
    pub agent_errors: usize,
    /// Invariant diagnostics recorded.
    pub validation_warnings: usize,
}

/// Telemetry for one turn of the graph.
#[derive(Debug)]
pub struct TurnTelemetry {
    /// Unique turn id.
    pub turn_id: Uuid,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    start: Instant,
    node_timings: Vec<(String, Duration)>,
    /// Turn counters.
    pub counters: TurnCounters,
}

impl Default for TurnTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnTelemetry {
    /// Starts telemetry for a new turn.
    #[must_use]
    pub fn new() -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            started_at: Utc::now(),
            start: Instant::now(),
            node_timings: Vec::new(),
            counters: TurnCounters::default(),
        }
    }

    /// Times a node execution given its start instant.
    pub fn record_node(&mut self, node: &str, node_start: Instant) {
        self.node_timings.push((node.to_string(), node_start.elapsed()));
        self.counters.nodes_executed += 1;
    }

    /// Elapsed wall-clock for the whole turn so far, in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Per-node timings, in execution order.
    #[must_use]
    pub fn node_timings(&self) -> &[(String, Duration)] {
        &self.node_timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_nodes_in_order() {
        let mut telemetry = TurnTelemetry::new();
        telemetry.record_node("context_agent", Instant::now());
        telemetry.record_node("router", Instant::now());

        assert_eq!(telemetry.counters.nodes_executed, 2);
        let names: Vec<&str> =
            telemetry.node_timings().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["context_agent", "router"]);
    }

    #[test]
    fn test_turn_ids_are_unique() {
        assert_ne!(TurnTelemetry::new().turn_id, TurnTelemetry::new().turn_id);
    }

    #[test]
    fn test_elapsed_is_monotone() {
        let telemetry = TurnTelemetry::new();
        let first = telemetry.elapsed_seconds();
        let second = telemetry.elapsed_seconds();
        assert!(second >= first);
    }
}
