//! Text rendering of trace events, one line per event.
//!
//! This is the log sink: the engine knows nothing about what happens to
//! these lines.

use trellis_core::TraceEvent;

/// Human-readable line for one event, mirroring the solver log format.
pub fn event_line(event: &TraceEvent) -> String {
    match event {
        TraceEvent::Enter {
            node,
            depth,
            assigned,
            ..
        } => format!("enter node={} depth={} assigned={}", node, depth, assigned),
        TraceEvent::Try {
            node, pos, value, ..
        } => format!("try {} = {} (node {})", pos, value, node),
        TraceEvent::Deadend {
            pos, value, wiped, ..
        } => format!("deadend on {}={} (wiped {})", pos, value, wiped),
        TraceEvent::Backtrack {
            pos,
            value: Some(value),
            ..
        } => format!("backtrack {} from {}", pos, value),
        TraceEvent::Backtrack {
            pos, value: None, ..
        } => format!("backtrack {} exhausted", pos),
        TraceEvent::Solution { nodes_visited, .. } => {
            format!("SOLUTION found after {} nodes", nodes_visited)
        }
        TraceEvent::Done {
            nodes_visited,
            outcome,
        } => format!("SEARCH DONE nodes={} outcome={}", nodes_visited, outcome),
    }
}

/// One JSON object per event, for machine consumers.
pub fn event_json(event: &TraceEvent) -> String {
    serde_json::to_string(event).expect("trace events serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Outcome, Pos};

    #[test]
    fn test_event_line_formats() {
        let enter = TraceEvent::Enter {
            node: 3,
            depth: 2,
            version: 9,
            assigned: 7,
        };
        assert_eq!(event_line(&enter), "enter node=3 depth=2 assigned=7");

        let try_ = TraceEvent::Try {
            node: 3,
            depth: 2,
            version: 9,
            pos: Pos::new(0, 4),
            value: 6,
        };
        assert_eq!(event_line(&try_), "try (1,5) = 6 (node 3)");

        let done = TraceEvent::Done {
            nodes_visited: 41,
            outcome: Outcome::Unsatisfiable,
        };
        assert_eq!(event_line(&done), "SEARCH DONE nodes=41 outcome=unsatisfiable");
    }

    #[test]
    fn test_event_json_is_tagged() {
        let done = TraceEvent::Done {
            nodes_visited: 1,
            outcome: Outcome::Solved,
        };
        assert!(event_json(&done).contains("\"type\":\"done\""));
    }
}
