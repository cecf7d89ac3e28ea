//! Approximation layer for gas estimation.
//!
//! Nothing here decodes WebAssembly. [`SizeHeuristic`] invents an
//! instruction stream from the artifact length and [`OpcodeCosts`] prices it.
//! A real decoder would replace the [`InstructionSource`] implementation and
//! leave the estimator untouched.

use crate::core::domain::OperationCategory;

pub const CONSTRUCTOR_CALL: &str = "call";
pub const STORAGE_LOAD: &str = "storage_load";
pub const STORAGE_STORE: &str = "storage_store";
pub const EMIT_LOG: &str = "emit_log";

const MEMORY_OPS: [&str; 2] = ["memory.copy", "memory.fill"];
const ARITHMETIC_OPS: [&str; 6] = [
    "i64.add", "i64.mul", "i64.lt_u", "i64.eq", "i64.sub", "i64.div_u",
];

/// Artifacts larger than this are assumed to emit at least one event.
pub const EVENT_SIZE_THRESHOLD: usize = 500;

pub trait InstructionSource: std::fmt::Debug + Send + Sync {
    fn instructions(&self, artifact: &[u8]) -> Vec<&'static str>;
}

/// Derives a synthetic instruction stream from the artifact length only.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeHeuristic;

impl InstructionSource for SizeHeuristic {
    fn instructions(&self, artifact: &[u8]) -> Vec<&'static str> {
        let size = artifact.len();
        let mut stream = vec![CONSTRUCTOR_CALL];

        for _ in 0..size / 100 {
            stream.push(STORAGE_LOAD);
            stream.push(STORAGE_STORE);
        }
        stream.extend(MEMORY_OPS.iter().cycle().take(size / 50));
        stream.extend(ARITHMETIC_OPS.iter().cycle().take(size / 20));
        stream.extend(std::iter::repeat_n(CONSTRUCTOR_CALL, size / 200));
        if size > EVENT_SIZE_THRESHOLD {
            stream.push(EMIT_LOG);
        }

        stream
    }
}

#[derive(Clone, Debug)]
pub struct OpcodeCosts {
    table: Vec<(&'static str, u64)>,
    default_cost: u64,
}

impl Default for OpcodeCosts {
    fn default() -> Self {
        OpcodeCosts {
            table: vec![
                (STORAGE_STORE, 20_000),
                (STORAGE_LOAD, 2_100),
                (EMIT_LOG, 750),
                (CONSTRUCTOR_CALL, 700),
                ("memory.copy", 3),
                ("memory.fill", 3),
                ("memory.grow", 100),
                ("i64.add", 3),
                ("i64.sub", 3),
                ("i64.mul", 5),
                ("i64.div_u", 5),
                ("i64.lt_u", 3),
                ("i64.eq", 3),
            ],
            default_cost: 1,
        }
    }
}

impl OpcodeCosts {
    pub fn cost(&self, opcode: &str) -> u64 {
        self.table
            .iter()
            .find(|(name, _)| *name == opcode)
            .map(|(_, cost)| *cost)
            .unwrap_or(self.default_cost)
    }
}

pub fn categorize_opcode(opcode: &str) -> OperationCategory {
    if ["storage", "store", "load"].iter().any(|k| opcode.contains(k)) {
        OperationCategory::Storage
    } else if ["memory", "grow"].iter().any(|k| opcode.contains(k)) {
        OperationCategory::Memory
    } else if opcode.contains("call") {
        OperationCategory::Call
    } else if ["log", "event"].iter().any(|k| opcode.contains(k)) {
        OperationCategory::Event
    } else {
        OperationCategory::Computation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_artifact_still_calls_constructor() {
        assert_eq!(SizeHeuristic.instructions(&[]), vec![CONSTRUCTOR_CALL]);
    }

    #[test]
    fn test_stream_proportions() {
        let stream = SizeHeuristic.instructions(&[0u8; 1000]);

        let count = |name: &str| stream.iter().filter(|op| **op == name).count();
        assert_eq!(count(STORAGE_LOAD), 10);
        assert_eq!(count(STORAGE_STORE), 10);
        assert_eq!(count("memory.copy") + count("memory.fill"), 20);
        assert_eq!(count(CONSTRUCTOR_CALL), 1 + 5);
        assert_eq!(count(EMIT_LOG), 1);
        assert_eq!(stream.len(), 1 + 20 + 20 + 50 + 5 + 1);
    }

    #[test]
    fn test_no_event_at_threshold() {
        let stream = SizeHeuristic.instructions(&[0u8; EVENT_SIZE_THRESHOLD]);

        assert!(!stream.contains(&EMIT_LOG));
    }

    #[test]
    fn test_unknown_opcode_costs_default() {
        let costs = OpcodeCosts::default();

        assert_eq!(costs.cost("f32.sqrt"), 1);
        assert!(costs.cost(STORAGE_STORE) > costs.cost(CONSTRUCTOR_CALL));
        assert!(costs.cost(CONSTRUCTOR_CALL) > costs.cost("i64.add"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(categorize_opcode(STORAGE_LOAD), OperationCategory::Storage);
        assert_eq!(categorize_opcode("memory.grow"), OperationCategory::Memory);
        assert_eq!(categorize_opcode(CONSTRUCTOR_CALL), OperationCategory::Call);
        assert_eq!(categorize_opcode(EMIT_LOG), OperationCategory::Event);
        assert_eq!(categorize_opcode("i64.div_u"), OperationCategory::Computation);
    }
}
