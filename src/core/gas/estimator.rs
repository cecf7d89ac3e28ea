use itertools::Itertools;

use crate::core::domain::{GasProfile, OperationCategory, OperationCost};
use crate::core::gas::opcodes::{InstructionSource, OpcodeCosts, SizeHeuristic, categorize_opcode};

/// 0.1 gwei, expressed in wei.
pub const GAS_PRICE_WEI: u128 = 100_000_000;
pub const WEI_PER_ETH: f64 = 1e18;
pub const ETH_PRICE_USD: f64 = 3_000.0;

pub const HIGH_GAS_CEILING: u64 = 100_000;
const HOT_OPERATION_COUNT: u64 = 10;

pub const ECOSYSTEM_TIP: &str = "Prefer stylus-sdk storage types (StorageMap, StorageVec) and \
    cache storage reads in local variables; Rust on Stylus makes computation cheap, so spend \
    effort on reducing storage access.";

/// Advisory gas estimate. The figures come from a heuristic instruction
/// stream and are not an upper bound on real execution cost.
#[derive(Debug, Default)]
pub struct GasEstimator<S = SizeHeuristic> {
    source: S,
    costs: OpcodeCosts,
}

impl GasEstimator<SizeHeuristic> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: InstructionSource> GasEstimator<S> {
    pub fn with_source(source: S, costs: OpcodeCosts) -> Self {
        GasEstimator { source, costs }
    }

    #[tracing::instrument(skip(artifact), fields(size = artifact.len()))]
    pub fn estimate(&self, artifact: &[u8]) -> GasProfile {
        let instructions = self.source.instructions(artifact);
        let total_gas_units: u64 = instructions.iter().map(|op| self.costs.cost(op)).sum();

        let operations: Vec<OperationCost> = instructions
            .iter()
            .counts()
            .into_iter()
            .map(|(name, count)| {
                let count = count as u64;
                let gas_used = self.costs.cost(name) * count;
                OperationCost {
                    name: name.to_string(),
                    gas_used,
                    percentage_of_total: percentage(gas_used, total_gas_units),
                    occurrence_count: count,
                    category: categorize_opcode(name),
                }
            })
            .sorted_by(|a, b| b.gas_used.cmp(&a.gas_used).then_with(|| a.name.cmp(&b.name)))
            .collect();

        let estimated_cost_eth = (total_gas_units as u128 * GAS_PRICE_WEI) as f64 / WEI_PER_ETH;
        let optimization_suggestions = suggestions(&operations, total_gas_units);

        tracing::debug!(
            "Estimated {} gas over {} distinct operations",
            total_gas_units,
            operations.len()
        );

        GasProfile {
            total_gas_units,
            operations,
            estimated_cost_eth,
            estimated_cost_usd: estimated_cost_eth * ETH_PRICE_USD,
            optimization_suggestions,
        }
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn category_gas(operations: &[OperationCost], category: OperationCategory) -> u64 {
    operations
        .iter()
        .filter(|op| op.category == category)
        .map(|op| op.gas_used)
        .sum()
}

fn suggestions(operations: &[OperationCost], total: u64) -> Vec<String> {
    let mut suggestions = Vec::new();

    if percentage(category_gas(operations, OperationCategory::Storage), total) > 50.0 {
        suggestions.push(
            "Storage dominates the cost: batch storage writes and keep intermediate values in memory."
                .to_string(),
        );
    }

    if let Some(hot) = operations
        .iter()
        .filter(|op| op.occurrence_count > HOT_OPERATION_COUNT)
        .max_by_key(|op| op.occurrence_count)
    {
        suggestions.push(format!(
            "`{}` runs {} times: cache repeated results and tighten loops.",
            hot.name, hot.occurrence_count
        ));
    }

    if percentage(category_gas(operations, OperationCategory::Call), total) > 30.0 {
        suggestions.push(
            "Calls are expensive here: inline small helpers and reduce call depth.".to_string(),
        );
    }

    if total > HIGH_GAS_CEILING {
        suggestions.push(
            "Total gas is high: pack related fields into a single storage slot and use bit \
             manipulation for flags."
                .to_string(),
        );
    }

    if operations
        .iter()
        .any(|op| op.name.contains("div") || op.name.contains("rem"))
    {
        suggestions.push(
            "Division detected: use bit shifts when dividing by powers of two.".to_string(),
        );
    }

    suggestions.push(ECOSYSTEM_TIP.to_string());
    suggestions
}
