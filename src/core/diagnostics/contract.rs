//! Fixed messages the Stylus contract toolchain prints for WebAssembly
//! deployment problems. This is a lookup table, not a grammar: each entry
//! fires at most once when its needle appears in the output. Quoted source
//! (snippet gutter lines) is never searched.

use crate::core::diagnostics::parser::is_snippet_line;
use crate::core::domain::{Diagnostic, Severity};

struct ContractRule {
    needles: &'static [&'static str],
    code: &'static str,
    message: &'static str,
    suggestion: &'static str,
}

const CONTRACT_RULES: &[ContractRule] = &[
    ContractRule {
        needles: &["exceeds max", "too large", "max code size"],
        code: "WASM_SIZE",
        message: "Compiled contract exceeds the maximum deployable size (24KB compressed)",
        suggestion: "Remove unused dependencies, avoid std formatting and large generic code, \
            and keep the release profile size-optimized",
    },
    ContractRule {
        needles: &["gas limit", "out of gas", "exceeds block gas"],
        code: "INIT_GAS",
        message: "Contract initialization exceeds the gas ceiling",
        suggestion: "Move expensive setup out of the constructor and initialize storage lazily",
    },
    ContractRule {
        needles: &["storage layout", "invalid storage"],
        code: "STORAGE_LAYOUT",
        message: "Invalid persistent storage layout",
        suggestion: "Declare state with `sol_storage!` or `#[storage]` using Storage* field types \
            such as StorageU256 and StorageMap",
    },
    ContractRule {
        needles: &["missing entrypoint", "no entrypoint", "no #[entrypoint]"],
        code: "ENTRYPOINT",
        message: "Contract is missing the required `#[entrypoint]` attribute",
        suggestion: "Mark the main storage struct with `#[entrypoint]` and expose its methods \
            through `#[public]`",
    },
];

/// Scans raw toolchain output for known contract deployment problems and
/// returns one pre-authored record per problem, ordered by first occurrence.
pub fn parse_contract_diagnostics(output: &str) -> Vec<Diagnostic> {
    let haystack = output
        .lines()
        .filter(|line| !is_snippet_line(line))
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n");

    let mut hits: Vec<(usize, &ContractRule)> = CONTRACT_RULES
        .iter()
        .filter_map(|rule| {
            rule.needles
                .iter()
                .filter_map(|needle| haystack.find(needle))
                .min()
                .map(|position| (position, rule))
        })
        .collect();
    hits.sort_by_key(|(position, _)| *position);

    hits.into_iter()
        .map(|(_, rule)| Diagnostic {
            severity: Severity::Error,
            code: Some(rule.code.to_string()),
            message: rule.message.to_string(),
            location: None,
            snippet: None,
            suggestion: Some(rule.suggestion.to_string()),
        })
        .collect()
}
