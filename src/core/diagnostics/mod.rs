pub mod contract;
pub mod friendly;
pub mod parser;
pub mod position;

pub use contract::parse_contract_diagnostics;
pub use friendly::{DiagnosticCategory, categorize, to_user_friendly_message};
pub use parser::{format_for_display, parse_diagnostics};
pub use position::{
    EditorPosition, ToolchainPosition, translate_editor_to_toolchain,
    translate_toolchain_to_editor,
};
