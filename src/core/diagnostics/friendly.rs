use std::fmt;

use crate::core::domain::Diagnostic;

const CODE_EXPLANATIONS: &[(&str, &str)] = &[
    ("E0425", "This name is not defined here. Check the spelling or add the missing `use` import."),
    ("E0433", "A path could not be resolved. A module or crate is probably missing a `use` statement."),
    ("E0412", "This type is unknown. Import it or check that it is spelled correctly."),
    ("E0308", "The value has a different type than expected. Convert it or change the declared type."),
    ("E0382", "A value was used after it was moved. Clone it or borrow it with `&` instead."),
    ("E0499", "The same value is borrowed mutably twice at once. Finish using the first borrow before taking another."),
    ("E0502", "A value is borrowed mutably while it is also borrowed immutably. Split the borrows or copy the value out first."),
    ("E0384", "A variable is assigned twice but was not declared `mut`."),
    ("E0277", "A required trait is not implemented for this type. Add the trait bound or implement the trait."),
    ("E0599", "This method does not exist for the type. Check the type or import the trait that provides it."),
    ("E0106", "A reference is missing a lifetime. Add a lifetime parameter or return an owned value."),
    ("WASM_SIZE", "The compiled contract is too big to deploy. Trim dependencies and code size."),
    ("INIT_GAS", "Deploying this contract would run out of gas during initialization."),
    ("STORAGE_LAYOUT", "The contract storage is declared in a way the chain cannot lay out."),
    ("ENTRYPOINT", "The contract has no `#[entrypoint]`, so nothing can be called after deployment."),
];

/// Plain-language explanation for a record, falling back to its raw message.
pub fn to_user_friendly_message(diagnostic: &Diagnostic) -> String {
    if let Some(code) = &diagnostic.code {
        if let Some((_, explanation)) = CODE_EXPLANATIONS.iter().find(|(c, _)| c == code) {
            return explanation.to_string();
        }
    }

    let message = diagnostic.message.as_str();
    if message.contains("cannot find") {
        "Something you referenced does not exist in this scope. Check for typos or a missing import."
            .to_string()
    } else if message.contains("mismatched types") {
        "The types do not match. Check what the function expects and what you passed.".to_string()
    } else if message.contains("borrow") {
        "Ownership rules were violated. Look at how the value is borrowed and moved.".to_string()
    } else if message.contains("trait") {
        "A trait requirement is not satisfied. Implement the trait or add the bound.".to_string()
    } else {
        diagnostic.message.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    NameResolution,
    TypeError,
    BorrowChecker,
    TraitError,
    SizeLimit,
    GasLimit,
    StorageError,
    Other,
}

impl DiagnosticCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCategory::NameResolution => "name-resolution",
            DiagnosticCategory::TypeError => "type-error",
            DiagnosticCategory::BorrowChecker => "borrow-checker",
            DiagnosticCategory::TraitError => "trait-error",
            DiagnosticCategory::SizeLimit => "size-limit",
            DiagnosticCategory::GasLimit => "gas-limit",
            DiagnosticCategory::StorageError => "storage-error",
            DiagnosticCategory::Other => "other",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucket for analytics.
pub fn categorize(diagnostic: &Diagnostic) -> DiagnosticCategory {
    let by_code = diagnostic.code.as_deref().and_then(|code| match code {
        "E0425" | "E0433" | "E0412" | "E0432" => Some(DiagnosticCategory::NameResolution),
        "E0308" | "E0061" => Some(DiagnosticCategory::TypeError),
        "E0382" | "E0499" | "E0502" | "E0505" | "E0506" | "E0597" | "E0384" => {
            Some(DiagnosticCategory::BorrowChecker)
        }
        "E0277" | "E0599" => Some(DiagnosticCategory::TraitError),
        "WASM_SIZE" => Some(DiagnosticCategory::SizeLimit),
        "INIT_GAS" => Some(DiagnosticCategory::GasLimit),
        "STORAGE_LAYOUT" => Some(DiagnosticCategory::StorageError),
        _ => None,
    });
    if let Some(category) = by_code {
        return category;
    }

    let message = diagnostic.message.to_lowercase();
    if message.contains("cannot find") || message.contains("unresolved") {
        DiagnosticCategory::NameResolution
    } else if message.contains("mismatched types") {
        DiagnosticCategory::TypeError
    } else if message.contains("borrow") || message.contains("moved") {
        DiagnosticCategory::BorrowChecker
    } else if message.contains("trait") {
        DiagnosticCategory::TraitError
    } else if message.contains("size") || message.contains("too large") {
        DiagnosticCategory::SizeLimit
    } else if message.contains("gas") {
        DiagnosticCategory::GasLimit
    } else if message.contains("storage") {
        DiagnosticCategory::StorageError
    } else {
        DiagnosticCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Severity;

    fn diagnostic(code: Option<&str>, message: &str) -> Diagnostic {
        let mut diagnostic = Diagnostic::new(Severity::Error, message);
        diagnostic.code = code.map(str::to_string);
        diagnostic
    }

    #[test]
    fn test_known_code_wins() {
        let message =
            to_user_friendly_message(&diagnostic(Some("E0382"), "borrow of moved value: `v`"));

        assert!(message.starts_with("A value was used after it was moved"));
    }

    #[test]
    fn test_message_fallbacks() {
        assert!(
            to_user_friendly_message(&diagnostic(None, "cannot find function `foo`"))
                .contains("does not exist")
        );
        assert!(
            to_user_friendly_message(&diagnostic(Some("E9999"), "mismatched types"))
                .contains("types do not match")
        );
        assert!(
            to_user_friendly_message(&diagnostic(None, "cannot borrow `x` as mutable"))
                .contains("Ownership")
        );
        assert!(
            to_user_friendly_message(&diagnostic(None, "the trait bound `T: Copy` is not satisfied"))
                .contains("trait requirement")
        );
    }

    #[test]
    fn test_raw_message_is_kept() {
        let raw = "expected one of `;` or `}`, found `let`";

        assert_eq!(to_user_friendly_message(&diagnostic(None, raw)), raw);
    }

    #[test]
    fn test_categorize() {
        let cases = [
            (Some("E0425"), "cannot find value", DiagnosticCategory::NameResolution),
            (Some("E0308"), "mismatched types", DiagnosticCategory::TypeError),
            (Some("E0502"), "cannot borrow", DiagnosticCategory::BorrowChecker),
            (Some("E0277"), "trait bound", DiagnosticCategory::TraitError),
            (Some("WASM_SIZE"), "too big", DiagnosticCategory::SizeLimit),
            (None, "initialization ran out of gas", DiagnosticCategory::GasLimit),
            (None, "invalid storage slot", DiagnosticCategory::StorageError),
            (None, "expected `;`", DiagnosticCategory::Other),
        ];

        for (code, message, expected) in cases {
            assert_eq!(categorize(&diagnostic(code, message)), expected, "{}", message);
        }
    }
}
