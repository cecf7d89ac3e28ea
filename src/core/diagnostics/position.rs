/// A cursor position as the editor reports it: one-based lines, zero-based columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditorPosition {
    pub line: u32,
    pub column: u32,
}

/// A position as the compiler prints it: one-based lines and columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolchainPosition {
    pub line: u32,
    pub column: u32,
}

pub fn translate_editor_to_toolchain(position: EditorPosition) -> ToolchainPosition {
    ToolchainPosition {
        line: position.line,
        column: position.column.saturating_add(1),
    }
}

pub fn translate_toolchain_to_editor(position: ToolchainPosition) -> EditorPosition {
    EditorPosition {
        line: position.line,
        column: position.column.saturating_sub(1),
    }
}
