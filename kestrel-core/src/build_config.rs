use serde::{Deserialize, Serialize};

/// Configuration for analysis and reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub(crate) dead_code_warnings: bool,
    pub(crate) unreachable_warnings: bool,
    pub(crate) print_tree: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dead_code_warnings: true,
            unreachable_warnings: true,
            print_tree: false,
        }
    }
}

impl BuildConfig {
    /// Whether declarations that are never used are reported as warnings.
    ///
    /// Default: `true`
    pub fn dead_code_warnings(self, dead_code_warnings: bool) -> Self {
        Self {
            dead_code_warnings,
            ..self
        }
    }

    /// Default: `true`
    pub fn unreachable_warnings(self, unreachable_warnings: bool) -> Self {
        Self {
            unreachable_warnings,
            ..self
        }
    }

    /// Whether the driver prints the syntax tree after analysis.
    pub fn print_tree(self, print_tree: bool) -> Self {
        Self { print_tree, ..self }
    }

    pub fn should_print_tree(&self) -> bool {
        self.print_tree
    }
}
