use crate::priv_prelude::*;

/// Root of the syntax tree.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
    pub statements: Vec<Statement>,
    /// Number of node ids handed out while parsing.
    #[serde(skip)]
    pub node_count: u32,
}

impl Program {
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|class| class.name.as_str() == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name.as_str() == name)
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Program) -> bool {
        self.classes == other.classes
            && self.functions == other.functions
            && self.statements == other.statements
    }
}
