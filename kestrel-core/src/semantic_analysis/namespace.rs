use indexmap::IndexMap;
use kestrel_ast::{ClassDecl, FunctionDecl, MethodDecl, Program};
use kestrel_error::{error::CompileError, handler::Handler};
use kestrel_types::{Ident, Spanned};

/// Index of a class in `Program::classes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(usize);

/// Index of a function in `Program::functions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(usize);

impl ClassId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl FunctionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of any declaration that carries a usage counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeclId {
    Class(ClassId),
    Function(FunctionId),
    Method(ClassId, usize),
    Field(ClassId, usize),
}

/// Name tables over the declarations of one program.
///
/// Built once before analysis and read-only afterwards.
#[derive(Debug, Default)]
pub struct DeclRegistry {
    classes: IndexMap<Ident, Vec<ClassId>>,
    functions: IndexMap<Ident, Vec<FunctionId>>,
}

/// Outcome of looking a class up by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassLookup {
    Found(ClassId),
    Missing,
    Ambiguous,
}

impl DeclRegistry {
    /// Registers every class and function. A class name declared twice is an error;
    /// references to it are then ambiguous.
    pub fn new(handler: &Handler, program: &Program) -> DeclRegistry {
        let mut registry = DeclRegistry::default();
        for (index, class) in program.classes.iter().enumerate() {
            let ids = registry.classes.entry(class.name.clone()).or_default();
            if !ids.is_empty() {
                handler.emit_err(CompileError::ClassRedeclared {
                    name: class.name.clone(),
                    span: class.name.span(),
                });
            }
            ids.push(ClassId(index));
        }
        for (index, function) in program.functions.iter().enumerate() {
            registry
                .functions
                .entry(function.name.clone())
                .or_default()
                .push(FunctionId(index));
        }
        registry
    }

    pub fn lookup_class(&self, name: &Ident) -> ClassLookup {
        match self.classes.get(name).map(Vec::as_slice) {
            Some([id]) => ClassLookup::Found(*id),
            Some([]) | None => ClassLookup::Missing,
            Some(_) => ClassLookup::Ambiguous,
        }
    }

    pub fn is_class_name(&self, name: &Ident) -> bool {
        self.classes.contains_key(name)
    }

    /// Every function registered under `name`, in declaration order.
    ///
    /// Operator functions are registered under their mangled name.
    pub fn functions_named(&self, name: &str) -> &[FunctionId] {
        self.functions
            .get(&Ident::new_no_span(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Functions grouped by name, in order of first declaration.
    pub fn function_groups(&self) -> impl Iterator<Item = (&Ident, &[FunctionId])> {
        self.functions.iter().map(|(name, ids)| (name, ids.as_slice()))
    }

    pub fn class_ids(program: &Program) -> impl Iterator<Item = ClassId> {
        (0..program.classes.len()).map(ClassId)
    }

    pub fn function_ids(program: &Program) -> impl Iterator<Item = FunctionId> {
        (0..program.functions.len()).map(FunctionId)
    }
}

/// Typed accessors into the program by declaration id.
pub trait ProgramDecls {
    fn class_decl(&self, id: ClassId) -> &ClassDecl;
    fn function_decl(&self, id: FunctionId) -> &FunctionDecl;
    fn method_decl(&self, class: ClassId, index: usize) -> &MethodDecl;
}

impl ProgramDecls for Program {
    fn class_decl(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.0]
    }

    fn function_decl(&self, id: FunctionId) -> &FunctionDecl {
        &self.functions[id.0]
    }

    fn method_decl(&self, class: ClassId, index: usize) -> &MethodDecl {
        &self.classes[class.0].methods[index]
    }
}
