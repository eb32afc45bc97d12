use crate::priv_prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Private,
    Protected,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Private => "private",
            Access::Protected => "protected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub meta: NodeMeta,
    pub ty: TypeRef,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub meta: NodeMeta,
    pub access: Access,
    pub is_static: bool,
    pub ty: TypeRef,
    pub name: Ident,
    pub init: Option<(AssignKind, Expr)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub meta: NodeMeta,
    pub access: Access,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_overload: bool,
    pub return_type: TypeRef,
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: ScopeBlock,
}

impl MethodDecl {
    /// Whether subclasses may override this method.
    pub fn is_overridable(&self) -> bool {
        self.is_virtual || self.is_overload
    }
}

/// A free function, or an operator overload owned by a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub meta: NodeMeta,
    pub return_type: TypeRef,
    /// For operator overloads this is the mangled `operator_<mnemonic>` name.
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: ScopeBlock,
    pub owner: Option<Ident>,
    pub operator: Option<OperatorName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub meta: NodeMeta,
    pub name: Ident,
    pub generics: Vec<Ident>,
    pub superclass: Option<TypeRef>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    pub fn field(&self, name: &Ident) -> Option<(usize, &FieldDecl)> {
        self.fields.iter().enumerate().find(|(_, f)| &f.name == name)
    }
}

impl Spanned for ClassDecl {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

impl Spanned for FunctionDecl {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

impl Spanned for MethodDecl {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

impl Spanned for FieldDecl {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}
