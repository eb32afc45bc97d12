use crate::{
    build_config::BuildConfig,
    decoration::Decorations,
    semantic_analysis::{
        environment::Environment,
        namespace::{ClassId, ClassLookup, DeclRegistry, ProgramDecls},
    },
    type_system::{Ty, TyKind, TypeSubstMap},
};

use kestrel_ast::{Access, ClassDecl, Program};
use kestrel_error::handler::ErrorEmitted;
use kestrel_types::Ident;

/// Contextual state tracked throughout type-checking.
pub struct TypeCheckContext<'a> {
    program: &'a Program,
    registry: &'a DeclRegistry,
    config: &'a BuildConfig,

    /// Results of the analysis so far.
    pub(crate) decorations: &'a mut Decorations,

    // The following fields are private. Nested nodes get an updated context through the
    // `with_*` methods, so changes never leak into the parent.
    /// Variables in scope.
    env: Environment,
    /// Whether `break` and `continue` are allowed.
    in_loop: bool,
    /// Declared return type of the enclosing function, `None` outside functions.
    return_type: Option<Result<Ty, ErrorEmitted>>,
    /// The class whose body is being checked.
    self_class: Option<ClassId>,
    /// Whether `this` and instance members are available.
    is_instance: bool,
    /// Type parameters in scope.
    generics: &'a [Ident],
}

impl<'a> TypeCheckContext<'a> {
    /// A context for top-level code: no class, no function, no loop.
    pub fn from_program(
        program: &'a Program,
        registry: &'a DeclRegistry,
        decorations: &'a mut Decorations,
        config: &'a BuildConfig,
    ) -> TypeCheckContext<'a> {
        TypeCheckContext {
            program,
            registry,
            config,
            decorations,
            env: Environment::new(),
            in_loop: false,
            return_type: None,
            self_class: None,
            is_instance: false,
            generics: &[],
        }
    }

    /// Create a new context that mutably borrows the decorations of `self`.
    ///
    /// Used when a node has several children: each child gets its own copy of
    /// the context while `self` stays usable afterwards.
    pub fn by_ref(&mut self) -> TypeCheckContext<'_> {
        TypeCheckContext {
            program: self.program,
            registry: self.registry,
            config: self.config,
            decorations: self.decorations,
            env: self.env.clone(),
            in_loop: self.in_loop,
            return_type: self.return_type.clone(),
            self_class: self.self_class,
            is_instance: self.is_instance,
            generics: self.generics,
        }
    }

    pub(crate) fn with_env(self, env: Environment) -> Self {
        Self { env, ..self }
    }

    pub(crate) fn with_loop(self) -> Self {
        Self {
            in_loop: true,
            ..self
        }
    }

    pub(crate) fn with_return_type(self, return_type: Result<Ty, ErrorEmitted>) -> Self {
        Self {
            return_type: Some(return_type),
            ..self
        }
    }

    /// Enters the body of `class`, making its type parameters visible.
    pub(crate) fn with_self_class(self, class: ClassId, is_instance: bool) -> Self {
        let generics = self.program.class_decl(class).generics.as_slice();
        Self {
            self_class: Some(class),
            is_instance,
            generics,
            ..self
        }
    }

    pub(crate) fn with_generics(self, generics: &'a [Ident]) -> Self {
        Self { generics, ..self }
    }

    pub(crate) fn program(&self) -> &'a Program {
        self.program
    }

    pub(crate) fn registry(&self) -> &'a DeclRegistry {
        self.registry
    }

    pub(crate) fn config(&self) -> &'a BuildConfig {
        self.config
    }

    pub(crate) fn env(&self) -> &Environment {
        &self.env
    }

    pub(crate) fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub(crate) fn in_loop(&self) -> bool {
        self.in_loop
    }

    pub(crate) fn return_type(&self) -> Option<&Result<Ty, ErrorEmitted>> {
        self.return_type.as_ref()
    }

    pub(crate) fn self_class(&self) -> Option<ClassId> {
        self.self_class
    }

    pub(crate) fn is_instance(&self) -> bool {
        self.is_instance
    }

    pub(crate) fn generics(&self) -> &'a [Ident] {
        self.generics
    }

    pub(crate) fn class_decl(&self, id: ClassId) -> &'a ClassDecl {
        self.program.class_decl(id)
    }

    /// Looks up the class a resolved class type refers to.
    pub(crate) fn class_of(&self, ty: &Ty) -> Option<ClassId> {
        match &ty.kind {
            TyKind::Class(name) | TyKind::GenericClass(name, _) => {
                match self.registry.lookup_class(name) {
                    ClassLookup::Found(id) => Some(id),
                    ClassLookup::Missing | ClassLookup::Ambiguous => None,
                }
            }
            _ => None,
        }
    }

    /// Maps the type parameters of the class of `ty` to the arguments of `ty`.
    pub(crate) fn receiver_subst(&self, class: ClassId, ty: &Ty) -> TypeSubstMap {
        match &ty.kind {
            TyKind::GenericClass(_, args) => {
                TypeSubstMap::from_params_and_args(&self.class_decl(class).generics, args)
            }
            _ => TypeSubstMap::new(),
        }
    }

    /// The type of `this` inside `class`.
    pub(crate) fn self_type(&self, class: ClassId) -> Ty {
        let decl = self.class_decl(class);
        let kind = if decl.is_generic() {
            TyKind::GenericClass(
                decl.name.clone(),
                decl.generics
                    .iter()
                    .map(|param| Ty::new(TyKind::GenericParam(param.clone())))
                    .collect(),
            )
        } else {
            TyKind::Class(decl.name.clone())
        };
        Ty::new(kind).as_reference()
    }

    /// Whether code in the current class may see a member of `owner` with `access`.
    pub(crate) fn is_accessible(&self, owner: ClassId, access: Access) -> bool {
        match access {
            Access::Public => true,
            Access::Private => self.self_class == Some(owner),
            Access::Protected => self.self_class.is_some_and(|current| {
                self.decorations
                    .class_chain(current)
                    .iter()
                    .any(|(id, _)| *id == owner)
            }),
        }
    }
}
