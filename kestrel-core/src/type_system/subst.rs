use super::{Ty, TyKind};

use kestrel_ast::Modifiers;
use kestrel_types::Ident;
use rustc_hash::FxHashMap;

/// Maps the type parameters of a generic class to concrete types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstMap {
    mapping: FxHashMap<Ident, Ty>,
}

impl TypeSubstMap {
    pub fn new() -> TypeSubstMap {
        TypeSubstMap::default()
    }

    /// Pairs each parameter with the argument in the same position.
    pub fn from_params_and_args(params: &[Ident], args: &[Ty]) -> TypeSubstMap {
        TypeSubstMap {
            mapping: params.iter().cloned().zip(args.iter().cloned()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn get(&self, param: &Ident) -> Option<&Ty> {
        self.mapping.get(param)
    }

    /// Replaces every mapped parameter in `ty`.
    ///
    /// Modifiers written on the parameter are added to those of the replacement.
    pub fn subst(&self, ty: &Ty) -> Ty {
        match &ty.kind {
            TyKind::GenericParam(name) => match self.mapping.get(name) {
                Some(replacement) => Ty {
                    kind: replacement.kind.clone(),
                    modifiers: union(replacement.modifiers, ty.modifiers),
                },
                None => ty.clone(),
            },
            TyKind::Array(elem) => Ty {
                kind: TyKind::Array(Box::new(self.subst(elem))),
                modifiers: ty.modifiers,
            },
            TyKind::Keymap(key, value) => Ty {
                kind: TyKind::Keymap(Box::new(self.subst(key)), Box::new(self.subst(value))),
                modifiers: ty.modifiers,
            },
            TyKind::GenericClass(name, args) => Ty {
                kind: TyKind::GenericClass(
                    name.clone(),
                    args.iter().map(|arg| self.subst(arg)).collect(),
                ),
                modifiers: ty.modifiers,
            },
            _ => ty.clone(),
        }
    }

    /// Composes two maps: the result of `self` is further rewritten by `outer`.
    ///
    /// Parameters that `self` leaves unbound keep their binding in `outer`.
    pub fn then(&self, outer: &TypeSubstMap) -> TypeSubstMap {
        if outer.is_empty() {
            return self.clone();
        }
        let mut mapping = outer.mapping.clone();
        mapping.extend(
            self.mapping
                .iter()
                .map(|(param, ty)| (param.clone(), outer.subst(ty))),
        );
        TypeSubstMap { mapping }
    }

    /// Infers bindings for `generics` by matching a declared parameter type
    /// against an argument type. Already bound parameters are left alone.
    pub fn bind(&mut self, generics: &[Ident], param: &Ty, arg: &Ty) {
        match (&param.kind, &arg.kind) {
            (TyKind::GenericParam(name), _) if generics.contains(name) => {
                if !self.mapping.contains_key(name) {
                    let modifiers = Modifiers {
                        is_nullable: arg.modifiers.is_nullable && !param.modifiers.is_nullable,
                        ..Modifiers::NONE
                    };
                    self.mapping
                        .insert(name.clone(), arg.decay().with_modifiers(modifiers));
                }
            }
            (TyKind::Array(p), TyKind::Array(a)) => self.bind(generics, p, a),
            (TyKind::Keymap(pk, pv), TyKind::Keymap(ak, av)) => {
                self.bind(generics, pk, ak);
                self.bind(generics, pv, av);
            }
            (TyKind::GenericClass(p_name, p_args), TyKind::GenericClass(a_name, a_args))
                if p_name == a_name =>
            {
                for (p, a) in p_args.iter().zip(a_args) {
                    self.bind(generics, p, a);
                }
            }
            _ => {}
        }
    }
}

fn union(a: Modifiers, b: Modifiers) -> Modifiers {
    Modifiers {
        is_const: a.is_const || b.is_const,
        is_reference: a.is_reference || b.is_reference,
        is_nullable: a.is_nullable || b.is_nullable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::PrimitiveKind;

    fn param(name: &str) -> Ty {
        Ty::new(TyKind::GenericParam(Ident::new_no_span(name)))
    }

    #[test]
    fn subst_replaces_nested_parameters() {
        let map = TypeSubstMap::from_params_and_args(
            &[Ident::new_no_span("K"), Ident::new_no_span("V")],
            &[
                Ty::primitive(PrimitiveKind::String),
                Ty::primitive(PrimitiveKind::Double),
            ],
        );
        let ty = Ty::keymap(param("K"), Ty::array(param("V")));
        assert_eq!(map.subst(&ty).to_string(), "keymap[string, array[double]]");
    }

    #[test]
    fn subst_keeps_parameter_modifiers() {
        let map = TypeSubstMap::from_params_and_args(
            &[Ident::new_no_span("T")],
            &[Ty::primitive(PrimitiveKind::Integer)],
        );
        let ty = param("T").with_modifiers(Modifiers {
            is_reference: true,
            ..Modifiers::NONE
        });
        assert_eq!(map.subst(&ty).to_string(), "reference integer");
    }

    #[test]
    fn then_composes_and_keeps_outer_bindings() {
        let string = Ty::primitive(PrimitiveKind::String);
        let receiver = TypeSubstMap::from_params_and_args(&[Ident::new_no_span("T")], &[string]);
        assert_eq!(
            TypeSubstMap::new().then(&receiver).subst(&param("T")).to_string(),
            "string"
        );

        let link = TypeSubstMap::from_params_and_args(
            &[Ident::new_no_span("U"), Ident::new_no_span("T")],
            &[Ty::array(param("T")), Ty::primitive(PrimitiveKind::Char)],
        );
        let composed = link.then(&receiver);
        assert_eq!(composed.subst(&param("U")).to_string(), "array[string]");
        assert_eq!(composed.subst(&param("T")).to_string(), "char");
    }

    #[test]
    fn bind_infers_from_generic_class_arguments() {
        let generics = [Ident::new_no_span("T")];
        let boxed = |arg| Ty::new(TyKind::GenericClass(Ident::new_no_span("Box"), vec![arg]));
        let mut map = TypeSubstMap::new();
        map.bind(&generics, &boxed(param("T")), &boxed(Ty::primitive(PrimitiveKind::Long)));
        assert_eq!(
            map.get(&generics[0]),
            Some(&Ty::primitive(PrimitiveKind::Long))
        );
    }
}
