use super::{promotion, Ty, TyKind};

/// Whether a value of type `source` may be stored in a `target`.
///
/// Identical types always match. Otherwise `const` and `nullable` may be
/// gained but never lost, `reference` must agree exactly, and the base types
/// must agree: primitives along the promotion lattice, collections and generic
/// classes argument by argument, plain classes by name only.
pub fn assignable(source: &Ty, target: &Ty) -> bool {
    if source == target {
        return true;
    }
    match source.kind {
        TyKind::Null => return target.modifiers.is_nullable,
        TyKind::Undefined => return !target.is_reference(),
        _ => {}
    }
    let (s, t) = (source.modifiers, target.modifiers);
    if (s.is_const && !t.is_const)
        || (s.is_nullable && !t.is_nullable)
        || s.is_reference != t.is_reference
    {
        return false;
    }
    base_assignable(&source.kind, &target.kind)
}

fn base_assignable(source: &TyKind, target: &TyKind) -> bool {
    match (source, target) {
        (TyKind::Primitive(s), TyKind::Primitive(t)) => promotion::widens_to(*s, *t),
        (TyKind::Array(s), TyKind::Array(t)) => assignable(s, t),
        (TyKind::Keymap(sk, sv), TyKind::Keymap(tk, tv)) => {
            assignable(sk, tk) && assignable(sv, tv)
        }
        (TyKind::Class(s), TyKind::Class(t)) | (TyKind::GenericParam(s), TyKind::GenericParam(t)) => {
            s == t
        }
        (TyKind::GenericClass(s, s_args), TyKind::GenericClass(t, t_args)) => {
            s == t
                && s_args.len() == t_args.len()
                && s_args.iter().zip(t_args).all(|(s, t)| assignable(s, t))
        }
        (TyKind::Void, TyKind::Void) => true,
        _ => false,
    }
}

/// Exact structural match, modifiers included.
pub fn strict(a: &Ty, b: &Ty) -> bool {
    a == b
}

/// Strict match of two parameter lists.
pub fn strict_signature(a: &[Ty], b: &[Ty]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| strict(a, b))
}

/// Whether an argument may be passed for a parameter.
///
/// Reference parameters bind a place by reference; other arguments must
/// already be references. Value parameters receive a copy.
pub fn accepts_argument(param: &Ty, arg: &Ty, arg_is_place: bool) -> bool {
    if param.is_reference() {
        let source = if arg_is_place {
            arg.as_reference()
        } else {
            arg.clone()
        };
        assignable(&source, param)
    } else {
        assignable(&arg.decay(), param)
    }
}
