//! The numeric promotion lattice.
//!
//! Two chains: `byte < short < integer < long < extended` and
//! `float < double < complex`. Integers below `extended` promote into the
//! float chain; `extended` never mixes with it.

use kestrel_ast::PrimitiveKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chain {
    Integer,
    Float,
}

fn rank(kind: PrimitiveKind) -> Option<(Chain, u8)> {
    use PrimitiveKind::*;
    let rank = match kind {
        Byte => (Chain::Integer, 0),
        Short => (Chain::Integer, 1),
        Integer => (Chain::Integer, 2),
        Long => (Chain::Integer, 3),
        Extended => (Chain::Integer, 4),
        Float => (Chain::Float, 0),
        Double => (Chain::Float, 1),
        Complex => (Chain::Float, 2),
        Boolean | Char | String | ByteString => return None,
    };
    Some(rank)
}

/// The wider of two compatible primitives, or `None` if they do not mix.
///
/// Non-numeric primitives are only compatible with themselves.
pub fn common(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    if a == b {
        return Some(a);
    }
    let (chain_a, rank_a) = rank(a)?;
    let (chain_b, rank_b) = rank(b)?;
    match (chain_a, chain_b) {
        (Chain::Integer, Chain::Integer) | (Chain::Float, Chain::Float) => {
            Some(if rank_a >= rank_b { a } else { b })
        }
        _ if a == PrimitiveKind::Extended || b == PrimitiveKind::Extended => None,
        (Chain::Float, Chain::Integer) => Some(a),
        (Chain::Integer, Chain::Float) => Some(b),
    }
}

/// Whether a value of type `source` fits a `target` without loss.
pub fn widens_to(source: PrimitiveKind, target: PrimitiveKind) -> bool {
    common(source, target) == Some(target)
}

/// Result type of `a / b`: division always lands in the float chain.
pub fn division(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    common(common(a, b)?, PrimitiveKind::Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use PrimitiveKind::*;

    #[test]
    fn common_is_symmetric_and_idempotent() {
        for a in PrimitiveKind::iter() {
            assert_eq!(common(a, a), Some(a));
            for b in PrimitiveKind::iter() {
                assert_eq!(common(a, b), common(b, a), "{a} and {b}");
            }
        }
    }

    #[test]
    fn common_is_associative_where_defined() {
        for a in PrimitiveKind::iter() {
            for b in PrimitiveKind::iter() {
                for c in PrimitiveKind::iter() {
                    let left = common(a, b).and_then(|ab| common(ab, c));
                    let right = common(b, c).and_then(|bc| common(a, bc));
                    if let (Some(left), Some(right)) = (left, right) {
                        assert_eq!(left, right, "{a}, {b}, {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn integer_chain() {
        assert_eq!(common(Byte, Long), Some(Long));
        assert_eq!(common(Extended, Short), Some(Extended));
        assert!(widens_to(Short, Integer));
        assert!(!widens_to(Long, Integer));
    }

    #[test]
    fn mixed_chains() {
        assert_eq!(common(Integer, Float), Some(Float));
        assert_eq!(common(Long, Complex), Some(Complex));
        assert!(widens_to(Integer, Double));
        assert!(!widens_to(Double, Integer));
    }

    #[test]
    fn extended_never_mixes_with_floats() {
        for float in [Float, Double, Complex] {
            assert_eq!(common(Extended, float), None);
            assert!(!widens_to(Extended, float));
        }
        assert_eq!(division(Extended, Integer), None);
    }

    #[test]
    fn non_numeric_primitives() {
        assert_eq!(common(String, Char), None);
        assert_eq!(common(Boolean, Integer), None);
        assert!(widens_to(ByteString, ByteString));
    }

    #[test]
    fn division_promotes_to_floats() {
        assert_eq!(division(Integer, Integer), Some(Float));
        assert_eq!(division(Short, Double), Some(Double));
        assert_eq!(division(Complex, Byte), Some(Complex));
    }
}
