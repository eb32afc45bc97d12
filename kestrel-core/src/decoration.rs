//! Analysis results, stored beside the syntax tree and keyed by node or
//! declaration id.

use crate::{
    semantic_analysis::namespace::{ClassId, DeclId, FunctionId},
    type_system::{Ty, TypeSubstMap},
};

use indexmap::IndexMap;
use kestrel_ast::NodeId;
use kestrel_error::handler::ErrorEmitted;
use kestrel_types::Ident;
use rustc_hash::FxHashMap;

/// Progress of inheritance validation for one class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InheritanceMark {
    #[default]
    Unvisited,
    InProgress,
    Done(bool),
}

/// A validated superclass link: the superclass and how its type parameters
/// map into the subclass.
#[derive(Clone, Debug)]
pub struct SuperclassLink {
    pub class: ClassId,
    pub subst: TypeSubstMap,
}

#[derive(Debug, Default)]
pub struct Decorations {
    validity: FxHashMap<NodeId, bool>,
    types: FxHashMap<NodeId, Ty>,
    failures: FxHashMap<NodeId, ErrorEmitted>,
    resolutions: FxHashMap<NodeId, DeclId>,
    generic_aliases: FxHashMap<NodeId, bool>,
    usage: FxHashMap<DeclId, u32>,
    overload_index: FxHashMap<DeclId, usize>,
    instantiations: IndexMap<Ident, Vec<Vec<Ty>>>,
    inheritance: Vec<InheritanceMark>,
    superclasses: Vec<Option<SuperclassLink>>,
}

impl Decorations {
    pub fn new(class_count: usize) -> Decorations {
        Decorations {
            inheritance: vec![InheritanceMark::Unvisited; class_count],
            superclasses: vec![None; class_count],
            ..Decorations::default()
        }
    }

    /// Records the validity of a node. The first write wins.
    pub fn set_valid(&mut self, id: NodeId, valid: bool) -> bool {
        *self.validity.entry(id).or_insert(valid)
    }

    /// `None` while the node has not been checked.
    pub fn validity(&self, id: NodeId) -> Option<bool> {
        self.validity.get(&id).copied()
    }

    /// Stores the outcome of checking a typed node and hands it back.
    pub fn record(&mut self, id: NodeId, result: Result<Ty, ErrorEmitted>) -> Result<Ty, ErrorEmitted> {
        match &result {
            Ok(ty) => {
                self.set_valid(id, true);
                self.types.insert(id, ty.clone());
            }
            Err(err) => {
                self.set_valid(id, false);
                self.failures.insert(id, *err);
            }
        }
        result
    }

    /// The recorded outcome for a typed node, if it was already checked.
    pub fn cached(&self, id: NodeId) -> Option<Result<Ty, ErrorEmitted>> {
        match self.validity(id)? {
            true => self.types.get(&id).cloned().map(Ok),
            false => self.failures.get(&id).copied().map(Err),
        }
    }

    /// The inferred type of an expression or the resolved type of a type reference.
    pub fn type_of(&self, id: NodeId) -> Option<&Ty> {
        self.types.get(&id)
    }

    pub fn set_resolution(&mut self, id: NodeId, decl: DeclId) {
        self.resolutions.insert(id, decl);
    }

    /// The declaration a call, operator, member access or name resolved to.
    pub fn resolution(&self, id: NodeId) -> Option<DeclId> {
        self.resolutions.get(&id).copied()
    }

    pub fn generic_alias(&self, id: NodeId) -> Option<bool> {
        self.generic_aliases.get(&id).copied()
    }

    pub fn set_generic_alias(&mut self, id: NodeId, is_alias: bool) {
        self.generic_aliases.insert(id, is_alias);
    }

    /// Counts one use of `decl`. Counters never go down.
    pub fn mark_used(&mut self, decl: DeclId) {
        *self.usage.entry(decl).or_insert(0) += 1;
    }

    pub fn usage(&self, decl: DeclId) -> u32 {
        self.usage.get(&decl).copied().unwrap_or(0)
    }

    pub fn set_overload_index(&mut self, decl: DeclId, index: usize) {
        self.overload_index.insert(decl, index);
    }

    /// Position of `decl` among the declarations sharing its name.
    pub fn overload_index(&self, decl: DeclId) -> Option<usize> {
        self.overload_index.get(&decl).copied()
    }

    /// Registers a concrete argument list for a generic class, once per distinct list.
    pub fn add_instantiation(&mut self, class: &Ident, args: Vec<Ty>) {
        let instances = self.instantiations.entry(class.clone()).or_default();
        if !instances.contains(&args) {
            instances.push(args);
        }
    }

    pub fn instantiations(&self, class: &Ident) -> &[Vec<Ty>] {
        self.instantiations
            .get(class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn inheritance_mark(&self, class: ClassId) -> InheritanceMark {
        self.inheritance[class.index()]
    }

    pub(crate) fn set_inheritance_mark(&mut self, class: ClassId, mark: InheritanceMark) {
        self.inheritance[class.index()] = mark;
    }

    pub fn superclass(&self, class: ClassId) -> Option<&SuperclassLink> {
        self.superclasses[class.index()].as_ref()
    }

    pub(crate) fn set_superclass(&mut self, class: ClassId, link: SuperclassLink) {
        self.superclasses[class.index()] = Some(link);
    }

    /// `class` followed by its validated ancestors, nearest first, each with the
    /// substitution that maps its type parameters into `class`.
    pub fn class_chain(&self, class: ClassId) -> Vec<(ClassId, TypeSubstMap)> {
        let mut chain = vec![(class, TypeSubstMap::new())];
        let mut current = class;
        while let Some(link) = self.superclass(current) {
            if chain.iter().any(|(id, _)| *id == link.class) {
                break;
            }
            let outer = chain.last().map(|(_, subst)| subst.clone()).unwrap_or_default();
            chain.push((link.class, link.subst.then(&outer)));
            current = link.class;
        }
        chain
    }

    pub fn function_usage(&self, id: FunctionId) -> u32 {
        self.usage(DeclId::Function(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::PrimitiveKind;

    #[test]
    fn validity_is_write_once() {
        let mut decorations = Decorations::new(0);
        let id = NodeId::new(3);
        assert_eq!(decorations.validity(id), None);
        assert!(!decorations.set_valid(id, false));
        assert!(!decorations.set_valid(id, true));
        assert_eq!(decorations.validity(id), Some(false));
    }

    #[test]
    fn record_caches_outcome() {
        let mut decorations = Decorations::new(0);
        let id = NodeId::new(1);
        assert_eq!(decorations.cached(id), None);
        let integer = Ty::primitive(PrimitiveKind::Integer);
        assert_eq!(decorations.record(id, Ok(integer.clone())), Ok(integer.clone()));
        assert_eq!(decorations.cached(id), Some(Ok(integer.clone())));
        assert_eq!(decorations.type_of(id), Some(&integer));
    }

    #[test]
    fn instantiations_are_deduplicated() {
        let mut decorations = Decorations::new(0);
        let name = Ident::new_no_span("Box");
        let integer = Ty::primitive(PrimitiveKind::Integer);
        decorations.add_instantiation(&name, vec![integer.clone()]);
        decorations.add_instantiation(&name, vec![integer]);
        assert_eq!(decorations.instantiations(&name).len(), 1);
    }
}
