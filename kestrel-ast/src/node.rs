use crate::priv_prelude::*;

/// Identity of a syntax node, unique within one parsed program.
///
/// Analysis results are stored in side tables keyed by this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: u32) -> NodeId {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fields shared by every syntax node.
///
/// Two metas always compare equal, so the derived equality of a node is
/// purely structural.
#[derive(Clone, Debug, Serialize)]
pub struct NodeMeta {
    pub id: NodeId,
    pub span: Span,
}

impl NodeMeta {
    pub fn new(id: NodeId, span: Span) -> NodeMeta {
        NodeMeta { id, span }
    }
}

impl PartialEq for NodeMeta {
    fn eq(&self, _other: &NodeMeta) -> bool {
        true
    }
}
