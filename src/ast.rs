//! Abstract Syntax Tree (AST) for the C++ front end.
//!
//! Nodes live in an [`Arena`] owned by [`Ast`] and refer to each other by
//! [`NodeRef`]. Token slots hold indices into the token stream of the
//! translation unit that produced the tree; index `0` is the reserved
//! invalid token and marks an absent slot.
//!
//! - [`nodes`]: the node kinds, generated from a single table
//! - [`visitor`]: the [`Visitor`] trait and the [`accept`] walk
//! - [`dumper`]: serializable dumps for tests and debugging

use crate::arena::{Arena, Id};

pub mod dumper;
pub mod nodes;
pub mod visitor;

pub use nodes::*;
pub use visitor::{Visitor, accept, accept_list, accept_opt};

/// Reference to a node in an [`Ast`]
pub type NodeRef = Id<NodeKind>;

/// Arena of AST nodes for one translation unit.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Arena<NodeKind>,
}

impl Ast {
    /// Create a new empty AST
    pub fn new() -> Self {
        Ast::default()
    }

    /// Add a node to the AST and return its reference
    pub fn alloc(&mut self, kind: impl Into<NodeKind>) -> NodeRef {
        self.nodes.alloc(kind.into())
    }

    pub fn get(&self, node: NodeRef) -> &NodeKind {
        self.nodes.get(node)
    }

    pub fn get_mut(&mut self, node: NodeRef) -> &mut NodeKind {
        self.nodes.get_mut(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &NodeKind)> + '_ {
        self.nodes.iter()
    }

    /// Index of the first token of `node`, or `0` when it holds no token.
    pub fn first_token(&self, node: NodeRef) -> u32 {
        // `virtual` and the access specifier come in either order
        if let NodeKind::BaseSpecifier(base) = self.get(node) {
            let keywords = [base.virtual_kw, base.access_specifier];
            if let Some(first) = keywords.into_iter().filter(|&t| t != 0).min() {
                return first;
            }
        }
        for slot in self.get(node).slots() {
            let token = match slot {
                Slot::Token(token) => token,
                Slot::Node(Some(child)) => self.first_token(child),
                Slot::Node(None) => 0,
                Slot::List(list) => list.iter().map(|&child| self.first_token(child)).find(|&t| t != 0).unwrap_or(0),
            };
            if token != 0 {
                return token;
            }
        }
        0
    }

    /// One past the index of the last token of `node`, or `0` when it holds no token.
    pub fn last_token(&self, node: NodeRef) -> u32 {
        if let NodeKind::BaseSpecifier(base) = self.get(node) {
            if base.name.is_none() {
                return match base.virtual_kw.max(base.access_specifier) {
                    0 => 0,
                    token => token + 1,
                };
            }
        }
        for slot in self.get(node).slots().into_iter().rev() {
            let token = match slot {
                Slot::Token(0) => 0,
                Slot::Token(token) => token + 1,
                Slot::Node(Some(child)) => self.last_token(child),
                Slot::Node(None) => 0,
                Slot::List(list) => list
                    .iter()
                    .rev()
                    .map(|&child| self.last_token(child))
                    .find(|&t| t != 0)
                    .unwrap_or(0),
            };
            if token != 0 {
                return token;
            }
        }
        0
    }

    /// Deep copy of the subtree rooted at `node` into `target`.
    ///
    /// Semantic annotations are not copied.
    pub fn clone_into(&self, node: NodeRef, target: &mut Ast) -> NodeRef {
        let copy = self.get(node).map_children(&mut |child| self.clone_into(child, target));
        target.alloc(copy)
    }
}

impl std::ops::Index<NodeRef> for Ast {
    type Output = NodeKind;

    fn index(&self, node: NodeRef) -> &NodeKind {
        self.get(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thin_vec::thin_vec;

    fn small_tree(ast: &mut Ast) -> NodeRef {
        let name = ast.alloc(SimpleName {
            identifier: 3,
            ..Default::default()
        });
        let declarator_id = ast.alloc(DeclaratorId { name: Some(name) });
        let declarator = ast.alloc(Declarator {
            core_declarator: Some(declarator_id),
            ..Default::default()
        });
        let specifier = ast.alloc(SimpleSpecifier { specifier: 2 });
        ast.alloc(SimpleDeclaration {
            decl_specifiers: thin_vec![specifier],
            declarators: thin_vec![declarator],
            semicolon: 4,
            ..Default::default()
        })
    }

    #[test]
    fn test_token_span_covers_children() {
        let mut ast = Ast::new();
        let decl = small_tree(&mut ast);
        assert_eq!(ast.first_token(decl), 2);
        assert_eq!(ast.last_token(decl), 5);
        for child in ast[decl].children() {
            assert!(ast.first_token(decl) <= ast.first_token(child));
            assert!(ast.last_token(child) <= ast.last_token(decl));
        }
    }

    #[test]
    fn test_missing_semicolon_falls_back_to_declarator() {
        let mut ast = Ast::new();
        let decl = small_tree(&mut ast);
        if let NodeKind::SimpleDeclaration(d) = ast.get_mut(decl) {
            d.semicolon = 0;
        }
        assert_eq!(ast.last_token(decl), 4);
    }

    #[test]
    fn test_clone_into_other_arena() {
        let mut ast = Ast::new();
        let decl = small_tree(&mut ast);
        let mut copy = Ast::new();
        let cloned = ast.clone_into(decl, &mut copy);
        assert_eq!(copy.len(), ast.len());
        assert_eq!(copy[cloned].kind_name(), "SimpleDeclaration");
        assert_eq!(copy.first_token(cloned), 2);
        assert_eq!(copy.last_token(cloned), 5);
    }
}
