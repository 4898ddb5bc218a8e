//! AST Visitor pattern implementation.
//!
//! [`accept`] drives a [`Visitor`] over a subtree: `pre_visit`, the
//! kind-specific `visit_*` (returning `false` skips the children), the
//! children in declaration order, `end_visit_*`, then `post_visit`.
//! Every method has a default, so visitors override only the kinds they need.

use crate::ast::nodes::*;
use crate::ast::{Ast, NodeRef};

macro_rules! define_visitor {
    ($(
        $(#[$meta:meta])*
        $kind:ident => $snake:ident { $($field:ident : $marker:ident),* $(,)? }
    )*) => {
        paste::paste! {
            /// Trait for visiting AST nodes.
            pub trait Visitor {
                /// Called before any node. Returning `false` skips the node entirely.
                fn pre_visit(&mut self, _ast: &Ast, _node: NodeRef) -> bool {
                    true
                }

                /// Called after any node, even one skipped by `pre_visit`.
                fn post_visit(&mut self, _ast: &Ast, _node: NodeRef) {}

                $(
                    fn [<visit_ $snake>](&mut self, _ast: &Ast, _node: NodeRef, _n: &$kind) -> bool {
                        true
                    }

                    fn [<end_visit_ $snake>](&mut self, _ast: &Ast, _node: NodeRef, _n: &$kind) {}
                )*
            }

            /// Walk `node` and its subtree with `visitor`.
            pub fn accept<V: Visitor + ?Sized>(ast: &Ast, node: NodeRef, visitor: &mut V) {
                if visitor.pre_visit(ast, node) {
                    match &ast[node] {
                        $(
                            NodeKind::$kind(n) => {
                                if visitor.[<visit_ $snake>](ast, node, n) {
                                    for child in ast[node].children() {
                                        accept(ast, child, visitor);
                                    }
                                }
                                visitor.[<end_visit_ $snake>](ast, node, n);
                            }
                        )*
                    }
                }
                visitor.post_visit(ast, node);
            }
        }
    };
}

with_node_kinds!(define_visitor);

/// Walk an optional node.
pub fn accept_opt<V: Visitor + ?Sized>(ast: &Ast, node: Option<NodeRef>, visitor: &mut V) {
    if let Some(node) = node {
        accept(ast, node, visitor);
    }
}

/// Walk every node of a list in order.
pub fn accept_list<V: Visitor + ?Sized>(ast: &Ast, nodes: &[NodeRef], visitor: &mut V) {
    for &node in nodes {
        accept(ast, node, visitor);
    }
}
