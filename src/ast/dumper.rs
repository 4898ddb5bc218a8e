//! AST Dumper module
//!
//! Produces a serializable tree of node kinds and the spellings of their
//! token slots, for snapshot tests and debugging.

use serde::Serialize;

use crate::ast::{Ast, NodeRef, Visitor, accept};
use crate::lexer::Token;

/// One node of a dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpNode {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpNode>,
}

/// Dumper for AST
pub struct AstDumper<'a> {
    tokens: &'a [Token],
    stack: Vec<DumpNode>,
    finished: Option<DumpNode>,
}

impl<'a> AstDumper<'a> {
    /// `tokens` is the token stream the tree was parsed from.
    pub fn new(tokens: &'a [Token]) -> Self {
        AstDumper {
            tokens,
            stack: Vec::new(),
            finished: None,
        }
    }

    pub fn dump(ast: &Ast, tokens: &'a [Token], root: NodeRef) -> DumpNode {
        let mut dumper = AstDumper::new(tokens);
        accept(ast, root, &mut dumper);
        dumper.finished.unwrap_or(DumpNode {
            kind: ast[root].kind_name(),
            tokens: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Indented text rendering, one node per line.
    pub fn dump_text(ast: &Ast, tokens: &'a [Token], root: NodeRef) -> String {
        let mut out = String::new();
        write_text(&Self::dump(ast, tokens, root), 0, &mut out);
        out
    }
}

fn write_text(node: &DumpNode, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(node.kind);
    if !node.tokens.is_empty() {
        out.push_str(" `");
        out.push_str(&node.tokens.join(" "));
        out.push('`');
    }
    out.push('\n');
    for child in &node.children {
        write_text(child, depth + 1, out);
    }
}

impl Visitor for AstDumper<'_> {
    fn pre_visit(&mut self, ast: &Ast, node: NodeRef) -> bool {
        let tokens = ast[node]
            .tokens()
            .into_iter()
            .filter_map(|index| self.tokens.get(index as usize))
            .map(|token| token.spell())
            .collect();
        self.stack.push(DumpNode {
            kind: ast[node].kind_name(),
            tokens,
            children: Vec::new(),
        });
        true
    }

    fn post_visit(&mut self, _ast: &Ast, _node: NodeRef) {
        let Some(done) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => self.finished = Some(done),
        }
    }
}
