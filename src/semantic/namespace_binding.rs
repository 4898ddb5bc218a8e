//! Namespace bindings.
//!
//! Every `namespace N { ... }` block is its own Namespace symbol. The binder
//! merges the symbols naming the same namespace into one [`NamespaceBinding`]
//! and resolves `using namespace` directives against the binding tree.

use std::fmt::Write as _;

use log::{debug, trace};

use crate::arena::{Arena, Id};
use crate::diagnostic::{DiagnosticEngine, SemanticError};
use crate::semantic::control::Control;
use crate::semantic::names::{Name, NameRef};
use crate::semantic::pretty::Overview;
use crate::semantic::symbols::{Location, SymbolKind, SymbolRef};

pub type BindingRef = Id<NamespaceBinding>;

/// The namespace symbols sharing one name under one parent binding
#[derive(Debug, Default)]
pub struct NamespaceBinding {
    pub parent: Option<BindingRef>,
    /// Child binding of the anonymous namespace, if any
    pub anonymous: Option<BindingRef>,
    pub children: Vec<BindingRef>,
    /// Bindings named by `using namespace` directives
    pub usings: Vec<BindingRef>,
    pub symbols: Vec<SymbolRef>,
}

/// The binding tree produced by [`Binder::bind`].
#[derive(Debug)]
pub struct NamespaceBindings {
    bindings: Arena<NamespaceBinding>,
    root: BindingRef,
}

impl std::ops::Index<BindingRef> for NamespaceBindings {
    type Output = NamespaceBinding;

    fn index(&self, binding: BindingRef) -> &NamespaceBinding {
        &self.bindings[binding]
    }
}

impl NamespaceBindings {
    /// A tree whose root binding holds the global namespace
    pub fn new(global_namespace: SymbolRef) -> Self {
        let mut bindings = Arena::new();
        let root = bindings.alloc(NamespaceBinding {
            symbols: vec![global_namespace],
            ..NamespaceBinding::default()
        });
        NamespaceBindings { bindings, root }
    }

    pub fn root(&self) -> BindingRef {
        self.root
    }

    pub fn binding(&self, binding: BindingRef) -> &NamespaceBinding {
        &self.bindings[binding]
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Name of the first namespace symbol of a binding
    pub fn name(&self, control: &Control, binding: BindingRef) -> Option<NameRef> {
        let first = *self.bindings[binding].symbols.first()?;
        control.symbol(first).name
    }

    /// `A::B` for binding `B` nested in `A`; anonymous levels print as `<anonymous>`.
    pub fn qualified_id(&self, control: &Control, binding: BindingRef) -> String {
        let overview = Overview::default();
        let mut parts = Vec::new();
        let mut current = Some(binding);
        while let Some(b) = current {
            let parent = self.bindings[b].parent;
            if parent.is_some() {
                match self.name(control, b) {
                    Some(name) => parts.push(overview.pretty_name(control, Some(name))),
                    None => parts.push("<anonymous>".to_string()),
                }
            }
            current = parent;
        }
        parts.reverse();
        parts.join("::")
    }

    pub fn global_namespace_binding(&self, binding: BindingRef) -> BindingRef {
        let mut current = binding;
        while let Some(parent) = self.bindings[current].parent {
            current = parent;
        }
        current
    }

    /// The child binding named `name`, or the anonymous child for `None`.
    pub fn find_namespace_binding(&self, control: &Control, binding: BindingRef, name: Option<NameRef>) -> Option<BindingRef> {
        let Some(name) = name else {
            return self.bindings[binding].anonymous;
        };
        if !control.name(name).is_identifier() {
            return None;
        }
        self.bindings[binding].children.iter().copied().find(|&child| {
            self.name(control, child)
                .is_some_and(|child_name| control.name(child_name).is_identifier() && control.is_equal_name(child_name, name))
        })
    }

    /// The child binding for a namespace symbol, created on first sight.
    pub fn find_or_create(&mut self, control: &Control, binding: BindingRef, symbol: SymbolRef) -> BindingRef {
        let name = control.symbol(symbol).name;
        if let Some(existing) = self.find_namespace_binding(control, binding, name) {
            let symbols = &mut self.bindings[existing].symbols;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
            return existing;
        }

        let child = self.bindings.alloc(NamespaceBinding {
            parent: Some(binding),
            symbols: vec![symbol],
            ..NamespaceBinding::default()
        });
        let parent = &mut self.bindings[binding];
        parent.children.push(child);
        if name.is_none() {
            parent.anonymous = Some(child);
        }
        trace!("new namespace binding {:?} under {:?}", child, binding);
        child
    }

    /// Collect `binding` and the bindings reachable through its using-directives.
    ///
    /// A binding declaring a namespace called `name` earlier in the same file
    /// as `location` stops the walk through its own using-directives.
    fn closure(&self, control: &Control, location: &Location, binding: BindingRef, name: NameRef, out: &mut Vec<BindingRef>) {
        if out.contains(&binding) {
            return;
        }
        out.push(binding);

        let Some(id) = control.name_identifier(name) else {
            return;
        };
        let declares_earlier = self.bindings[binding].symbols.iter().any(|&namespace| {
            let Some(members) = control.symbol(namespace).members() else {
                return false;
            };
            control.lookat(members, id).iter().any(|&candidate| {
                let symbol = control.symbol(candidate);
                symbol.name == Some(name)
                    && symbol.is_namespace()
                    && symbol.location.file_name == location.file_name
                    && symbol.location.token < location.token
            })
        });
        if declares_earlier {
            return;
        }

        for &using in &self.bindings[binding].usings {
            self.closure(control, location, using, name, out);
        }
    }

    /// Resolve a namespace name as seen from `binding`.
    ///
    /// Several candidates resolve to the first one found.
    pub fn resolve_namespace(
        &self,
        control: &Control,
        binding: BindingRef,
        location: &Location,
        name: Option<NameRef>,
        look_at_parent: bool,
    ) -> Option<BindingRef> {
        let name = name?;
        match control.name(name) {
            Name::Identifier(_) => {
                let mut closure = Vec::new();
                self.closure(control, location, binding, name, &mut closure);
                let mut results = closure
                    .iter()
                    .filter_map(|&b| self.find_namespace_binding(control, b, Some(name)));
                if let Some(first) = results.next() {
                    if results.next().is_some() {
                        debug!("ambiguous namespace {:?}, taking the first binding", name);
                    }
                    return Some(first);
                }
                match self.bindings[binding].parent {
                    Some(parent) if look_at_parent => self.resolve_namespace(control, parent, location, Some(name), true),
                    _ => None,
                }
            }
            Name::Qualified { names, global } => {
                let mut current = match global {
                    true => self.global_namespace_binding(binding),
                    false => binding,
                };
                let (&first, rest) = names.split_first()?;
                current = self.resolve_namespace(control, current, location, Some(first), true)?;
                for &segment in rest {
                    current = self.resolve_namespace(control, current, location, Some(segment), false)?;
                }
                Some(current)
            }
            _ => None,
        }
    }

    /// Indented text form of the tree, one binding per line.
    pub fn dump(&self, control: &Control) -> String {
        let mut out = String::new();
        self.dump_binding(control, self.root, 0, &mut out);
        out
    }

    fn dump_binding(&self, control: &Control, binding: BindingRef, depth: usize, out: &mut String) {
        let b = &self.bindings[binding];
        let label = match (b.parent, self.name(control, binding)) {
            (None, _) => "<global>".to_string(),
            (Some(_), None) => "<anonymous>".to_string(),
            (Some(_), Some(_)) => self.qualified_id(control, binding),
        };
        let _ = write!(out, "{:indent$}namespace {} ({} symbols)", "", label, b.symbols.len(), indent = depth * 2);
        for &using in &b.usings {
            let _ = write!(out, " using {}", self.qualified_id(control, using));
        }
        out.push('\n');
        for &child in &b.children {
            self.dump_binding(control, child, depth + 1, out);
        }
    }
}

/// Builds the binding tree of a global namespace.
pub struct Binder<'a> {
    control: &'a Control,
    diagnostics: &'a mut DiagnosticEngine,
}

impl<'a> Binder<'a> {
    pub fn new(control: &'a Control, diagnostics: &'a mut DiagnosticEngine) -> Self {
        Binder { control, diagnostics }
    }

    pub fn bind(&mut self, global_namespace: SymbolRef) -> NamespaceBindings {
        let mut bindings = NamespaceBindings::new(global_namespace);
        let root = bindings.root();
        self.bind_members(&mut bindings, global_namespace, root);
        debug!("bound {} namespace bindings", bindings.len());
        bindings
    }

    fn bind_members(&mut self, bindings: &mut NamespaceBindings, namespace: SymbolRef, binding: BindingRef) {
        let Some(members) = self.control.symbol(namespace).members() else {
            return;
        };
        for &member in self.control.scope(members).symbols() {
            self.bind_symbol(bindings, member, binding);
        }
    }

    fn bind_symbol(&mut self, bindings: &mut NamespaceBindings, symbol: SymbolRef, binding: BindingRef) {
        let control = self.control;
        let s = control.symbol(symbol);
        match &s.kind {
            SymbolKind::Namespace { .. } => {
                let child = bindings.find_or_create(control, binding, symbol);
                self.bind_members(bindings, symbol, child);
            }
            SymbolKind::UsingNamespaceDirective => {
                match bindings.resolve_namespace(control, binding, &s.location, s.name, true) {
                    Some(resolved) => {
                        debug!(
                            "using namespace {} in {:?}",
                            bindings.qualified_id(control, resolved),
                            binding
                        );
                        bindings.bindings[binding].usings.push(resolved);
                    }
                    None => {
                        self.diagnostics.report_semantic_error(
                            SemanticError::ExpectedNamespaceName,
                            s.location.file_name.as_str(),
                            s.location.line,
                            s.location.column,
                        );
                    }
                }
            }
            // classes, functions and blocks do not contribute namespaces
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringId;

    struct Fixture {
        control: Control,
        global: SymbolRef,
        next_token: u32,
    }

    impl Fixture {
        fn new() -> Self {
            let _ = env_logger::try_init();
            let mut control = Control::new();
            let global = control.new_namespace(Location::default(), None);
            Fixture {
                control,
                global,
                next_token: 1,
            }
        }

        fn location(&mut self) -> Location {
            self.next_token += 1;
            Location::new(StringId::new("a.cpp"), self.next_token, self.next_token, 1)
        }

        fn namespace(&mut self, parent: SymbolRef, name: Option<&str>) -> SymbolRef {
            let location = self.location();
            let name = name.map(|name| self.control.identifier(name));
            let namespace = self.control.new_namespace(location, name);
            let members = self.control.symbol(parent).members().unwrap();
            self.control.enter_symbol(members, namespace);
            namespace
        }

        fn using(&mut self, parent: SymbolRef, path: &[&str]) -> SymbolRef {
            let location = self.location();
            let names: Vec<_> = path.iter().map(|name| self.control.identifier(name)).collect();
            let name = match names.as_slice() {
                [single] => *single,
                _ => self.control.qualified_name(names, false),
            };
            let directive = self.control.new_using_namespace_directive(location, Some(name));
            let members = self.control.symbol(parent).members().unwrap();
            self.control.enter_symbol(members, directive);
            directive
        }

        fn bind(&self, diagnostics: &mut DiagnosticEngine) -> NamespaceBindings {
            Binder::new(&self.control, diagnostics).bind(self.global)
        }
    }

    #[test]
    fn test_reopened_namespace_shares_binding() {
        let mut fx = Fixture::new();
        let global = fx.global;
        let first = fx.namespace(global, Some("N"));
        let second = fx.namespace(global, Some("N"));
        let mut diagnostics = DiagnosticEngine::new();
        let bindings = fx.bind(&mut diagnostics);

        let root = bindings.root();
        assert_eq!(bindings[root].children.len(), 1);
        let n = bindings[root].children[0];
        assert_eq!(bindings[n].symbols, vec![first, second]);
        assert_eq!(bindings.qualified_id(&fx.control, n), "N");
        assert_eq!(bindings.global_namespace_binding(n), root);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nested_and_anonymous_namespaces() {
        let mut fx = Fixture::new();
        let global = fx.global;
        let a = fx.namespace(global, Some("A"));
        fx.namespace(a, Some("B"));
        fx.namespace(global, None);
        fx.namespace(global, None);
        let mut diagnostics = DiagnosticEngine::new();
        let bindings = fx.bind(&mut diagnostics);

        let root = bindings.root();
        let anonymous = bindings[root].anonymous.unwrap();
        assert_eq!(bindings[anonymous].symbols.len(), 2);

        let a_name = fx.control.identifier("A");
        let a_binding = bindings.find_namespace_binding(&fx.control, root, Some(a_name)).unwrap();
        let b_binding = bindings[a_binding].children[0];
        assert_eq!(bindings.qualified_id(&fx.control, b_binding), "A::B");
        insta::assert_snapshot!(bindings.dump(&fx.control).trim_end(), @r"
        namespace <global> (1 symbols)
          namespace A (1 symbols)
            namespace A::B (1 symbols)
          namespace <anonymous> (2 symbols)
        ");
    }

    #[test]
    fn test_using_directive_resolution() {
        let mut fx = Fixture::new();
        let global = fx.global;
        let a = fx.namespace(global, Some("A"));
        fx.namespace(a, Some("B"));
        let c = fx.namespace(global, Some("C"));
        fx.using(c, &["A"]);
        fx.using(c, &["B"]);
        fx.using(global, &["A", "B"]);
        let mut diagnostics = DiagnosticEngine::new();
        let bindings = fx.bind(&mut diagnostics);

        let root = bindings.root();
        let c_binding = bindings[root].children[1];
        let usings: Vec<_> = bindings[c_binding]
            .usings
            .iter()
            .map(|&u| bindings.qualified_id(&fx.control, u))
            .collect();
        assert_eq!(usings, vec!["A", "A::B"]);
        assert_eq!(bindings.qualified_id(&fx.control, bindings[root].usings[0]), "A::B");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_namespace_is_an_error() {
        let mut fx = Fixture::new();
        let global = fx.global;
        fx.using(global, &["Missing"]);
        let mut diagnostics = DiagnosticEngine::new();
        let bindings = fx.bind(&mut diagnostics);

        assert!(bindings[bindings.root()].usings.is_empty());
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.diagnostics[0].text, "expected namespace-name");
    }

    #[test]
    fn test_cyclic_usings_terminate() {
        let mut fx = Fixture::new();
        let global = fx.global;
        fx.namespace(global, Some("A"));
        fx.namespace(global, Some("B"));
        let a = fx.namespace(global, Some("A"));
        fx.using(a, &["B"]);
        let b = fx.namespace(global, Some("B"));
        fx.using(b, &["A"]);
        let mut diagnostics = DiagnosticEngine::new();
        let bindings = fx.bind(&mut diagnostics);
        assert!(diagnostics.is_empty());

        let root = bindings.root();
        let (a_binding, b_binding) = (bindings[root].children[0], bindings[root].children[1]);
        assert_eq!(bindings[a_binding].usings, vec![b_binding]);
        assert_eq!(bindings[b_binding].usings, vec![a_binding]);

        let missing = fx.control.identifier("Nowhere");
        let location = Location::default();
        assert_eq!(
            bindings.resolve_namespace(&fx.control, a_binding, &location, Some(missing), false),
            None
        );
    }
}
