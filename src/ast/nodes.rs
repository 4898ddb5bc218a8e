//! AST node definitions.
//!
//! Every node kind is declared once in the [`with_node_kinds`] table. The
//! table expands into one struct per kind, the [`NodeKind`] enum wrapping
//! them, slot enumeration (used for token spans, child walks and dumping),
//! structural copying, and the visitor trait in [`super::visitor`].
//!
//! Field markers:
//! - `token`: token index, `0` when absent
//! - `node`: optional child
//! - `list`: ordered children
//! - `symbol` / `symbols`: back-annotation written by the semantic pass
//! - `name`: the semantic name computed for a name node

use std::cell::{Cell, RefCell};
use thin_vec::ThinVec;

use crate::ast::NodeRef;
use crate::semantic::{NameRef, SymbolRef};

/// One syntactic slot of a node, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    Token(u32),
    Node(Option<NodeRef>),
    List(&'a [NodeRef]),
}

macro_rules! field_type {
    (token) => { u32 };
    (node) => { Option<NodeRef> };
    (list) => { ThinVec<NodeRef> };
    (symbol) => { Cell<Option<SymbolRef>> };
    (symbols) => { RefCell<ThinVec<SymbolRef>> };
    (name) => { Cell<Option<NameRef>> };
}

macro_rules! push_slot {
    (token, $slots:ident, $value:expr) => { $slots.push(Slot::Token($value)) };
    (node, $slots:ident, $value:expr) => { $slots.push(Slot::Node($value)) };
    (list, $slots:ident, $value:expr) => { $slots.push(Slot::List($value.as_slice())) };
    (symbol, $slots:ident, $value:expr) => {};
    (symbols, $slots:ident, $value:expr) => {};
    (name, $slots:ident, $value:expr) => {};
}

macro_rules! map_field {
    (token, $value:expr, $f:ident) => { $value };
    (node, $value:expr, $f:ident) => { $value.map(|child| $f(child)) };
    (list, $value:expr, $f:ident) => { $value.iter().map(|child| $f(*child)).collect() };
    (symbol, $value:expr, $f:ident) => { Cell::new(None) };
    (symbols, $value:expr, $f:ident) => { RefCell::default() };
    (name, $value:expr, $f:ident) => { Cell::new(None) };
}

macro_rules! read_symbol {
    (symbol, $value:expr, $out:ident) => { if $out.is_none() { $out = $value.get(); } };
    ($other:ident, $value:expr, $out:ident) => {};
}

macro_rules! read_name {
    (name, $value:expr, $out:ident) => { if $out.is_none() { $out = $value.get(); } };
    ($other:ident, $value:expr, $out:ident) => {};
}

macro_rules! define_nodes {
    ($(
        $(#[$meta:meta])*
        $kind:ident => $snake:ident { $($field:ident : $marker:ident),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default)]
            pub struct $kind {
                $(pub $field: field_type!($marker),)*
            }

            impl $kind {
                /// Syntactic slots in declaration order
                pub fn slots(&self) -> Vec<Slot<'_>> {
                    let mut slots = Vec::new();
                    $(push_slot!($marker, slots, self.$field);)*
                    slots
                }

                /// Copy with every child mapped through `f` and annotations cleared
                pub fn map_children(&self, f: &mut dyn FnMut(NodeRef) -> NodeRef) -> Self {
                    $kind {
                        $($field: map_field!($marker, self.$field, f),)*
                    }
                }

                #[allow(unused_mut)]
                pub fn symbol(&self) -> Option<SymbolRef> {
                    let mut symbol = None;
                    $(read_symbol!($marker, self.$field, symbol);)*
                    symbol
                }

                #[allow(unused_mut)]
                pub fn semantic_name(&self) -> Option<NameRef> {
                    let mut name = None;
                    $(read_name!($marker, self.$field, name);)*
                    name
                }
            }

            impl From<$kind> for NodeKind {
                fn from(node: $kind) -> Self {
                    NodeKind::$kind(node)
                }
            }
        )*

        /// Tagged union over every node kind
        #[derive(Debug, Clone)]
        pub enum NodeKind {
            $($kind($kind),)*
        }

        impl NodeKind {
            /// Name of the kind, e.g. `SimpleDeclaration`
            pub fn kind_name(&self) -> &'static str {
                match self {
                    $(NodeKind::$kind(_) => stringify!($kind),)*
                }
            }

            pub fn slots(&self) -> Vec<Slot<'_>> {
                match self {
                    $(NodeKind::$kind(n) => n.slots(),)*
                }
            }

            pub fn map_children(&self, f: &mut dyn FnMut(NodeRef) -> NodeRef) -> NodeKind {
                match self {
                    $(NodeKind::$kind(n) => NodeKind::$kind(n.map_children(f)),)*
                }
            }

            /// The symbol recorded on this node by the semantic pass
            pub fn symbol(&self) -> Option<SymbolRef> {
                match self {
                    $(NodeKind::$kind(n) => n.symbol(),)*
                }
            }

            /// The semantic name recorded on a name node
            pub fn semantic_name(&self) -> Option<NameRef> {
                match self {
                    $(NodeKind::$kind(n) => n.semantic_name(),)*
                }
            }
        }
    };
}

/// Expands `$callback!` with the full node table.
macro_rules! with_node_kinds {
    ($callback:ident) => {
        $callback! {
            // ---- specifiers ----
            /// `const`, `int`, `static`, ...
            SimpleSpecifier => simple_specifier { specifier: token }
            /// `__attribute__((...))`
            AttributeSpecifier => attribute_specifier {
                attribute_kw: token, first_lparen: token, second_lparen: token,
                attributes: list, first_rparen: token, second_rparen: token,
            }
            Attribute => attribute {
                identifier: token, lparen: token, tag: token, expressions: list, rparen: token,
            }
            TypeofSpecifier => typeof_specifier {
                typeof_kw: token, lparen: token, expression: node, rparen: token,
            }
            NamedTypeSpecifier => named_type_specifier { name: node }
            /// `class X` used as a type
            ElaboratedTypeSpecifier => elaborated_type_specifier { classkey: token, name: node }
            ClassSpecifier => class_specifier {
                classkey: token, attributes: list, name: node, colon: token, base_clause: list,
                lbrace: token, member_specifiers: list, rbrace: token, symbol: symbol,
            }
            BaseSpecifier => base_specifier {
                virtual_kw: token, access_specifier: token, name: node, symbol: symbol,
            }
            EnumSpecifier => enum_specifier {
                enum_kw: token, name: node, lbrace: token, enumerators: list, rbrace: token,
                symbol: symbol,
            }
            Enumerator => enumerator { identifier: token, equal: token, expression: node }

            // ---- declarators ----
            Declarator => declarator {
                attributes: list, ptr_operators: list, core_declarator: node,
                postfix_declarators: list, post_attributes: list, equal: token, initializer: node,
            }
            DeclaratorId => declarator_id { name: node }
            NestedDeclarator => nested_declarator { lparen: token, declarator: node, rparen: token }
            FunctionDeclarator => function_declarator {
                lparen: token, parameters: node, rparen: token, cv_qualifiers: list,
                exception_specification: node, as_cpp_initializer: node, symbol: symbol,
            }
            ArrayDeclarator => array_declarator { lbracket: token, expression: node, rbracket: token }
            PointerToMember => pointer_to_member {
                global_scope: token, nested_name_specifiers: list, star: token, cv_qualifiers: list,
            }
            Pointer => pointer { star: token, cv_qualifiers: list }
            Reference => reference { amp: token }

            // ---- declarations ----
            SimpleDeclaration => simple_declaration {
                qt_invokable: token, decl_specifiers: list, declarators: list, semicolon: token,
                symbols: symbols,
            }
            EmptyDeclaration => empty_declaration { semicolon: token }
            /// `public:`, `private slots:`, `signals:`
            AccessDeclaration => access_declaration {
                access_specifier: token, slots_kw: token, colon: token,
            }
            AsmDefinition => asm_definition {
                asm_kw: token, volatile_kw: token, lparen: token, rparen: token, semicolon: token,
            }
            FunctionDefinition => function_definition {
                qt_invokable: token, decl_specifiers: list, declarator: node,
                ctor_initializer: node, function_body: node, symbol: symbol,
            }
            LinkageBody => linkage_body { lbrace: token, declarations: list, rbrace: token }
            /// `extern "C" ...`
            LinkageSpecification => linkage_specification {
                extern_kw: token, extern_type: token, declaration: node,
            }
            Namespace => namespace {
                namespace_kw: token, identifier: token, attributes: list, linkage_body: node,
                symbol: symbol,
            }
            NamespaceAliasDefinition => namespace_alias_definition {
                namespace_kw: token, namespace_name: token, equal: token, name: node,
                semicolon: token,
            }
            TemplateDeclaration => template_declaration {
                export_kw: token, template_kw: token, less: token, template_parameters: list,
                greater: token, declaration: node,
            }
            /// `typename T = int` / `class T`
            TypenameTypeParameter => typename_type_parameter {
                classkey: token, name: node, equal: token, type_id: node, symbol: symbol,
            }
            /// `template <...> class T`
            TemplateTypeParameter => template_type_parameter {
                template_kw: token, less: token, template_parameters: list, greater: token,
                class_kw: token, name: node, equal: token, type_id: node, symbol: symbol,
            }
            UsingDeclaration => using_declaration {
                using_kw: token, typename_kw: token, name: node, semicolon: token, symbol: symbol,
            }
            UsingDirective => using_directive {
                using_kw: token, namespace_kw: token, name: node, semicolon: token, symbol: symbol,
            }
            ParameterDeclaration => parameter_declaration {
                type_specifiers: list, declarator: node, equal: token, expression: node,
                symbol: symbol,
            }
            ParameterDeclarationClause => parameter_declaration_clause {
                parameter_declarations: list, dot_dot_dot: token,
            }
            CtorInitializer => ctor_initializer { colon: token, member_initializers: list }
            MemInitializer => mem_initializer {
                name: node, lparen: token, expressions: list, rparen: token,
            }
            ExceptionSpecification => exception_specification {
                throw_kw: token, lparen: token, dot_dot_dot: token, type_ids: list, rparen: token,
            }
            ExceptionDeclaration => exception_declaration {
                type_specifiers: list, declarator: node, dot_dot_dot: token,
            }

            // ---- names ----
            SimpleName => simple_name { identifier: token, name: name }
            DestructorName => destructor_name { tilde: token, identifier: token, name: name }
            TemplateId => template_id {
                identifier: token, less: token, template_arguments: list, greater: token,
                name: name,
            }
            OperatorFunctionId => operator_function_id { operator_kw: token, op: node, name: name }
            ConversionFunctionId => conversion_function_id {
                operator_kw: token, type_specifiers: list, ptr_operators: list, name: name,
            }
            QualifiedName => qualified_name {
                global_scope: token, nested_name_specifiers: list, unqualified_name: node,
                name: name,
            }
            NestedNameSpecifier => nested_name_specifier {
                class_or_namespace_name: node, scope: token,
            }
            /// The operator of an operator-function-id; `open`/`close` for `()`, `[]`, `new[]`
            Operator => operator { op: token, open: token, close: token }

            // ---- expressions ----
            BinaryExpression => binary_expression { left: node, op: token, right: node }
            CastExpression => cast_expression {
                lparen: token, type_id: node, rparen: token, expression: node,
            }
            ConditionalExpression => conditional_expression {
                condition: node, question: token, left: node, colon: token, right: node,
            }
            CppCastExpression => cpp_cast_expression {
                cast_kw: token, less: token, type_id: node, greater: token, lparen: token,
                expression: node, rparen: token,
            }
            DeleteExpression => delete_expression {
                scope: token, delete_kw: token, lbracket: token, rbracket: token, expression: node,
            }
            NewExpression => new_expression {
                scope: token, new_kw: token, new_placement: node, lparen: token, type_id: node,
                rparen: token, new_type_id: node, new_initializer: node,
            }
            NewPlacement => new_placement { lparen: token, expressions: list, rparen: token }
            NewArrayDeclarator => new_array_declarator {
                lbracket: token, expression: node, rbracket: token,
            }
            NewInitializer => new_initializer { lparen: token, expression: node, rparen: token }
            NewTypeId => new_type_id {
                type_specifiers: list, ptr_operators: list, new_array_declarators: list,
            }
            TypeidExpression => typeid_expression {
                typeid_kw: token, lparen: token, expression: node, rparen: token,
            }
            TypenameCallExpression => typename_call_expression {
                typename_kw: token, name: node, lparen: token, expressions: list, rparen: token,
            }
            /// `T(args)` with a builtin or named type
            TypeConstructorCall => type_constructor_call {
                type_specifiers: list, lparen: token, expressions: list, rparen: token,
            }
            PostfixExpression => postfix_expression { base_expression: node, postfix_expressions: list }
            Call => call { lparen: token, expressions: list, rparen: token }
            ArrayAccess => array_access { lbracket: token, expression: node, rbracket: token }
            PostIncrDecr => post_incr_decr { incr_decr: token }
            MemberAccess => member_access { access: token, template_kw: token, member_name: node }
            SizeofExpression => sizeof_expression {
                sizeof_kw: token, lparen: token, expression: node, rparen: token,
            }
            NumericLiteral => numeric_literal { literal: token }
            BoolLiteral => bool_literal { literal: token }
            ThisExpression => this_expression { this_kw: token }
            NestedExpression => nested_expression { lparen: token, expression: node, rparen: token }
            /// Adjacent string literals chain through `next`
            StringLiteral => string_literal { literal: token, next: node }
            ThrowExpression => throw_expression { throw_kw: token, expression: node }
            TypeId => type_id { type_specifiers: list, declarator: node }
            UnaryExpression => unary_expression { op: token, expression: node }
            CompoundLiteral => compound_literal {
                lparen: token, type_id: node, rparen: token, initializer: node,
            }
            /// `SIGNAL(f(int))` / `SLOT(g())`
            QtMethod => qt_method { method: token, lparen: token, declarator: node, rparen: token }
            ArrayInitializer => array_initializer { lbrace: token, expressions: list, rbrace: token }
            Condition => condition { type_specifiers: list, declarator: node }

            // ---- statements ----
            CaseStatement => case_statement {
                case_kw: token, expression: node, colon: token, statement: node,
            }
            CompoundStatement => compound_statement {
                lbrace: token, statements: list, rbrace: token, symbol: symbol,
            }
            DeclarationStatement => declaration_statement { declaration: node }
            DoStatement => do_statement {
                do_kw: token, statement: node, while_kw: token, lparen: token, expression: node,
                rparen: token, semicolon: token,
            }
            /// Statement that parses equally well as either
            ExpressionOrDeclarationStatement => expression_or_declaration_statement {
                expression: node, declaration: node,
            }
            ExpressionStatement => expression_statement { expression: node, semicolon: token }
            ForeachStatement => foreach_statement {
                foreach_kw: token, lparen: token, type_specifiers: list, declarator: node,
                initializer: node, comma: token, expression: node, rparen: token,
                statement: node, symbol: symbol,
            }
            ForStatement => for_statement {
                for_kw: token, lparen: token, initializer: node, condition: node, semicolon: token,
                expression: node, rparen: token, statement: node, symbol: symbol,
            }
            IfStatement => if_statement {
                if_kw: token, lparen: token, condition: node, rparen: token, statement: node,
                else_kw: token, else_statement: node, symbol: symbol,
            }
            LabeledStatement => labeled_statement { label: token, colon: token, statement: node }
            BreakStatement => break_statement { break_kw: token, semicolon: token }
            ContinueStatement => continue_statement { continue_kw: token, semicolon: token }
            GotoStatement => goto_statement { goto_kw: token, identifier: token, semicolon: token }
            ReturnStatement => return_statement {
                return_kw: token, expression: node, semicolon: token,
            }
            SwitchStatement => switch_statement {
                switch_kw: token, lparen: token, condition: node, rparen: token, statement: node,
                symbol: symbol,
            }
            TryBlockStatement => try_block_statement {
                try_kw: token, statement: node, catch_clauses: list,
            }
            CatchClause => catch_clause {
                catch_kw: token, lparen: token, exception_declaration: node, rparen: token,
                statement: node, symbol: symbol,
            }
            WhileStatement => while_statement {
                while_kw: token, lparen: token, condition: node, rparen: token, statement: node,
                symbol: symbol,
            }
            /// Root of a parsed file
            TranslationUnitDecl => translation_unit_decl { declarations: list }

            // ---- Objective-C ----
            ObjCClassForwardDeclaration => objc_class_forward_declaration {
                attributes: list, class_kw: token, identifiers: list, semicolon: token,
                symbols: symbols,
            }
            ObjCClassDeclaration => objc_class_declaration {
                attributes: list, interface_kw: token, implementation_kw: token, class_name: node,
                lparen: token, category_name: node, rparen: token, colon: token, superclass: node,
                protocol_refs: node, inst_vars_decl: node, member_declarations: list,
                end_kw: token, symbol: symbol,
            }
            ObjCProtocolForwardDeclaration => objc_protocol_forward_declaration {
                attributes: list, protocol_kw: token, identifiers: list, semicolon: token,
                symbols: symbols,
            }
            ObjCProtocolDeclaration => objc_protocol_declaration {
                attributes: list, protocol_kw: token, name: node, protocol_refs: node,
                member_declarations: list, end_kw: token, symbol: symbol,
            }
            ObjCProtocolRefs => objc_protocol_refs { less: token, identifiers: list, greater: token }
            ObjCMessageArgument => objc_message_argument { parameter_value_expression: node }
            ObjCMessageExpression => objc_message_expression {
                lbracket: token, receiver_expression: node, selector: node, arguments: list,
                rbracket: token,
            }
            ObjCProtocolExpression => objc_protocol_expression {
                protocol_kw: token, lparen: token, identifier: token, rparen: token,
            }
            ObjCTypeName => objc_type_name {
                lparen: token, type_qualifier: token, type_id: node, rparen: token,
            }
            ObjCEncodeExpression => objc_encode_expression { encode_kw: token, type_name: node }
            ObjCSelectorWithoutArguments => objc_selector_without_arguments {
                name_token: token, name: name,
            }
            ObjCSelectorArgument => objc_selector_argument { name_token: token, colon: token }
            ObjCSelectorWithArguments => objc_selector_with_arguments {
                selector_arguments: list, name: name,
            }
            ObjCSelectorExpression => objc_selector_expression {
                selector_kw: token, lparen: token, selector: node, rparen: token,
            }
            ObjCInstanceVariablesDeclaration => objc_instance_variables_declaration {
                lbrace: token, instance_variables: list, rbrace: token,
            }
            ObjCVisibilityDeclaration => objc_visibility_declaration { visibility: token }
            ObjCPropertyAttribute => objc_property_attribute {
                attribute_identifier: token, equal: token, method_selector: node,
            }
            ObjCPropertyDeclaration => objc_property_declaration {
                attributes: list, property_kw: token, lparen: token, property_attributes: list,
                rparen: token, simple_declaration: node,
            }
            ObjCMessageArgumentDeclaration => objc_message_argument_declaration {
                type_name: node, attributes: list, param_name: token, symbol: symbol,
            }
            ObjCMethodPrototype => objc_method_prototype {
                method_type: token, type_name: node, selector: node, arguments: list,
                dot_dot_dot: token, attributes: list, symbol: symbol,
            }
            ObjCMethodDeclaration => objc_method_declaration {
                method_prototype: node, function_body: node, semicolon: token,
            }
            ObjCSynthesizedProperty => objc_synthesized_property {
                property_identifier: token, equal: token, alias_identifier: token,
            }
            ObjCSynthesizedPropertiesDeclaration => objc_synthesized_properties_declaration {
                synthesize_kw: token, property_identifiers: list, semicolon: token,
            }
            ObjCDynamicPropertiesDeclaration => objc_dynamic_properties_declaration {
                dynamic_kw: token, property_identifiers: list, semicolon: token,
            }
            ObjCFastEnumeration => objc_fast_enumeration {
                for_kw: token, lparen: token, type_specifiers: list, declarator: node,
                initializer: node, in_token: token, fast_enumeratable_expression: node,
                rparen: token, body_statement: node, symbol: symbol,
            }
            ObjCSynchronizedStatement => objc_synchronized_statement {
                synchronized_kw: token, lparen: token, synchronized_object: node, rparen: token,
                statement: node,
            }
        }
    };
}

pub(crate) use with_node_kinds;

with_node_kinds!(define_nodes);

impl NodeKind {
    /// Child nodes in declaration order
    pub fn children(&self) -> Vec<NodeRef> {
        let mut children = Vec::new();
        for slot in self.slots() {
            match slot {
                Slot::Token(_) => {}
                Slot::Node(node) => children.extend(node),
                Slot::List(list) => children.extend_from_slice(list),
            }
        }
        children
    }

    /// Token indices held directly by this node, absent slots skipped
    pub fn tokens(&self) -> Vec<u32> {
        self.slots()
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Token(token) if token != 0 => Some(token),
                _ => None,
            })
            .collect()
    }

    pub fn is_name(&self) -> bool {
        matches!(
            self,
            NodeKind::SimpleName(_)
                | NodeKind::DestructorName(_)
                | NodeKind::TemplateId(_)
                | NodeKind::OperatorFunctionId(_)
                | NodeKind::ConversionFunctionId(_)
                | NodeKind::QualifiedName(_)
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::CaseStatement(_)
                | NodeKind::CompoundStatement(_)
                | NodeKind::DeclarationStatement(_)
                | NodeKind::DoStatement(_)
                | NodeKind::ExpressionOrDeclarationStatement(_)
                | NodeKind::ExpressionStatement(_)
                | NodeKind::ForeachStatement(_)
                | NodeKind::ForStatement(_)
                | NodeKind::IfStatement(_)
                | NodeKind::LabeledStatement(_)
                | NodeKind::BreakStatement(_)
                | NodeKind::ContinueStatement(_)
                | NodeKind::GotoStatement(_)
                | NodeKind::ReturnStatement(_)
                | NodeKind::SwitchStatement(_)
                | NodeKind::TryBlockStatement(_)
                | NodeKind::CatchClause(_)
                | NodeKind::WhileStatement(_)
                | NodeKind::ObjCFastEnumeration(_)
                | NodeKind::ObjCSynchronizedStatement(_)
        )
    }

    /// Annotation slot for node kinds that record a list of symbols
    pub fn symbol_list(&self) -> Option<&RefCell<ThinVec<SymbolRef>>> {
        match self {
            NodeKind::SimpleDeclaration(n) => Some(&n.symbols),
            NodeKind::ObjCClassForwardDeclaration(n) => Some(&n.symbols),
            NodeKind::ObjCProtocolForwardDeclaration(n) => Some(&n.symbols),
            _ => None,
        }
    }
}
