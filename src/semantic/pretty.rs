//! Printing names and types as C++ source text.
//!
//! Types print declarator style: the declarator text grows from the
//! declared name outwards, so `int (*)(char)` is a pointer to a function
//! taking a `char` and returning an `int`.

use itertools::Itertools;

use crate::semantic::control::Control;
use crate::semantic::names::{Name, NameRef};
use crate::semantic::symbols::{FunctionFlags, SymbolKind, SymbolRef};
use crate::semantic::types::{FloatKind, FullySpecifiedType, IntegerKind, Type};

/// Options shared by the name and type printers.
#[derive(Debug, Clone, Copy)]
pub struct Overview {
    pub show_argument_names: bool,
    pub show_return_types: bool,
}

impl Default for Overview {
    fn default() -> Self {
        Overview {
            show_argument_names: false,
            show_return_types: true,
        }
    }
}

impl Overview {
    pub fn new() -> Self {
        Overview::default()
    }

    pub fn pretty_name(&self, control: &Control, name: Option<NameRef>) -> String {
        NamePrettyPrinter::new(self, control).print(name)
    }

    /// Print `ty` as the type of a declarator named `name`.
    pub fn pretty_type(&self, control: &Control, ty: FullySpecifiedType, name: Option<NameRef>) -> String {
        let name = self.pretty_name(control, name);
        TypePrettyPrinter::new(self, control).print(ty, &name)
    }
}

pub struct NamePrettyPrinter<'a> {
    overview: &'a Overview,
    control: &'a Control,
}

impl<'a> NamePrettyPrinter<'a> {
    pub fn new(overview: &'a Overview, control: &'a Control) -> Self {
        NamePrettyPrinter { overview, control }
    }

    /// The source spelling of a name, empty for an anonymous one.
    pub fn print(&self, name: Option<NameRef>) -> String {
        let Some(name) = name else {
            return String::new();
        };
        match self.control.name(name) {
            Name::Identifier(id) => id.as_str().to_string(),
            Name::Destructor(id) => format!("~{}", id.as_str()),
            Name::Template { identifier, arguments } => {
                let types = TypePrettyPrinter::new(self.overview, self.control);
                let arguments = arguments
                    .iter()
                    .enumerate()
                    .map(|(index, &argument)| match argument.is_valid() {
                        true => types.print(argument, ""),
                        false => format!("_Tp{}", index + 1),
                    })
                    .join(", ");
                format!("{}<{}>", identifier.as_str(), arguments)
            }
            Name::Operator(op) if op.is_word() => format!("operator {}", op.spelling()),
            Name::Operator(op) => format!("operator{}", op.spelling()),
            Name::Conversion(ty) => {
                let types = TypePrettyPrinter::new(self.overview, self.control);
                format!("operator {}", types.print(*ty, ""))
            }
            Name::Qualified { names, global } => {
                let path = names.iter().map(|&n| self.print(Some(n))).join("::");
                match global {
                    true => format!("::{path}"),
                    false => path,
                }
            }
            Name::Selector { names, has_arguments } => {
                let mut parts = names.iter().map(|&n| self.print(Some(n)));
                match has_arguments {
                    true => parts.map(|part| part + ":").collect(),
                    false => parts.join(""),
                }
            }
        }
    }
}

pub struct TypePrettyPrinter<'a> {
    overview: &'a Overview,
    control: &'a Control,
}

impl<'a> TypePrettyPrinter<'a> {
    pub fn new(overview: &'a Overview, control: &'a Control) -> Self {
        TypePrettyPrinter { overview, control }
    }

    pub fn print(&self, ty: FullySpecifiedType, name: &str) -> String {
        let mut declarator = name.to_string();
        let mut current = ty;
        let base = loop {
            let Some(type_ref) = current.ty else {
                break String::new();
            };
            match self.control.type_of(type_ref) {
                Type::Pointer(element) => {
                    declarator = Self::ptr_operator("*", current, &declarator);
                    current = *element;
                }
                Type::Reference(element) => {
                    declarator = format!("&{declarator}");
                    current = *element;
                }
                Type::PointerToMember { member_name, element } => {
                    let class_name = NamePrettyPrinter::new(self.overview, self.control).print(Some(*member_name));
                    declarator = Self::ptr_operator(&format!("{class_name}::*"), current, &declarator);
                    current = *element;
                }
                Type::Array { element, size } => {
                    declarator = Self::parenthesize(declarator);
                    match size {
                        0 => declarator.push_str("[]"),
                        size => declarator.push_str(&format!("[{size}]")),
                    }
                    current = *element;
                }
                Type::Function(function) | Type::ObjCMethod(function) => {
                    declarator = Self::parenthesize(declarator);
                    declarator.push_str(&self.signature(*function));
                    if !self.overview.show_return_types {
                        break String::new();
                    }
                    current = self.return_type(*function);
                }
                other => break self.base_type(current, other),
            }
        };

        match (base.is_empty(), declarator.is_empty()) {
            (_, true) => base,
            (true, false) => declarator,
            (false, false) => format!("{base} {declarator}"),
        }
    }

    fn ptr_operator(op: &str, ty: FullySpecifiedType, declarator: &str) -> String {
        let mut out = op.to_string();
        if ty.is_const() {
            out.push_str(" const");
        }
        if ty.is_volatile() {
            out.push_str(" volatile");
        }
        if out.len() > op.len() && !declarator.is_empty() {
            out.push(' ');
        }
        out.push_str(declarator);
        out
    }

    /// Wrap a pending pointer declarator so postfix declarators bind to it.
    fn parenthesize(declarator: String) -> String {
        let pending = declarator.starts_with(['*', '&']) || declarator.contains("::*");
        match pending {
            true => format!("({declarator})"),
            false => declarator,
        }
    }

    fn return_type(&self, function: SymbolRef) -> FullySpecifiedType {
        match &self.control.symbol(function).kind {
            SymbolKind::Function(data) => data.return_type,
            SymbolKind::ObjCMethod(data) => data.return_type,
            _ => FullySpecifiedType::default(),
        }
    }

    fn signature(&self, function: SymbolRef) -> String {
        let (arguments, flags) = match &self.control.symbol(function).kind {
            SymbolKind::Function(data) => (data.arguments, data.flags),
            SymbolKind::ObjCMethod(data) => (
                data.arguments,
                match data.is_variadic {
                    true => FunctionFlags::VARIADIC,
                    false => FunctionFlags::empty(),
                },
            ),
            _ => return "()".to_string(),
        };

        let names = NamePrettyPrinter::new(self.overview, self.control);
        let mut parts: Vec<String> = self
            .control
            .scope(arguments)
            .symbols()
            .iter()
            .map(|&argument| {
                let symbol = self.control.symbol(argument);
                let name = match self.overview.show_argument_names {
                    true => names.print(symbol.name),
                    false => String::new(),
                };
                self.print(symbol.ty(), &name)
            })
            .collect();
        if flags.contains(FunctionFlags::VARIADIC) {
            parts.push("...".to_string());
        }

        let mut out = format!("({})", parts.join(", "));
        if flags.contains(FunctionFlags::CONST) {
            out.push_str(" const");
        }
        if flags.contains(FunctionFlags::VOLATILE) {
            out.push_str(" volatile");
        }
        out
    }

    fn base_type(&self, ty: FullySpecifiedType, kind: &Type) -> String {
        let mut out = String::new();
        if ty.is_const() {
            out.push_str("const ");
        }
        if ty.is_volatile() {
            out.push_str("volatile ");
        }
        if ty.is_signed() {
            out.push_str("signed ");
        }
        if ty.is_unsigned() {
            out.push_str("unsigned ");
        }

        let names = NamePrettyPrinter::new(self.overview, self.control);
        let spelling = match kind {
            Type::Void => "void".to_string(),
            Type::Integer(kind) => match kind {
                IntegerKind::Char => "char",
                IntegerKind::WideChar => "wchar_t",
                IntegerKind::Bool => "bool",
                IntegerKind::Short => "short",
                IntegerKind::Int => "int",
                IntegerKind::Long => "long",
                IntegerKind::LongLong => "long long",
            }
            .to_string(),
            Type::Float(kind) => match kind {
                FloatKind::Float => "float",
                FloatKind::Double => "double",
                FloatKind::LongDouble => "long double",
            }
            .to_string(),
            Type::Named(name) => names.print(Some(*name)),
            other => match other.symbol() {
                Some(symbol) => names.print(self.control.symbol(symbol).name),
                None => String::new(),
            },
        };
        out.push_str(&spelling);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringId;
    use crate::semantic::names::OperatorKind;
    use crate::semantic::symbols::Location;
    use crate::semantic::types::TypeFlags;

    fn int(control: &mut Control) -> FullySpecifiedType {
        FullySpecifiedType::new(control.integer_type(IntegerKind::Int))
    }

    fn function(control: &mut Control, name: Option<NameRef>, arguments: &[FullySpecifiedType]) -> SymbolRef {
        let function = control.new_function(Location::default(), name);
        let scope = control.symbol(function).as_function().unwrap().arguments;
        for &ty in arguments {
            let argument = control.new_argument(Location::default(), None);
            control.symbol_mut(argument).ty = ty;
            control.enter_symbol(scope, argument);
        }
        let return_type = int(control);
        control.symbol_mut(function).as_function_mut().unwrap().return_type = return_type;
        function
    }

    #[test]
    fn test_names() {
        let mut control = Control::new();
        let overview = Overview::new();
        let a = control.identifier("a");
        let b = control.identifier("b");
        let dtor = control.destructor_name(StringId::new("X"));
        let plus = control.operator_name(OperatorKind::Plus);
        let new = control.operator_name(OperatorKind::New);
        let qualified = control.qualified_name(vec![a, b], false);
        let global = control.qualified_name(vec![a], true);
        let int = int(&mut control);
        let conversion = control.conversion_name(int);
        let template = control.template_name(StringId::new("T"), vec![int, FullySpecifiedType::default()]);
        let selector = control.selector_name(vec![a, b], true);
        let unary_selector = control.selector_name(vec![a], false);

        let print = |name| overview.pretty_name(&control, name);
        assert_eq!(print(Some(a)), "a");
        assert_eq!(print(Some(dtor)), "~X");
        assert_eq!(print(Some(plus)), "operator+");
        assert_eq!(print(Some(new)), "operator new");
        assert_eq!(print(Some(qualified)), "a::b");
        assert_eq!(print(Some(global)), "::a");
        assert_eq!(print(Some(conversion)), "operator int");
        assert_eq!(print(Some(template)), "T<int, _Tp2>");
        assert_eq!(print(Some(selector)), "a:b:");
        assert_eq!(print(Some(unary_selector)), "a");
        assert_eq!(print(None), "");
    }

    #[test]
    fn test_pointer_and_reference_types() {
        let mut control = Control::new();
        let overview = Overview::new();
        let int_ty = int(&mut control);
        let const_int = FullySpecifiedType::with_flags(int_ty.ty, TypeFlags::CONST);
        let ptr = FullySpecifiedType::new(control.pointer_type(const_int));
        let const_ptr = FullySpecifiedType::with_flags(Some(control.pointer_type(int_ty)), TypeFlags::CONST);
        let reference = FullySpecifiedType::new(control.reference_type(int_ty));
        let array = FullySpecifiedType::new(control.array_type(int_ty, 10));
        let p = control.identifier("p");

        assert_eq!(overview.pretty_type(&control, ptr, None), "const int *");
        assert_eq!(overview.pretty_type(&control, const_ptr, Some(p)), "int * const p");
        assert_eq!(overview.pretty_type(&control, reference, None), "int &");
        assert_eq!(overview.pretty_type(&control, array, None), "int [10]");

        let unsigned = FullySpecifiedType::with_flags(int_ty.ty, TypeFlags::UNSIGNED);
        assert_eq!(overview.pretty_type(&control, unsigned, None), "unsigned int");
    }

    #[test]
    fn test_function_types() {
        let mut control = Control::new();
        let overview = Overview::new();
        let char_ty = FullySpecifiedType::new(control.integer_type(IntegerKind::Char));
        let int_ty = int(&mut control);

        let callback = function(&mut control, None, &[char_ty]);
        let callback_ty = control.symbol(callback).ty();
        let pointer = FullySpecifiedType::new(control.pointer_type(callback_ty));
        assert_eq!(overview.pretty_type(&control, pointer, None), "int (*)(char)");

        let f = control.identifier("f");
        let method = function(&mut control, Some(f), &[int_ty, char_ty]);
        control.symbol_mut(method).as_function_mut().unwrap().flags |= FunctionFlags::CONST;
        let method_ty = control.symbol(method).ty();
        assert_eq!(overview.pretty_type(&control, method_ty, None), "int (int, char) const");
        assert_eq!(overview.pretty_type(&control, method_ty, Some(f)), "int f(int, char) const");

        let without_return = Overview {
            show_return_types: false,
            ..Overview::default()
        };
        assert_eq!(without_return.pretty_type(&control, method_ty, Some(f)), "f(int, char) const");
    }

    #[test]
    fn test_argument_names() {
        let mut control = Control::new();
        let overview = Overview {
            show_argument_names: true,
            ..Overview::default()
        };
        let int_ty = int(&mut control);
        let g = control.identifier("g");
        let function = control.new_function(Location::default(), Some(g));
        let scope = control.symbol(function).as_function().unwrap().arguments;
        let x = control.identifier("x");
        let argument = control.new_argument(Location::default(), Some(x));
        control.symbol_mut(argument).ty = int_ty;
        control.enter_symbol(scope, argument);
        {
            let data = control.symbol_mut(function).as_function_mut().unwrap();
            data.return_type = int_ty;
            data.flags |= FunctionFlags::VARIADIC;
        }
        let ty = control.symbol(function).ty();
        assert_eq!(overview.pretty_type(&control, ty, Some(g)), "int g(int x, ...)");
    }
}
