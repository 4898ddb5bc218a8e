use crate::lexer::Token;
use crate::StringId;
use indexmap::IndexMap;
use serde::Serialize;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MacroFlags: u8 {
        const FUNCTION_LIKE = 1 << 0;
        /// Last formal collects the trailing arguments (`...` or GNU `args...`)
        const VARIADIC = 1 << 1;
        const GNU_VARARGS = 1 << 2;
        /// Set while the macro's own expansion is being rescanned
        const DISABLED = 1 << 3;
    }
}

/// A macro definition
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: StringId,
    pub flags: MacroFlags,
    /// Formal parameters. A variadic macro stores `__VA_ARGS__` (or the GNU name) last.
    pub formals: Vec<StringId>,
    pub body: Vec<Token>,
    /// Replacement list as written
    pub definition: String,
    pub file_name: String,
    pub line: u32,
    /// Offset and length of the whole `#define` line in its file
    pub offset: u32,
    pub length: u32,
}

impl Macro {
    pub fn new(name: StringId) -> Self {
        Macro {
            name,
            flags: MacroFlags::empty(),
            formals: Vec::new(),
            body: Vec::new(),
            definition: String::new(),
            file_name: String::new(),
            line: 0,
            offset: 0,
            length: 0,
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.flags.contains(MacroFlags::FUNCTION_LIKE)
    }

    pub fn is_variadic(&self) -> bool {
        self.flags.contains(MacroFlags::VARIADIC)
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.contains(MacroFlags::DISABLED)
    }

    pub fn formal_index(&self, name: StringId) -> Option<usize> {
        self.formals.iter().position(|formal| *formal == name)
    }

    /// `NAME(a, b) body` style rendering
    pub fn signature(&self) -> String {
        let mut text = self.name.as_str().to_string();
        if self.is_function_like() {
            text.push('(');
            let formals: Vec<&str> = self
                .formals
                .iter()
                .map(|formal| {
                    if self.is_variadic() && formal.as_str() == "__VA_ARGS__" {
                        "..."
                    } else {
                        formal.as_str()
                    }
                })
                .collect();
            text.push_str(&formals.join(", "));
            if self.flags.contains(MacroFlags::GNU_VARARGS) {
                text.push_str("...");
            }
            text.push(')');
        }
        if !self.definition.is_empty() {
            text.push(' ');
            text.push_str(&self.definition);
        }
        text
    }
}

/// Serializable view of a macro for dumps
#[derive(Debug, Clone, Serialize)]
pub struct MacroSummary {
    pub name: String,
    pub file_name: String,
    pub line: u32,
    pub text: String,
}

impl From<&Macro> for MacroSummary {
    fn from(m: &Macro) -> Self {
        MacroSummary {
            name: m.name.as_str().to_string(),
            file_name: m.file_name.clone(),
            line: m.line,
            text: m.signature(),
        }
    }
}

/// Macro table plus the position the preprocessor is currently at.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    macros: IndexMap<StringId, Macro>,
    pub current_file: String,
    pub current_line: u32,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a macro. Returns the previous definition.
    pub fn bind(&mut self, m: Macro) -> Option<Macro> {
        log::trace!("bind macro {}", m.name);
        self.macros.insert(m.name, m)
    }

    pub fn remove(&mut self, name: StringId) -> Option<Macro> {
        self.macros.shift_remove(&name)
    }

    pub fn resolve(&self, name: StringId) -> Option<&Macro> {
        self.macros.get(&name)
    }

    pub fn is_defined(&self, name: StringId) -> bool {
        self.macros.contains_key(&name)
    }

    /// Copy every macro in `macros` into this environment.
    pub fn add_macros<'a>(&mut self, macros: impl IntoIterator<Item = &'a Macro>) {
        for m in macros {
            let mut copy = m.clone();
            copy.flags.remove(MacroFlags::DISABLED);
            self.macros.insert(copy.name, copy);
        }
    }

    pub(crate) fn set_disabled(&mut self, name: StringId, disabled: bool) {
        if let Some(m) = self.macros.get_mut(&name) {
            m.flags.set(MacroFlags::DISABLED, disabled);
        }
    }

    pub fn macros(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_bind_remove() {
        let mut env = Environment::new();
        let name = StringId::new("FOO");
        assert!(env.bind(Macro::new(name)).is_none());
        assert!(env.is_defined(name));
        assert!(env.bind(Macro::new(name)).is_some());
        assert!(env.remove(name).is_some());
        assert!(!env.is_defined(name));
    }

    #[test]
    fn test_add_macros_copies_values() {
        let mut source = Environment::new();
        let mut m = Macro::new(StringId::new("BAR"));
        m.definition = "1".into();
        m.flags |= MacroFlags::DISABLED;
        source.bind(m);

        let mut target = Environment::new();
        target.add_macros(source.macros());
        source.remove(StringId::new("BAR"));

        let copied = target.resolve(StringId::new("BAR")).map(|m| (m.definition.clone(), m.is_disabled()));
        assert_eq!(copied, Some(("1".to_string(), false)));
    }

    #[test]
    fn test_signature() {
        let mut m = Macro::new(StringId::new("LOG"));
        m.flags = MacroFlags::FUNCTION_LIKE | MacroFlags::VARIADIC;
        m.formals = vec![StringId::new("fmt"), StringId::new("__VA_ARGS__")];
        m.definition = "printf(fmt, __VA_ARGS__)".into();
        assert_eq!(m.signature(), "LOG(fmt, ...) printf(fmt, __VA_ARGS__)");
    }
}
