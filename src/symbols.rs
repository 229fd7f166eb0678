use indexmap::IndexMap;
use serde_derive::Serialize;

/// A bound symbol. `index` orders the definition against references: it is one
/// past the cursor index of the defining token, and 0 for predefined symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sym {
    pub value: i32,
    pub index: usize,
}

impl Sym {
    pub fn predefined(value: i32) -> Self {
        Self { value, index: 0 }
    }

    /// True if the definition comes after the token at `index`.
    pub fn is_forward_of(&self, index: usize) -> bool {
        self.index > index
    }
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    labels: IndexMap<String, Sym>,
    consts: IndexMap<String, Sym>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &IndexMap<String, Sym> {
        &self.labels
    }

    pub fn consts(&self) -> &IndexMap<String, Sym> {
        &self.consts
    }

    pub fn label(&self, name: &str) -> Option<Sym> {
        self.labels.get(name).copied()
    }

    pub fn constant(&self, name: &str) -> Option<Sym> {
        self.consts.get(name).copied()
    }

    /// Constants shadow labels of the same name.
    pub fn lookup(&self, name: &str) -> Option<Sym> {
        self.constant(name).or_else(|| self.label(name))
    }

    /// Returns false if the label was already bound.
    pub fn define_label(&mut self, name: &str, sym: Sym) -> bool {
        if self.labels.contains_key(name) {
            return false;
        }
        self.labels.insert(name.to_string(), sym);
        true
    }

    /// Returns false if the constant was already bound.
    pub fn define_const(&mut self, name: &str, sym: Sym) -> bool {
        if self.consts.contains_key(name) {
            return false;
        }
        self.consts.insert(name.to_string(), sym);
        true
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.consts.clear();
    }

    pub fn dump(&self) -> SymbolDump {
        SymbolDump {
            labels: self
                .labels
                .iter()
                .map(|(name, sym)| (name.clone(), sym.value))
                .collect(),
            consts: self
                .consts
                .iter()
                .map(|(name, sym)| (name.clone(), sym.value))
                .collect(),
        }
    }
}

/// Serializable view of the tables, in definition order.
#[derive(Debug, Serialize)]
pub struct SymbolDump {
    pub labels: IndexMap<String, i32>,
    pub consts: IndexMap<String, i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_once() {
        let mut syms = SymbolTable::new();
        assert!(syms.define_label("start", Sym { value: 0x4000, index: 1 }));
        assert!(!syms.define_label("start", Sym { value: 0x4001, index: 5 }));
        assert_eq!(syms.label("start"), Some(Sym { value: 0x4000, index: 1 }));
    }

    #[test]
    fn constants_shadow_labels() {
        let mut syms = SymbolTable::new();
        syms.define_label("count", Sym { value: 0x4010, index: 3 });
        assert_eq!(syms.lookup("count").map(|sym| sym.value), Some(0x4010));
        syms.define_const("count", Sym::predefined(8));
        assert_eq!(syms.lookup("count").map(|sym| sym.value), Some(8));
        assert_eq!(syms.lookup("missing"), None);
    }

    #[test]
    fn forward_ordering() {
        let sym = Sym { value: 0, index: 10 };
        assert!(sym.is_forward_of(9));
        assert!(!sym.is_forward_of(10));
        assert!(!Sym::predefined(1).is_forward_of(0));
    }

    #[test]
    fn dump_keeps_definition_order() {
        let mut syms = SymbolTable::new();
        syms.define_label("zeta", Sym { value: 2, index: 1 });
        syms.define_label("alpha", Sym { value: 1, index: 2 });
        syms.define_const("pia", Sym::predefined(0xFF20));
        let dump = syms.dump();
        assert_eq!(dump.labels.keys().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(dump.consts["pia"], 0xFF20);
        syms.clear();
        assert!(syms.labels().is_empty() && syms.consts().is_empty());
    }
}
