//! Interned names shared by every stage of the front end.

use lasso::{Spur, ThreadedRodeo};

pub const BAD_SYMBOL: &str = "@@BAD_SYMBOL@@";

/// Handle to an interned string. The default value is the bad symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(Option<Spur>);

impl SymbolId {
    pub const BAD: SymbolId = SymbolId(None);

    pub fn is_bad(self) -> bool {
        self.0.is_none()
    }
}

/// Interned file path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(pub SymbolId);

impl PathId {
    pub const INVALID: PathId = PathId(SymbolId::BAD);

    pub fn is_valid(self) -> bool {
        !self.0.is_bad()
    }
}

/// Thread-safe symbol table. Insertion takes an internal lock, lookups of
/// already interned strings do not.
#[derive(Debug, Default)]
pub struct SymbolTable {
    rodeo: ThreadedRodeo,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str) -> SymbolId {
        SymbolId(Some(self.rodeo.get_or_intern(name)))
    }

    /// Looks a name up without interning it.
    pub fn get(&self, name: &str) -> SymbolId {
        SymbolId(self.rodeo.get(name))
    }

    pub fn symbol(&self, id: SymbolId) -> &str {
        match id.0 {
            Some(key) => self.rodeo.resolve(&key),
            None => BAD_SYMBOL,
        }
    }

    pub fn register_path(&self, path: &str) -> PathId {
        PathId(self.register(path))
    }

    pub fn path(&self, id: PathId) -> &str {
        self.symbol(id.0)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let table = SymbolTable::new();
        let a = table.register("top");
        let b = table.register("top");
        assert_eq!(a, b);
        assert_eq!(table.symbol(a), "top");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn bad_symbol_resolves_to_marker() {
        let table = SymbolTable::new();
        assert_eq!(table.symbol(SymbolId::BAD), BAD_SYMBOL);
        assert!(table.get("missing").is_bad());
    }
}
