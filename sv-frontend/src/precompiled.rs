//! Registry of packages shipped in precompiled form.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use crate::symbols::{PathId, SymbolTable};

#[derive(Debug, Clone)]
pub struct Precompiled {
    package_files: IndexMap<String, String>,
    file_names: HashSet<String>,
}

impl Precompiled {
    pub fn new() -> Self {
        let mut precompiled = Self {
            package_files: IndexMap::new(),
            file_names: HashSet::new(),
        };
        precompiled.add_precompiled("uvm_pkg", "uvm_pkg.sv");
        precompiled.add_precompiled("ovm_pkg", "ovm_pkg.sv");
        precompiled
    }

    pub fn add_precompiled(&mut self, package: &str, file_name: &str) {
        self.package_files
            .insert(package.to_string(), file_name.to_string());
        self.file_names.insert(file_name.to_string());
    }

    /// File name of a precompiled package, or an empty string.
    pub fn file_name(&self, package: &str) -> &str {
        self.package_files
            .get(package)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_package_precompiled(&self, package: &str) -> bool {
        self.package_files.contains_key(package)
    }

    /// Matches on the base name, so `lib/uvm_pkg.sv` counts.
    pub fn is_file_precompiled(&self, file_name: &str) -> bool {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name);
        self.file_names.contains(base)
    }

    pub fn is_file_id_precompiled(&self, file: PathId, symbols: &SymbolTable) -> bool {
        file.is_valid() && self.is_file_precompiled(symbols.path(file))
    }

    pub fn packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.package_files
            .iter()
            .map(|(p, f)| (p.as_str(), f.as_str()))
    }
}

impl Default for Precompiled {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_packages_are_registered() {
        let precompiled = Precompiled::new();
        assert!(precompiled.is_package_precompiled("uvm_pkg"));
        assert_eq!(precompiled.file_name("ovm_pkg"), "ovm_pkg.sv");
        assert_eq!(precompiled.file_name("my_pkg"), "");
        assert!(precompiled.is_file_precompiled("/opt/uvm/src/uvm_pkg.sv"));
        assert!(!precompiled.is_file_precompiled("top.sv"));
    }

    #[test]
    fn lookup_by_file_id() {
        let symbols = SymbolTable::new();
        let precompiled = Precompiled::new();
        let id = symbols.register_path("uvm_pkg.sv");
        assert!(precompiled.is_file_id_precompiled(id, &symbols));
        assert!(!precompiled.is_file_id_precompiled(PathId::INVALID, &symbols));
    }
}
