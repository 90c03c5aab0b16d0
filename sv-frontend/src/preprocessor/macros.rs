use indexmap::IndexMap;

use super::lexer::{lex, PpKind};
use crate::symbols::PathId;
use crate::vobject::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalArg {
    pub name: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyToken {
    pub kind: PpKind,
    pub text: String,
}

/// A recorded `` `define ``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInfo {
    pub name: String,
    /// `None` for object-like macros, `Some(vec![])` for `` `define M() ``.
    pub formals: Option<Vec<FormalArg>>,
    pub body: Vec<BodyToken>,
    /// Body spans several lines through `\` continuations.
    pub escaped: bool,
    /// Definition node in the preprocessor content.
    pub node: NodeId,
    pub file: PathId,
    pub line: u32,
    pub column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl MacroInfo {
    /// Object-like macro with `value` as body, as given by `+define+`.
    pub fn from_value(name: &str, value: &str) -> Self {
        let body = lex(value)
            .into_iter()
            .map(|t| BodyToken {
                kind: t.kind,
                text: t.text,
            })
            .collect();
        Self {
            name: name.to_string(),
            formals: None,
            body,
            escaped: false,
            node: NodeId::INVALID,
            file: PathId::INVALID,
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
        }
    }

    pub fn arity(&self) -> usize {
        self.formals.as_ref().map_or(0, Vec::len)
    }

    /// Body text as written.
    pub fn body_text(&self) -> String {
        self.body.iter().map(|t| t.text.as_str()).collect::<String>().trim().to_string()
    }

    /// Body with `actuals` substituted for the formals, `` `` `` pasted,
    /// `` `" `` turned into quotes and continuations folded. The result is
    /// still preprocessor text: nested macro uses are left for the caller.
    pub fn substitute(&self, actuals: &[String]) -> String {
        let formals = self.formals.as_deref().unwrap_or(&[]);
        let mut out = String::new();
        for token in &self.body {
            match token.kind {
                PpKind::Identifier => match formals.iter().position(|f| f.name == token.text) {
                    Some(index) => match actuals.get(index) {
                        Some(actual) => out.push_str(actual),
                        None => out.push_str(formals[index].default.as_deref().unwrap_or("")),
                    },
                    None => out.push_str(&token.text),
                },
                PpKind::TickTick | PpKind::OneLineComment => {}
                PpKind::TickQuote => out.push('"'),
                PpKind::LineContinuation => out.push(' '),
                _ => out.push_str(&token.text),
            }
        }
        out.trim().to_string()
    }
}

/// Macros visible at the current point of preprocessing, in definition
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: IndexMap<String, MacroInfo>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `info`, returning the definition it replaces.
    pub fn define(&mut self, info: MacroInfo) -> Option<MacroInfo> {
        self.macros.insert(info.name.clone(), info)
    }

    pub fn undef(&mut self, name: &str) -> Option<MacroInfo> {
        self.macros.shift_remove(name)
    }

    pub fn clear(&mut self) {
        self.macros.clear();
    }

    pub fn get(&self, name: &str) -> Option<&MacroInfo> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    /// Seeds object-like macros, e.g. from `+define+NAME=value`.
    pub fn define_all<'a>(&mut self, defines: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (name, value) in defines {
            self.define(MacroInfo::from_value(name, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_formals(names: &[(&str, Option<&str>)], body: &str) -> MacroInfo {
        let mut info = MacroInfo::from_value("M", body);
        info.formals = Some(
            names
                .iter()
                .map(|(name, default)| FormalArg {
                    name: name.to_string(),
                    default: default.map(str::to_string),
                })
                .collect(),
        );
        info
    }

    #[test]
    fn formals_are_replaced_whole() {
        let info = with_formals(&[("x", None), ("y", None)], " (x+y+xy)");
        assert_eq!(info.substitute(&["1".into(), "2".into()]), "(1+2+xy)");
    }

    #[test]
    fn defaults_fill_missing_actuals() {
        let info = with_formals(&[("a", None), ("b", Some("7"))], "a*b");
        assert_eq!(info.substitute(&["3".into()]), "3*7");
    }

    #[test]
    fn paste_and_quote() {
        let info = with_formals(&[("n", None)], "`\"n`\" reg_``n");
        assert_eq!(info.substitute(&["clk".into()]), "\"clk\" reg_clk");
    }

    #[test]
    fn redefinition_replaces() {
        let mut table = MacroTable::new();
        assert!(table.define(MacroInfo::from_value("A", "1")).is_none());
        let old = table.define(MacroInfo::from_value("A", "2")).unwrap();
        assert_eq!(old.body_text(), "1");
        assert_eq!(table.get("A").unwrap().body_text(), "2");
        assert!(table.undef("A").is_some());
        assert!(table.undef("A").is_none());
    }
}
