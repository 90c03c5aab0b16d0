//! Mapping from preprocessed coordinates back to the original sources.
//!
//! Two tables cooperate. [`LineMap`] is produced by the preprocessor and
//! tells which file and line every preprocessed line came from (includes and
//! `` `line `` directives start new sections). [`OffsetMap`] is filled by the
//! parse listener and corrects columns on lines where macro text was
//! substituted.

use std::collections::BTreeMap;

use crate::symbols::PathId;

/// Column corrections, per preprocessed line.
///
/// Each entry is an increment applied from its column onwards, so the
/// delta in effect at a column is the running sum up to the greatest key
/// not above it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    line_offset: i64,
    lines: BTreeMap<u32, BTreeMap<u16, i32>>,
}

impl OffsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_offset(line_offset: i64) -> Self {
        Self {
            line_offset,
            ..Self::default()
        }
    }

    pub fn line_offset(&self) -> i64 {
        self.line_offset
    }

    pub fn set_line_offset(&mut self, line_offset: i64) {
        self.line_offset = line_offset;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_entries(&self, line: u32) -> bool {
        self.lines.contains_key(&line)
    }

    pub fn add_offset(&mut self, line: u32, column: u16, delta: i32) {
        if delta == 0 {
            return;
        }
        *self.lines.entry(line).or_default().entry(column).or_insert(0) += delta;
    }

    /// Makes `column` resolve to `target`, shifting everything after it on
    /// the same line by the same amount.
    pub fn pin(&mut self, line: u32, column: u16, target: u16) {
        let current = self.resolve_column(line, column);
        self.add_offset(line, column, i32::from(target) - i32::from(current));
    }

    pub fn delta(&self, line: u32, column: u16) -> i32 {
        self.lines
            .get(&line)
            .map(|entries| entries.range(..=column).map(|(_, delta)| *delta).sum())
            .unwrap_or(0)
    }

    pub fn resolve_column(&self, line: u32, column: u16) -> u16 {
        let resolved = i32::from(column) + self.delta(line, column);
        resolved.clamp(1, i32::from(u16::MAX)) as u16
    }

    pub fn resolve_line(&self, line: u32) -> u32 {
        (i64::from(line) + self.line_offset).clamp(1, i64::from(u32::MAX)) as u32
    }

    /// `(line, column)` with only this map applied.
    pub fn map(&self, line: u32, column: u16) -> (u32, u16) {
        (self.resolve_line(line), self.resolve_column(line, column))
    }
}

/// A run of preprocessed lines that all come from one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSection {
    pub pp_line: u32,
    pub file: PathId,
    pub line: u32,
}

/// Origin file and line of every preprocessed line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMap {
    sections: Vec<LineSection>,
}

impl LineMap {
    pub fn new(file: PathId) -> Self {
        Self {
            sections: vec![LineSection {
                pp_line: 1,
                file,
                line: 1,
            }],
        }
    }

    /// Starts a section at `section.pp_line`. A section already starting on
    /// that line is replaced.
    pub fn push(&mut self, section: LineSection) {
        let at = self.sections.partition_point(|s| s.pp_line < section.pp_line);
        match self.sections.get_mut(at) {
            Some(existing) if existing.pp_line == section.pp_line => *existing = section,
            _ => self.sections.insert(at, section),
        }
    }

    pub fn sections(&self) -> &[LineSection] {
        &self.sections
    }

    /// Original `(file, line)` of a preprocessed line.
    pub fn translate(&self, pp_line: u32) -> (PathId, u32) {
        let at = self.sections.partition_point(|s| s.pp_line <= pp_line);
        match at.checked_sub(1).and_then(|i| self.sections.get(i)) {
            Some(section) => (section.file, section.line + (pp_line - section.pp_line)),
            None => (PathId::INVALID, pp_line),
        }
    }
}

/// Full preprocessed-to-original translation for one parsed file.
#[derive(Debug, Clone, Copy)]
pub struct LocationMapper<'a> {
    pub offsets: &'a OffsetMap,
    pub lines: &'a LineMap,
    pub pp_file: PathId,
    pub use_pp_output_location: bool,
}

impl LocationMapper<'_> {
    pub fn map(&self, line: u32, column: u16) -> (PathId, u32, u16) {
        if self.use_pp_output_location {
            return (self.pp_file, line, column);
        }
        let column = self.offsets.resolve_column(line, column);
        let (file, line) = self.lines.translate(self.offsets.resolve_line(line));
        let file = if file.is_valid() { file } else { self.pp_file };
        (file, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;

    #[test]
    fn greatest_key_at_or_below_wins() {
        let mut map = OffsetMap::new();
        map.add_offset(3, 10, 5);
        map.add_offset(3, 20, -2);
        assert_eq!(map.resolve_column(3, 9), 9);
        assert_eq!(map.resolve_column(3, 10), 15);
        assert_eq!(map.resolve_column(3, 25), 28);
        assert_eq!(map.resolve_column(4, 25), 25);
    }

    #[test]
    fn pin_shifts_the_rest_of_the_line() {
        let mut map = OffsetMap::new();
        map.pin(1, 8, 30);
        map.pin(1, 12, 34);
        assert_eq!(map.resolve_column(1, 8), 30);
        assert_eq!(map.resolve_column(1, 11), 33);
        assert_eq!(map.resolve_column(1, 12), 34);
    }

    #[test]
    fn untouched_lines_only_get_the_line_offset() {
        let map = OffsetMap::with_line_offset(4);
        for (line, column) in [(1, 1), (7, 13), (100, 2)] {
            assert_eq!(map.map(line, column), (line + 4, column));
        }
    }

    #[test]
    fn line_map_sections() {
        let symbols = SymbolTable::new();
        let top = symbols.register_path("top.sv");
        let inc = symbols.register_path("inc.svh");
        let mut lines = LineMap::new(top);
        lines.push(LineSection { pp_line: 3, file: inc, line: 1 });
        lines.push(LineSection { pp_line: 5, file: top, line: 3 });
        assert_eq!(lines.translate(2), (top, 2));
        assert_eq!(lines.translate(4), (inc, 2));
        assert_eq!(lines.translate(6), (top, 4));
    }
}
