//! Per-file node table and the design elements discovered in it.

use std::fmt::Write as _;
use std::sync::Arc;

use design_ir::{AnyId, Location as IrLocation, Serializer};

use crate::symbols::{PathId, SymbolId, SymbolTable};
use crate::vobject::{NodeId, VObject, VObjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesignElementKind {
    Module,
    Primitive,
    Interface,
    Program,
    Package,
    Config,
    Checker,
    Class,
    Function,
    Task,
    /// Synthetic entry for a `` `line `` directive.
    SlLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    #[default]
    Ns,
    Ps,
    Fs,
}

impl TimeUnit {
    pub fn from_suffix(text: &str) -> Option<TimeUnit> {
        match text {
            "s" => Some(TimeUnit::S),
            "ms" => Some(TimeUnit::Ms),
            "us" => Some(TimeUnit::Us),
            "ns" => Some(TimeUnit::Ns),
            "ps" => Some(TimeUnit::Ps),
            "fs" => Some(TimeUnit::Fs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeInfoKind {
    #[default]
    None,
    Timescale,
}

/// Snapshot of the `` `timescale `` in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeInfo {
    pub kind: TimeInfoKind,
    pub unit_value: u32,
    pub unit: TimeUnit,
    pub precision_value: u32,
    pub precision: TimeUnit,
}

impl TimeInfo {
    /// Parses the argument text of a `` `timescale `` directive, e.g.
    /// `1ns / 10ps`.
    pub fn parse_timescale(text: &str) -> Option<TimeInfo> {
        let (unit, precision) = text.split_once('/')?;
        let (unit_value, unit) = split_time(unit)?;
        let (precision_value, precision) = split_time(precision)?;
        Some(TimeInfo {
            kind: TimeInfoKind::Timescale,
            unit_value,
            unit,
            precision_value,
            precision,
        })
    }
}

fn split_time(text: &str) -> Option<(u32, TimeUnit)> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    let value = text[..digits].parse().ok()?;
    if !matches!(value, 1 | 10 | 100) {
        return None;
    }
    Some((value, TimeUnit::from_suffix(&text[digits..])?))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignElement {
    /// Fully qualified `library@name`.
    pub name: SymbolId,
    pub file: PathId,
    pub kind: DesignElementKind,
    pub unique_id: u32,
    pub node: NodeId,
    pub line: u32,
    pub column: u16,
    pub end_line: u32,
    pub end_column: u16,
    /// Index of the enclosing element in the same file.
    pub parent: Option<usize>,
    pub time_info: TimeInfo,
    /// `PaNetType*` in effect, `SlNoType` after `` `default_nettype none ``.
    pub default_net_type: VObjectType,
}

impl DesignElement {
    pub fn new(name: SymbolId, file: PathId, kind: DesignElementKind, node: NodeId) -> Self {
        Self {
            name,
            file,
            kind,
            unique_id: 0,
            node,
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
            parent: None,
            time_info: TimeInfo::default(),
            default_net_type: VObjectType::PaNetTypeWire,
        }
    }
}

/// Nodes of one preprocessed or parsed file. Append-only while it is built,
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct FileContent {
    file_id: PathId,
    library: String,
    symbols: Arc<SymbolTable>,
    objects: Vec<VObject>,
    elements: Vec<DesignElement>,
}

impl FileContent {
    pub fn new(file_id: PathId, library: impl Into<String>, symbols: Arc<SymbolTable>) -> Self {
        let placeholder = VObject::new(SymbolId::BAD, VObjectType::SlNoType, file_id, NodeId::INVALID);
        Self {
            file_id,
            library: library.into(),
            symbols,
            objects: vec![placeholder],
            elements: Vec::new(),
        }
    }

    pub fn file_id(&self) -> PathId {
        self.file_id
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn add_object(&mut self, object: VObject) -> NodeId {
        self.objects.push(object);
        NodeId::new(self.objects.len() - 1)
    }

    /// Number of real nodes, the reserved id 0 excluded.
    pub fn len(&self) -> usize {
        self.objects.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn root(&self) -> NodeId {
        if self.is_empty() {
            NodeId::INVALID
        } else {
            NodeId::new(1)
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (1..self.objects.len()).map(NodeId::new)
    }

    pub fn object(&self, id: NodeId) -> &VObject {
        self.objects.get(id.index()).unwrap_or(&self.objects[0])
    }

    pub fn object_mut(&mut self, id: NodeId) -> Option<&mut VObject> {
        if id.is_valid() {
            self.objects.get_mut(id.index())
        } else {
            None
        }
    }

    pub fn objects(&self) -> &[VObject] {
        &self.objects[1..]
    }

    pub fn vtype(&self, id: NodeId) -> VObjectType {
        self.object(id).vtype
    }

    pub fn name(&self, id: NodeId) -> SymbolId {
        self.object(id).name
    }

    pub fn child(&self, id: NodeId) -> NodeId {
        self.object(id).child
    }

    pub fn sibling(&self, id: NodeId) -> NodeId {
        self.object(id).sibling
    }

    pub fn parent(&self, id: NodeId) -> NodeId {
        self.object(id).parent
    }

    pub fn definition(&self, id: NodeId) -> NodeId {
        self.object(id).definition
    }

    pub fn line(&self, id: NodeId) -> u32 {
        self.object(id).line
    }

    pub fn column(&self, id: NodeId) -> u16 {
        self.object(id).column
    }

    pub fn end_line(&self, id: NodeId) -> u32 {
        self.object(id).end_line
    }

    pub fn end_column(&self, id: NodeId) -> u16 {
        self.object(id).end_column
    }

    /// File the node came from, falling back to this content's file.
    pub fn file_of(&self, id: NodeId) -> PathId {
        let file = self.object(id).file_id;
        if file.is_valid() {
            file
        } else {
            self.file_id
        }
    }

    pub fn symbol(&self, id: SymbolId) -> &str {
        self.symbols.symbol(id)
    }

    pub fn sym_name(&self, id: NodeId) -> &str {
        self.symbols.symbol(self.name(id))
    }

    /// Direct children in chain order.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            content: self,
            next: self.child(parent),
        }
    }

    /// Links `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !parent.is_valid() || !child.is_valid() {
            return;
        }
        let last = self.children(parent).last();
        match last {
            Some(last) => {
                if let Some(object) = self.object_mut(last) {
                    object.sibling = child;
                }
            }
            None => {
                if let Some(object) = self.object_mut(parent) {
                    object.child = child;
                }
            }
        }
        if let Some(object) = self.object_mut(child) {
            object.parent = parent;
        }
    }

    pub fn sl_get(&self, parent: NodeId, vtype: VObjectType) -> NodeId {
        self.children(parent)
            .find(|id| self.vtype(*id) == vtype)
            .unwrap_or(NodeId::INVALID)
    }

    pub fn sl_get_all(&self, parent: NodeId, vtype: VObjectType) -> Vec<NodeId> {
        self.children(parent)
            .filter(|id| self.vtype(*id) == vtype)
            .collect()
    }

    pub fn sl_parent(&self, child: NodeId, vtype: VObjectType) -> NodeId {
        self.sl_parent_any(child, &[vtype]).0
    }

    /// Nearest ancestor whose type is one of `types`, with the type found.
    pub fn sl_parent_any(&self, child: NodeId, types: &[VObjectType]) -> (NodeId, VObjectType) {
        let mut current = self.parent(child);
        while current.is_valid() {
            let vtype = self.vtype(current);
            if types.contains(&vtype) {
                return (current, vtype);
            }
            current = self.parent(current);
        }
        (NodeId::INVALID, VObjectType::SlNoType)
    }

    /// First descendant of `vtype` in pre-order, `parent` itself included.
    pub fn sl_collect(&self, parent: NodeId, vtype: VObjectType) -> NodeId {
        self.preorder(parent)
            .find(|id| self.vtype(*id) == vtype)
            .unwrap_or(NodeId::INVALID)
    }

    pub fn sl_collect_all(&self, parent: NodeId, vtype: VObjectType) -> Vec<NodeId> {
        self.preorder(parent)
            .filter(|id| self.vtype(*id) == vtype)
            .collect()
    }

    /// Pre-order walk of the subtree under `root`.
    pub fn preorder(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = if root.is_valid() { vec![root] } else { Vec::new() };
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let mut kids: Vec<NodeId> = self.children(id).collect();
            kids.reverse();
            stack.extend(kids);
            Some(id)
        })
    }

    pub fn add_design_element(&mut self, mut element: DesignElement) -> usize {
        element.unique_id = self.elements.len() as u32 + 1;
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn design_elements(&self) -> &[DesignElement] {
        &self.elements
    }

    pub fn design_elements_mut(&mut self) -> &mut [DesignElement] {
        &mut self.elements
    }

    pub fn design_element_name(&self, element: &DesignElement) -> &str {
        self.symbols.symbol(element.name)
    }

    /// Looks an element up by its `library@name`.
    pub fn design_element(&self, full_name: &str) -> Option<&DesignElement> {
        let id = self.symbols.get(full_name);
        if id.is_bad() {
            return None;
        }
        self.elements.iter().find(|e| e.name == id)
    }

    /// Copies the source range of `first..=last` onto an IR object. The end
    /// extends over trailing packed and unpacked dimensions.
    pub fn populate_core_members(&self, first: NodeId, last: NodeId, s: &mut Serializer, target: AnyId) {
        if !first.is_valid() || first.index() >= self.objects.len() {
            return;
        }
        let mut end = if last.is_valid() && last.index() < self.objects.len() {
            last
        } else {
            first
        };
        let mut sibling = end;
        while sibling.is_valid()
            && matches!(
                self.vtype(sibling),
                VObjectType::PaPackedDimension | VObjectType::PaUnpackedDimension
            )
        {
            end = sibling;
            sibling = self.sibling(sibling);
        }
        let start = self.object(first);
        let stop = self.object(end);
        s.set_location(
            target,
            IrLocation {
                file: self.symbols.path(self.file_of(first)).to_string(),
                line: start.line,
                column: start.column,
                end_line: stop.end_line,
                end_column: stop.end_column,
            },
        );
    }

    /// Reorders the direct children of `parent` by their start position.
    pub fn sort_children(&mut self, parent: NodeId) {
        let mut kids: Vec<NodeId> = self.children(parent).collect();
        if kids.len() < 2 {
            return;
        }
        let ordered = kids.windows(2).all(|w| self.position(w[0]) <= self.position(w[1]));
        if ordered {
            return;
        }
        kids.sort_by_key(|id| self.position(*id));
        if let Some(object) = self.object_mut(parent) {
            object.child = kids[0];
        }
        for pair in kids.windows(2) {
            if let Some(object) = self.object_mut(pair[0]) {
                object.sibling = pair[1];
            }
        }
        if let Some(last) = kids.last().copied() {
            if let Some(object) = self.object_mut(last) {
                object.sibling = NodeId::INVALID;
            }
        }
    }

    pub fn sort_tree(&mut self) {
        let parents: Vec<NodeId> = self.ids().filter(|id| self.child(*id).is_valid()).collect();
        for parent in parents {
            self.sort_children(parent);
        }
    }

    fn position(&self, id: NodeId) -> (u32, u16) {
        let object = self.object(id);
        (object.line, object.column)
    }

    /// Checks that every child chain points back at its parent and that no
    /// node is reachable twice. Returns the problems found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = vec![false; self.objects.len()];
        for parent in self.ids() {
            for child in self.children(parent) {
                if child.index() >= self.objects.len() {
                    problems.push(format!("node {parent} links to missing node {child}"));
                    break;
                }
                if seen[child.index()] {
                    problems.push(format!("node {child} is linked more than once"));
                    break;
                }
                seen[child.index()] = true;
                if self.parent(child) != parent {
                    problems.push(format!(
                        "node {child} is a child of {parent} but points at {}",
                        self.parent(child)
                    ));
                }
            }
        }
        for element in &self.elements {
            if (element.end_line, element.end_column) < (element.line, element.column) {
                problems.push(format!(
                    "design element {} ends before it starts",
                    self.design_element_name(element)
                ));
            }
        }
        problems
    }

    /// Indented dump of every tree, one node per line.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        for id in self.ids().filter(|id| !self.parent(*id).is_valid()) {
            self.print_subtree(id, 0, &mut out);
        }
        out
    }

    fn print_subtree(&self, id: NodeId, depth: usize, out: &mut String) {
        let _ = writeln!(
            out,
            "{:indent$}{}",
            "",
            self.object(id).print(&self.symbols, id),
            indent = depth * 2
        );
        for child in self.children(id) {
            self.print_subtree(child, depth + 1, out);
        }
    }
}

pub struct Children<'a> {
    content: &'a FileContent,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.content.sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(fc: &mut FileContent, vtype: VObjectType, parent: NodeId, line: u32, column: u16) -> NodeId {
        let file = fc.file_id();
        let id = fc.add_object(VObject::new(SymbolId::BAD, vtype, file, NodeId::INVALID).with_range(
            line,
            column,
            line,
            column + 1,
        ));
        fc.append_child(parent, id);
        id
    }

    fn sample() -> (FileContent, [NodeId; 5]) {
        let symbols = Arc::new(SymbolTable::new());
        let file = symbols.register_path("a.sv");
        let mut fc = FileContent::new(file, "work", symbols);
        let root = node(&mut fc, VObjectType::PaSourceText, NodeId::INVALID, 1, 1);
        let a = node(&mut fc, VObjectType::PaExpression, root, 1, 5);
        let b = node(&mut fc, VObjectType::PaPrimary, a, 1, 5);
        let c = node(&mut fc, VObjectType::PaExpression, b, 1, 6);
        let d = node(&mut fc, VObjectType::PaPrimary, root, 1, 2);
        (fc, [root, a, b, c, d])
    }

    #[test]
    fn queries_follow_the_chains() {
        let (fc, [root, a, b, c, d]) = sample();
        assert_eq!(fc.sl_get(root, VObjectType::PaPrimary), d);
        assert_eq!(fc.sl_get_all(root, VObjectType::PaExpression), vec![a]);
        assert_eq!(fc.sl_parent(c, VObjectType::PaExpression), a);
        assert_eq!(
            fc.sl_parent_any(c, &[VObjectType::PaPrimary, VObjectType::PaSourceText]),
            (b, VObjectType::PaPrimary)
        );
        assert_eq!(fc.sl_collect(root, VObjectType::PaPrimary), b);
        assert_eq!(fc.sl_collect_all(root, VObjectType::PaExpression), vec![a, c]);
        assert_eq!(fc.sl_get(NodeId::INVALID, VObjectType::PaPrimary), NodeId::INVALID);
    }

    #[test]
    fn collect_all_is_root_plus_children() {
        let (fc, [root, ..]) = sample();
        let vtype = VObjectType::PaExpression;
        let mut expected = Vec::new();
        if fc.vtype(root) == vtype {
            expected.push(root);
        }
        for child in fc.children(root) {
            expected.extend(fc.sl_collect_all(child, vtype));
        }
        assert_eq!(fc.sl_collect_all(root, vtype), expected);
    }

    #[test]
    fn sort_children_restores_source_order() {
        let (mut fc, [root, a, _, _, d]) = sample();
        fc.sort_children(root);
        assert_eq!(fc.children(root).collect::<Vec<_>>(), vec![d, a]);
        assert!(fc.validate().is_empty());
    }

    #[test]
    fn timescale_text_is_parsed() {
        let info = TimeInfo::parse_timescale(" 1 ns / 10ps").unwrap();
        assert_eq!((info.unit_value, info.unit), (1, TimeUnit::Ns));
        assert_eq!((info.precision_value, info.precision), (10, TimeUnit::Ps));
        assert!(TimeInfo::parse_timescale("3ns/1ps").is_none());
    }
}
