//! Concrete parse trees built by the grammars and the listener walk over
//! them.
//!
//! Rule nodes are labelled with the [`VObjectType`] of the production, leaves
//! are indices into the token vector the grammar ran on.

use std::hash::Hash;
use std::ops::Range;

use chumsky::prelude::*;

use crate::error::Result;
use crate::vobject::VObjectType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNode {
    Rule(RuleNode),
    Terminal(usize),
}

impl ParseNode {
    pub fn first_token(&self) -> Option<usize> {
        match self {
            ParseNode::Rule(rule) => rule.start,
            ParseNode::Terminal(index) => Some(*index),
        }
    }

    pub fn last_token(&self) -> Option<usize> {
        match self {
            ParseNode::Rule(rule) => rule.stop,
            ParseNode::Terminal(index) => Some(*index),
        }
    }

    pub fn as_rule(&self) -> Option<&RuleNode> {
        match self {
            ParseNode::Rule(rule) => Some(rule),
            ParseNode::Terminal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    pub rule: VObjectType,
    pub children: Vec<ParseNode>,
    /// First and last token covered, `None` for rules that matched nothing.
    pub start: Option<usize>,
    pub stop: Option<usize>,
}

impl RuleNode {
    pub fn new(rule: VObjectType, children: Vec<ParseNode>) -> Self {
        let start = children.iter().find_map(ParseNode::first_token);
        let stop = children.iter().rev().find_map(ParseNode::last_token);
        Self {
            rule,
            children,
            start,
            stop,
        }
    }

    pub fn child_rules(&self) -> impl Iterator<Item = &RuleNode> {
        self.children.iter().filter_map(ParseNode::as_rule)
    }

    pub fn find(&self, rule: VObjectType) -> Option<&RuleNode> {
        self.child_rules().find(|r| r.rule == rule)
    }

    pub fn terminals(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_terminals(&mut out);
        out
    }

    fn collect_terminals(&self, out: &mut Vec<usize>) {
        for child in &self.children {
            match child {
                ParseNode::Rule(rule) => rule.collect_terminals(out),
                ParseNode::Terminal(index) => out.push(*index),
            }
        }
    }

    pub fn token_range(&self) -> Option<Range<usize>> {
        Some(self.start?..self.stop? + 1)
    }
}

/// Anything a grammar sequence can produce, flattened into child nodes.
pub trait IntoNodes {
    fn push_into(self, out: &mut Vec<ParseNode>);
}

impl IntoNodes for ParseNode {
    fn push_into(self, out: &mut Vec<ParseNode>) {
        out.push(self);
    }
}

impl IntoNodes for () {
    fn push_into(self, _out: &mut Vec<ParseNode>) {}
}

impl<T: IntoNodes> IntoNodes for Vec<T> {
    fn push_into(self, out: &mut Vec<ParseNode>) {
        for item in self {
            item.push_into(out);
        }
    }
}

impl<T: IntoNodes> IntoNodes for Option<T> {
    fn push_into(self, out: &mut Vec<ParseNode>) {
        if let Some(item) = self {
            item.push_into(out);
        }
    }
}

impl<A: IntoNodes, B: IntoNodes> IntoNodes for (A, B) {
    fn push_into(self, out: &mut Vec<ParseNode>) {
        self.0.push_into(out);
        self.1.push_into(out);
    }
}

pub fn nodes<T: IntoNodes>(item: T) -> Vec<ParseNode> {
    let mut out = Vec::new();
    item.push_into(&mut out);
    out
}

pub(crate) type Node<'a, K> = BoxedParser<'a, K, ParseNode, Simple<K>>;
pub(crate) type Nodes<'a, K> = BoxedParser<'a, K, Vec<ParseNode>, Simple<K>>;

/// Single token of `kind`, kept as a leaf.
pub(crate) fn terminal<'a, K>(kind: K) -> Node<'a, K>
where
    K: Clone + Hash + Eq + 'a,
{
    just(kind)
        .map_with_span(|_, span: Range<usize>| ParseNode::Terminal(span.start))
        .boxed()
}

pub(crate) fn terminal_if<'a, K, F>(accept: F) -> Node<'a, K>
where
    K: Clone + Hash + Eq + 'a,
    F: Fn(&K) -> bool + 'a,
{
    filter(move |k: &K| accept(k))
        .map_with_span(|_, span: Range<usize>| ParseNode::Terminal(span.start))
        .boxed()
}

/// Wraps whatever `parser` produced into one rule node.
pub(crate) fn rule<'a, K, T, P>(vtype: VObjectType, parser: P) -> Node<'a, K>
where
    K: Clone + Hash + Eq + 'a,
    T: IntoNodes + 'a,
    P: Parser<K, T, Error = Simple<K>> + 'a,
{
    parser
        .map(move |item| ParseNode::Rule(RuleNode::new(vtype, nodes(item))))
        .boxed()
}

/// Callbacks driven by [`walk`].
pub trait ParseTreeListener {
    fn enter_every_rule(&mut self, _node: &RuleNode) -> Result<()> {
        Ok(())
    }

    fn exit_every_rule(&mut self, _node: &RuleNode) -> Result<()> {
        Ok(())
    }

    fn visit_terminal(&mut self, _token: usize, _parent: &RuleNode) -> Result<()> {
        Ok(())
    }
}

/// Depth-first walk: enter, children in order, exit.
pub fn walk<L: ParseTreeListener + ?Sized>(listener: &mut L, node: &RuleNode) -> Result<()> {
    listener.enter_every_rule(node)?;
    for child in &node.children {
        match child {
            ParseNode::Rule(rule) => walk(listener, rule)?,
            ParseNode::Terminal(index) => listener.visit_terminal(*index, node)?,
        }
    }
    listener.exit_every_rule(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_range_comes_from_children() {
        let inner = RuleNode::new(VObjectType::PaPrimary, vec![ParseNode::Terminal(3)]);
        let outer = RuleNode::new(
            VObjectType::PaExpression,
            vec![
                ParseNode::Rule(RuleNode::new(VObjectType::PaPrimary, vec![])),
                ParseNode::Rule(inner),
                ParseNode::Terminal(5),
            ],
        );
        assert_eq!(outer.start, Some(3));
        assert_eq!(outer.stop, Some(5));
        assert_eq!(outer.terminals(), vec![3, 5]);
        assert_eq!(outer.token_range(), Some(3..6));
    }

    #[test]
    fn empty_rule_has_no_range() {
        let empty = RuleNode::new(VObjectType::PaListOfArguments, vec![]);
        assert!(empty.token_range().is_none());
    }
}
