//! Lowering of parsed design components into the design IR.

mod design;
mod expr;
mod gen_stmt;

use std::cell::Cell;

use crate::error::{Diagnostic, Location, Result};
use crate::file_content::FileContent;
use crate::session::Session;
use crate::vobject::NodeId;

pub use self::design::{compile_design, Design};
pub use self::expr::vpi_op_type;

/// Generate constructs nested deeper than this are not lowered.
pub const MAX_GENERATE_DEPTH: u32 = 64;

/// Shared state of one compilation pass.
pub struct CompileHelper<'s> {
    session: &'s Session,
    loop_depth: Cell<u32>,
    max_depth: u32,
}

impl<'s> CompileHelper<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self::with_max_depth(session, MAX_GENERATE_DEPTH)
    }

    pub fn with_max_depth(session: &'s Session, max_depth: u32) -> Self {
        Self {
            session,
            loop_depth: Cell::new(0),
            max_depth,
        }
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    /// Depth of the sub-compilations currently open.
    pub fn loop_depth(&self) -> u32 {
        self.loop_depth.get()
    }

    /// Opens a sub-compilation; it closes when the guard drops.
    pub fn check_for_loops(&self) -> LoopGuard<'_> {
        let depth = self.loop_depth.get() + 1;
        self.loop_depth.set(depth);
        LoopGuard {
            depth: &self.loop_depth,
            exceeded: depth > self.max_depth,
        }
    }

    fn location(&self, fc: &FileContent, id: NodeId) -> Location {
        self.session
            .location(fc.file_of(id), fc.line(id), fc.column(id))
    }

    fn report(&self, fc: &FileContent, id: NodeId, diagnostic: Diagnostic) -> Result<()> {
        self.session
            .report(diagnostic.with_location(self.location(fc, id)))
    }
}

pub struct LoopGuard<'h> {
    depth: &'h Cell<u32>,
    exceeded: bool,
}

impl LoopGuard<'_> {
    pub fn exceeded(&self) -> bool {
        self.exceeded
    }
}

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Children that are part of the grammar shape (no comments or markers).
fn shape_children(fc: &FileContent, id: NodeId) -> Vec<NodeId> {
    fc.children(id)
        .filter(|child| !fc.vtype(*child).is_trivia())
        .collect()
}
