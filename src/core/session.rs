// This module provides arena-based compilation session management using the bumpalo crate.
// CompilationSession owns the arena for one lowering pass: operand names are interned into
// it so the operand table can key on &'arena str without cloning strings per lookup, and it
// collects SessionStats while the driver walks the graph (nodes lowered and rejected, operands
// added, and a per-opcode breakdown). Interior mutability through RefCell keeps the session
// usable behind a shared reference while making it !Sync, so a session can only serve one
// pass at a time.

//! Arena-based compilation session management.

use bumpalo::Bump;
use hashbrown::{HashMap, HashSet};
use std::cell::RefCell;
use std::fmt;

/// Arena-based state of one lowering pass.
pub struct CompilationSession<'arena> {
    /// Arena allocator for interned strings.
    arena: &'arena Bump,

    /// Session statistics.
    stats: RefCell<SessionStats>,

    /// Interned operand names.
    interned_strings: RefCell<HashSet<&'arena str>>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interned_strings: RefCell::new(HashSet::new()),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned: &'arena str = self.arena.alloc_str(s);
        strings.insert(interned);
        interned
    }

    /// Record a node that was lowered onto the backend.
    pub fn record_node_lowered(&self, op_type: &str) {
        let mut stats = self.stats.borrow_mut();
        stats.nodes_lowered += 1;
        *stats.op_counts.entry(op_type.to_string()).or_insert(0) += 1;
    }

    /// Record a node whose support check failed.
    pub fn record_node_rejected(&self, op_type: &str) {
        let mut stats = self.stats.borrow_mut();
        stats.nodes_rejected += 1;
        stats.rejected_op_types.insert(op_type.to_string());
    }

    /// Record an operand added to the operand table.
    pub fn record_operand_added(&self) {
        self.stats.borrow_mut().operands_added += 1;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Number of nodes lowered.
    pub nodes_lowered: usize,

    /// Number of nodes rejected by a support check.
    pub nodes_rejected: usize,

    /// Operands added to the operand table, graph inputs included.
    pub operands_added: usize,

    /// Count of lowered nodes per opcode.
    pub op_counts: HashMap<String, usize>,

    /// Opcodes that had at least one node rejected.
    pub rejected_op_types: HashSet<String>,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Nodes lowered: {}", self.nodes_lowered)?;
        writeln!(f, "  Nodes rejected: {}", self.nodes_rejected)?;
        writeln!(f, "  Operands added: {}", self.operands_added)?;

        if !self.op_counts.is_empty() {
            writeln!(f, "  Operator breakdown:")?;
            let mut sorted: Vec<_> = self.op_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (op_type, count) in sorted {
                writeln!(f, "    {}: {}", op_type, count)?;
            }
        }

        if !self.rejected_op_types.is_empty() {
            let mut rejected: Vec<_> = self.rejected_op_types.iter().map(String::as_str).collect();
            rejected.sort_unstable();
            writeln!(f, "  Rejected operators: {}", rejected.join(", "))?;
        }

        Ok(())
    }
}
