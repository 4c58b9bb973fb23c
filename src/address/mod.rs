//! Route address space of one manifest phase.
//!
//! Every asset claims the target path its pattern resolves to. This module
//! decides which asset owns each claimed path.
//!
//! - [`conflict`]: precedence tiers, route and physical conflicts

pub mod conflict;

pub use conflict::{
    ConflictError, PhysicalConflict, Precedence, ResolveContext, RouteConflict,
    detect_physical_conflicts, print_conflicts, print_physical_conflicts, resolve_conflicts,
};
