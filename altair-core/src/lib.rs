//! Altair Core
//!
//! Resource model for a declarative AWS topology. A generation pass builds a
//! [`manifest::Manifest`] of resource declarations whose cross-references form
//! a dependency graph; an external reconciliation engine consumes the ordered
//! manifest and converges actual infrastructure to it.

pub mod cidr;
pub mod config;
pub mod graph;
pub mod manifest;
pub mod resource;
pub mod schema;
