//! Business logic services (use cases).
//!
//! Each component enforces the rules of one table family and takes the
//! transaction it runs in as an argument; [`facade::IntegrityFacade`] is the
//! only place transactions are opened.

pub mod catalog;
pub mod certificate;
pub mod facade;
pub mod graph;
pub mod identity;
pub mod ledger;
