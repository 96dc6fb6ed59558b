//! Business logic and repository trait definitions for ProfLink.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements. It depends only on `proflink-types` -- never on
//! `proflink-infra` or any database/IO crate.

pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use service::facade::IntegrityFacade;
