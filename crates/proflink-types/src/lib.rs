//! Shared domain types for Proflink.
//!
//! This crate contains the domain types of the profile network: Profile,
//! Skill, SkillAssignment, Certificate, Connection, their typed ids, and the
//! error and configuration types shared by every other crate.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod aggregate;
pub mod certificate;
pub mod config;
pub mod connection;
pub mod error;
pub mod ids;
pub mod profile;
pub mod skill;
