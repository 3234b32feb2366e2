//! Roster Data Library
//!
//! This library provides a session-scoped persistence layer for the roster
//! domain: entity repositories, query execution with named and positional
//! parameter binding, paging, bulk updates, and lazy association loading,
//! all inside an atomic transaction boundary.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod query;
