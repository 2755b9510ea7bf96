//! Domains module containing business logic organized by bounded contexts.
//!
//! The only context is `tools`: discovery of tool packages and the plugins
//! that serve their endpoints.

pub mod tools;
