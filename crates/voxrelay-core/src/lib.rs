//! Core types, config, wire protocol, and knowledge base for voxrelay.

pub mod config;
pub mod error;
pub mod knowledge;
pub mod persona;
pub mod protocol;
