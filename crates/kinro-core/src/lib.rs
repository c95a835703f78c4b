//! Kinro Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Kinro schema
//! diagram client. It includes:
//!
//! - **Identifiers**: Server-issued identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Schema**: The data model mirrored from the backend ([`schema`] module)
//! - **Validation**: Client-side input checks run before any request ([`validation`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod schema;
pub mod validation;
