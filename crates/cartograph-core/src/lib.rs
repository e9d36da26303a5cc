//! Cartograph Core Types and Definitions
//!
//! This crate provides the data model shared by every stage of the Cartograph
//! diagram compiler:
//!
//! - **AST**: The typed, profile-specific document model ([`ast`] module)
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Layout output**: Positioned nodes and routed edges ([`layout`] module)
//! - **Shapes**: The shape catalog contract and alias registry ([`shape`] module)
//! - **Text**: The text measurement contract ([`text`] module)

pub mod ast;
pub mod geometry;
pub mod layout;
pub mod shape;
pub mod text;
