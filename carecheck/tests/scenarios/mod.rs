//! Scenario Tests for carecheck
//!
//! - Backend: the full product walk, both vitals depths, misbehaving servers
//! - Vitals edge: validation, bulk import and the vitals auth check

pub mod vitals_edge;
