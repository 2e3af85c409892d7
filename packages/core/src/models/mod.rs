//! Data Models
//!
//! This module contains the data structures shared by every layer:
//!
//! - `Group` - The single entity of the organizational hierarchy
//! - `OfficeRef` - Office reference used to locate an office group
//! - `TreeEntry` - Breadcrumb element produced by ancestor queries

mod group;

pub use group::{Group, GroupId, GroupValidationError, OfficeRef, TreeEntry};
