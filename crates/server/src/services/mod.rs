//! Tenant-scoped domain operations. Every function takes the company id it acts
//! for and never returns rows belonging to another company.

pub mod applications;
pub mod board;
pub mod companies;
pub mod email;
pub mod quota;
pub mod roles;
pub mod stages;
pub mod templates;
