//! Tagdex - paginated documentation tags for chat platforms
//!
//! Tagdex stores named documentation entries ("tags") split into
//! fixed-size pages, tracks one pagination cursor per rendered chat
//! message, and turns navigation button clicks into page renders. The
//! chat platform itself sits behind the [`dispatch`] boundary.

pub mod config;
pub mod dispatch;
pub mod ingest;
pub mod pages;
pub mod paginate;
pub mod store;
pub mod tags;
