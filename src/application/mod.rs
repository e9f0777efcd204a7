//! Application services: auto-feature orchestration and cached read paths.

pub mod auto_feature;
pub mod error;
pub mod home;
pub mod jobs;
pub mod repos;
