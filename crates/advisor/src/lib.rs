//! Learning advisor service
//!
//! HTTP front end over the learner analytics core: health, readiness and
//! metrics endpoints plus the recommendation API.

pub mod api;
pub mod config;
