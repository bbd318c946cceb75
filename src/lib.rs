//! Sapiens - project-based career coaching journeys
//!
//! A phase-driven orchestrator walks each learner from onboarding to a
//! finished portfolio project and resume content, delegating every
//! generative step to a text oracle behind stateless workers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
