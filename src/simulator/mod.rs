//! Alert-driving traffic generator.
//!
//! # Responsibilities
//! - Call every service endpoint through [`ServiceClient`]
//! - Classify each status against the operation's expected set
//! - Run named load scenarios and summarize them in a [`Report`]

pub mod client;
pub mod report;
pub mod scenario;

pub use client::{Operation, Probe, ServiceClient};
pub use report::Report;
pub use scenario::{run_plan, DelayRange, PlanOverrides, ScenarioKind, ScenarioPlan};
