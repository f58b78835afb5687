//! Basin Sim - day-stepped irrigation allocation engine.
//!
//! Simulates day-by-day allocation of irrigation water among competing
//! farms under stochastic climate, comparing allocation policies and
//! quantifying risk via Monte Carlo stress testing.
//!
//! # Architecture
//!
//! ```text
//! ClimateSeriesGenerator ──┐
//! DemandModel ─────────────┼─► ReleaseCalculator ─► Allocator / QuotaPlan
//!                          │                              │
//!                          │                              ▼
//!                          │                    GroundwaterPool (top-up)
//!                          │                              │
//!                          └──────────► day loop ◄────────┘
//!                                          │
//!                                   daily metrics ─► summaries
//! ```
//!
//! The day loop is strictly sequential (each day depends on the prior
//! day's reservoir and groundwater levels). Every run is a pure function
//! of its inputs plus a seed: a fixed seed reproduces the run exactly.
//!
//! # Usage
//!
//! ```ignore
//! use basin_core::Policy;
//! use basin_sim::{run_simulation, run_stress_test};
//!
//! let response = run_simulation(&farms, &config, Policy::Fair, true)?;
//! let stress = run_stress_test(&farms, &config, Policy::Fair, 100)?;
//! ```

pub mod allocate;
pub mod climate;
pub mod demand;
pub mod groundwater;
pub mod quota;
pub mod release;
pub mod runner;
pub mod stress;

pub use climate::ClimateDay;
pub use runner::run_simulation;
pub use stress::{run_stress_test, MAX_STRESS_RUNS, MIN_STRESS_RUNS};
