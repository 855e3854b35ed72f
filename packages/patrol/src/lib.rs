#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Patrol planning on top of a forecast.
//!
//! [`select_hotspots`] picks a small set of locations worth visiting,
//! either straight from the oracle's predicted hotspots or from past
//! incidents of the most-predicted crime types. [`build_route`] orders
//! them into a patrol sequence and summarizes the distance and time.

pub mod geo;
pub mod route;
pub mod selector;

pub use route::build_route;
pub use selector::select_hotspots;
