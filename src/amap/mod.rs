//! AMap (Gaode) weather/geocoding client.
//!
//! Two-stage lookup: place name → district code, then district code →
//! live weather record. Both endpoints report business failures through a
//! `status` field (`"1"` = success) that is kept distinct from transport
//! failures.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{AmapClient, GeoResolution, WeatherLive};
pub use error::AmapError;
pub use transport::{AmapTransport, HttpTransport};
