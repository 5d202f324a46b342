//! Utility Module
//!
//! - [`FpsCounter`]: Frame rate measurement utility
//! - [`time`]: Frame timing utilities

pub mod fps_counter;
pub mod time;

pub use fps_counter::FpsCounter;
pub use time::Timer;
