//! # UI Module
//!
//! All UI components of the tuning lab.

pub mod main_display;
pub mod strength_meter;
pub mod tonefield;
