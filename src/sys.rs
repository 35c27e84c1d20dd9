//! Seams to the windowing system.
//!
//! The core never talks to a display server itself. Everything it needs from
//! one (moving windows, listing outputs, launching programs) goes through the
//! capabilities defined here.

pub mod geometry;
pub mod headless;
pub mod screen;
pub mod spawn;
pub mod surface;
