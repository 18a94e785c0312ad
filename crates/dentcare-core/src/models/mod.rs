//! Domain models for the dentcare system.

mod draft;
mod notification;
mod patient;
mod treatment;

pub use draft::*;
pub use notification::*;
pub use patient::*;
pub use treatment::*;
