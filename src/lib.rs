//! Picture frame library.
//!
//! Picks a random image from a directory tree on every iteration, loads and
//! orients it, and shows it full-screen with a fade, switching between
//! landscape, portrait and mixed modes from the keyboard.

pub mod config;
pub mod error;
pub mod photo;
pub mod select;
pub mod slideshow;
pub mod processing {
    pub mod layout;
    pub mod scale;
}
pub mod render {
    pub mod frame;
    pub mod gpu;
}

pub use error::Error;
