//! Navigation and control core of an arcade cabinet launcher.
//!
//! The catalog lives in SQLite ([`store`]) and is shaped into a menu tree per
//! [`view::View`]. The [`navigator::Navigator`] drives that tree from decoded
//! keyboard, joystick and timer events and runs games through an external
//! emulator command. The SDL2 frontend is available behind the `sdl` feature.

pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod launch;
pub mod navigator;
pub mod render;
pub mod scan;
#[cfg(feature = "sdl")]
pub mod sdl;
pub mod store;
pub mod timer;
pub mod tree;
pub mod view;

pub use error::{LauncherError, Result, StoreError};
pub use navigator::Navigator;
