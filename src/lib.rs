//! # voxsketch
//!
//! A small scripting language that procedurally builds voxel models for an
//! interactive sketching tool.
//!
//! A script is parsed into statements and `fn` blocks, then executed against a
//! bounded [`VoxelGrid`]. Shapes come from built-in commands (`box`, `plane`,
//! `extrude`...) and from a straight-line L-System turtle (`lsys F+F+F+F`).
//! The populated grid and the collected [`SceneHints`] are handed to a
//! renderer; nothing here draws.
//!
//! ```
//! use voxsketch::Interpreter;
//!
//! let mut interpreter = Interpreter::default();
//! interpreter.evaluate("reset\nbox 2 3 4\n").unwrap();
//! assert_eq!(interpreter.grid().filled_count(), 24);
//! ```

pub mod error;
pub mod grid;
pub mod interpreter;
pub mod parser;
pub mod scene;
pub mod sketch;
pub mod turtle;

pub use error::*;
pub use grid::*;
pub use interpreter::*;
pub use parser::*;
pub use scene::*;
pub use sketch::*;
pub use turtle::*;
