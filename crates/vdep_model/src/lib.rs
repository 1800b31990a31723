//! Entity facts consumed by the virtual-dependency engine.
//!
//! The engine does not discover models itself. It is handed [`Module`]s,
//! their [`Model`]s and [`Field`]s, and a way to look up the concrete
//! descendants of any model through the [`ModelGraph`] trait. A
//! [`ModelSnapshot`] is a serde-loadable implementation of that trait used by
//! the CLI and by tests.

#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod model;
pub mod snapshot;

pub use error::ModelError;
pub use graph::{ConcreteModelsMap, ModelGraph};
pub use model::{Field, Model, Module};
pub use snapshot::ModelSnapshot;
