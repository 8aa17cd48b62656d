//! A multi-player Sokoban engine.
//!
//! Every player owns the boxes drawn with its lowercase letter and can only
//! push those. A [`GameMap`] is loaded once and shared; each game on it is a
//! [`GameState`] driven by a [`Resolver`].

pub mod action;
pub mod entity;
pub mod grid;
pub mod map;
pub mod position;
pub mod resolver;
pub mod state;
pub mod tui;

pub use action::{Action, ActionResult, Failure};
pub use entity::{Entity, MAX_PLAYERS, PlayerId};
pub use map::{GameMap, MapError, UndoLimit};
pub use position::{Direction, Position};
pub use resolver::Resolver;
pub use state::GameState;
