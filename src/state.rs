use crate::entity::{Entity, MAX_PLAYERS, PlayerId};
use crate::grid::Grid;
use crate::map::{GameMap, UndoLimit};
use crate::position::Position;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One ongoing game on a [`GameMap`].
///
/// The map stays untouched; the state owns the current placement of every
/// entity, a cache of player positions, the checkpoint history and the undo
/// quota left. Only the resolver mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    map: Arc<GameMap>,
    entities: Grid<Entity>,
    // Maps player id to its current position (None = no such player)
    players: [Option<Position>; MAX_PLAYERS],
    // Full placements; the bottom entry is the initial layout and the top
    // entry is the placement after the last committed move.
    checkpoints: Vec<Grid<Entity>>,
    undo_quota: UndoLimit,
}

impl GameState {
    pub fn new(map: Arc<GameMap>) -> Self {
        let entities = map.entities().clone();
        let players = Self::scan_players(&entities);
        let undo_quota = map.undo_limit();
        let checkpoints = vec![entities.clone()];
        GameState {
            map,
            entities,
            players,
            checkpoints,
            undo_quota,
        }
    }

    fn scan_players(entities: &Grid<Entity>) -> [Option<Position>; MAX_PLAYERS] {
        let mut players = [None; MAX_PLAYERS];
        for (pos, entity) in entities.iter() {
            if let Entity::Player(id) = entity {
                players[id.index()] = Some(pos);
            }
        }
        players
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn width(&self) -> usize {
        self.entities.width()
    }

    pub fn height(&self) -> usize {
        self.entities.height()
    }

    /// The entity currently at a position, `None` for cells outside the drawn map.
    pub fn entity(&self, pos: Position) -> Option<Entity> {
        self.entities.get(pos)
    }

    pub fn destinations(&self) -> &BTreeSet<Position> {
        self.map.destinations()
    }

    pub fn is_destination(&self, pos: Position) -> bool {
        self.map.is_destination(pos)
    }

    pub fn player_position(&self, id: PlayerId) -> Option<Position> {
        self.players[id.index()]
    }

    pub fn player_positions(&self) -> impl Iterator<Item = (PlayerId, Position)> + '_ {
        self.map
            .player_ids()
            .iter()
            .filter_map(|&id| self.player_position(id).map(|pos| (id, pos)))
    }

    pub fn box_positions(&self) -> impl Iterator<Item = (Position, PlayerId)> + '_ {
        self.entities.iter().filter_map(|(pos, entity)| match entity {
            Entity::Box(owner) => Some((pos, owner)),
            _ => None,
        })
    }

    /// Undo quota left: `None` when unlimited.
    pub fn undo_quota(&self) -> Option<u32> {
        self.undo_quota.quota()
    }

    pub fn remaining_undos(&self) -> UndoLimit {
        self.undo_quota
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// The game is won when every destination holds a box, whoever owns it.
    pub fn is_win(&self) -> bool {
        self.map
            .destinations()
            .iter()
            .all(|&pos| matches!(self.entities.get(pos), Some(Entity::Box(_))))
    }

    /// Move whatever is at `from` to `to`, leaving `from` empty.
    /// The caller guarantees the move is legal.
    pub(crate) fn move_entity(&mut self, from: Position, to: Position) {
        let Some(entity) = self.entities.get(from) else {
            panic!("No entity to move at {}", from);
        };
        self.entities.set(from, Entity::Empty);
        self.entities.set(to, entity);
        if let Entity::Player(id) = entity {
            self.players[id.index()] = Some(to);
        }
    }

    /// Record the current placement on the history stack.
    pub(crate) fn checkpoint(&mut self) {
        self.checkpoints.push(self.entities.clone());
        debug!(depth = self.checkpoints.len(), "checkpoint recorded");
    }

    /// Revert to the placement before the last committed move and consume one
    /// undo. With no move on record this restores the initial layout.
    pub(crate) fn undo(&mut self) {
        if self.checkpoints.len() > 1 {
            self.checkpoints.pop();
        }
        if let Some(previous) = self.checkpoints.last() {
            self.entities = previous.clone();
        }
        self.players = Self::scan_players(&self.entities);
        self.undo_quota.consume();
        debug!(
            depth = self.checkpoints.len(),
            quota = %self.undo_quota,
            "reverted to checkpoint"
        );
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height() {
            let mut line = String::new();
            for x in 0..self.width() {
                let pos = Position::new(x as i32, y as i32);
                let ch = match self.entity(pos) {
                    Some(entity) => entity.to_char(self.is_destination(pos)),
                    None => ' ',
                };
                line.push(ch);
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
