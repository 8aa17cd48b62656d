use crate::entity::{Entity, MAX_PLAYERS, PlayerId};
use crate::grid::Grid;
use crate::position::Position;
use arrayvec::ArrayVec;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Reasons a map text is rejected. No partial map is produced for any of them.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("map text is empty, expected an undo limit on the first line")]
    Empty,

    #[error("undo limit '{0}' is not an integer")]
    InvalidUndoLimit(String),

    #[error("undo limit {0} is negative (only -1 is allowed, meaning unlimited)")]
    NegativeUndoLimit(i64),

    #[error("player {player} appears at both {first} and {second}")]
    DuplicatePlayer {
        player: char,
        first: Position,
        second: Position,
    },

    #[error("no players found on the map")]
    NoPlayers,

    #[error("box count ({boxes}) does not match destination count ({destinations})")]
    BoxDestinationMismatch { boxes: usize, destinations: usize },

    #[error("box '{owner}' has no matching player")]
    OrphanBox { owner: char },

    #[error("player '{player}' has no boxes")]
    PlayerWithoutBox { player: char },
}

/// How many undos a game allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoLimit {
    Unlimited,
    /// `Limited(0)` disables undo entirely.
    Limited(u32),
}

impl UndoLimit {
    /// Parses the first line of a map: `-1` means unlimited, any other
    /// non-negative integer is a finite limit.
    pub fn parse(token: &str) -> Result<Self, MapError> {
        let token = token.trim();
        let value: i64 = token
            .parse()
            .map_err(|_| MapError::InvalidUndoLimit(token.to_string()))?;
        match value {
            -1 => Ok(UndoLimit::Unlimited),
            v if v < -1 => Err(MapError::NegativeUndoLimit(v)),
            v => u32::try_from(v)
                .map(UndoLimit::Limited)
                .map_err(|_| MapError::InvalidUndoLimit(token.to_string())),
        }
    }

    /// The finite remaining count, or `None` when unlimited.
    pub fn quota(self) -> Option<u32> {
        match self {
            UndoLimit::Unlimited => None,
            UndoLimit::Limited(n) => Some(n),
        }
    }

    pub fn is_exhausted(self) -> bool {
        self == UndoLimit::Limited(0)
    }

    /// Consumes one undo. Unlimited stays unlimited.
    pub(crate) fn consume(&mut self) {
        if let UndoLimit::Limited(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}

impl fmt::Display for UndoLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoLimit::Unlimited => write!(f, "Unlimited"),
            UndoLimit::Limited(n) => write!(f, "{}", n),
        }
    }
}

/// The immutable template of a level, shared read-only by every game played on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    entities: Grid<Entity>,
    destinations: BTreeSet<Position>,
    undo_limit: UndoLimit,
    players: ArrayVec<PlayerId, MAX_PLAYERS>,
}

impl GameMap {
    /// Parse a map from text.
    ///
    /// The first line is the undo limit (`-1` for unlimited). Each following
    /// line is a row of the map; see [`Entity::from_char`] for the characters.
    /// Rows may differ in length: the width is the longest row and the
    /// missing cells of shorter rows do not exist.
    ///
    /// Validation fails on, in order: a bad undo limit, a player letter used
    /// twice, no players, box count differing from destination count, and a
    /// box or player without its counterpart.
    pub fn from_text(text: &str) -> Result<Self, MapError> {
        let mut lines = text.lines();
        let undo_limit = UndoLimit::parse(lines.next().ok_or(MapError::Empty)?)?;

        let mut rows: Vec<&str> = lines.collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        let height = rows.len();
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);

        let mut entities = Grid::new(width, height);
        let mut destinations = BTreeSet::new();
        let mut player_positions: [Option<Position>; MAX_PLAYERS] = [None; MAX_PLAYERS];
        let mut box_counts = [0usize; MAX_PLAYERS];

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let Some(entity) = Entity::from_char(ch) else {
                    continue;
                };
                match entity {
                    Entity::Player(id) => {
                        if let Some(first) = player_positions[id.index()] {
                            return Err(MapError::DuplicatePlayer {
                                player: id.player_char(),
                                first,
                                second: pos,
                            });
                        }
                        player_positions[id.index()] = Some(pos);
                    }
                    Entity::Box(owner) => box_counts[owner.index()] += 1,
                    Entity::Empty if ch == '@' => {
                        destinations.insert(pos);
                    }
                    Entity::Empty | Entity::Wall => {}
                }
                entities.set(pos, entity);
            }
        }

        let players: ArrayVec<PlayerId, MAX_PLAYERS> = (0..MAX_PLAYERS as u8)
            .filter_map(PlayerId::new)
            .filter(|id| player_positions[id.index()].is_some())
            .collect();
        if players.is_empty() {
            return Err(MapError::NoPlayers);
        }

        let box_total: usize = box_counts.iter().sum();
        if box_total != destinations.len() {
            return Err(MapError::BoxDestinationMismatch {
                boxes: box_total,
                destinations: destinations.len(),
            });
        }

        for id in (0..MAX_PLAYERS as u8).filter_map(PlayerId::new) {
            let has_player = player_positions[id.index()].is_some();
            let has_boxes = box_counts[id.index()] > 0;
            if has_boxes && !has_player {
                return Err(MapError::OrphanBox {
                    owner: id.box_char(),
                });
            }
            if has_player && !has_boxes {
                return Err(MapError::PlayerWithoutBox {
                    player: id.player_char(),
                });
            }
        }

        info!(
            width,
            height,
            players = players.len(),
            destinations = destinations.len(),
            undo_limit = %undo_limit,
            "loaded map"
        );

        Ok(GameMap {
            entities,
            destinations,
            undo_limit,
            players,
        })
    }

    /// Read and parse a map file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading map file");
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    pub fn width(&self) -> usize {
        self.entities.width()
    }

    pub fn height(&self) -> usize {
        self.entities.height()
    }

    pub fn destinations(&self) -> &BTreeSet<Position> {
        &self.destinations
    }

    pub fn is_destination(&self, pos: Position) -> bool {
        self.destinations.contains(&pos)
    }

    pub fn undo_limit(&self) -> UndoLimit {
        self.undo_limit
    }

    /// The initial entity at a position, `None` for cells outside the drawn map.
    pub fn entity(&self, pos: Position) -> Option<Entity> {
        self.entities.get(pos)
    }

    pub(crate) fn entities(&self) -> &Grid<Entity> {
        &self.entities
    }

    /// Ids of all players on the map, in ascending order.
    pub fn player_ids(&self) -> &[PlayerId] {
        &self.players
    }
}
