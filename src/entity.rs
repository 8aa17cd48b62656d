use std::fmt;

/// Players are identified by the letters `A` to `Z`.
pub const MAX_PLAYERS: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Returns `None` for ids outside `0..MAX_PLAYERS`.
    pub fn new(id: u8) -> Option<Self> {
        if (id as usize) < MAX_PLAYERS {
            Some(PlayerId(id))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Parses an uppercase player letter.
    pub fn from_player_char(ch: char) -> Option<Self> {
        ch.is_ascii_uppercase().then(|| PlayerId(ch as u8 - b'A'))
    }

    /// Parses a lowercase box letter into the id of the owning player.
    pub fn from_box_char(ch: char) -> Option<Self> {
        ch.is_ascii_lowercase().then(|| PlayerId(ch as u8 - b'a'))
    }

    pub fn player_char(self) -> char {
        (b'A' + self.0) as char
    }

    pub fn box_char(self) -> char {
        (b'a' + self.0) as char
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.player_char())
    }
}

/// The content of an existing cell. Cells outside the drawn map have no entity at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Wall,
    Empty,
    Box(PlayerId),
    Player(PlayerId),
}

impl Entity {
    /// Decodes a map character.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - `.` = Empty
    /// - `@` = Empty (the cell is also a box destination)
    /// - `A`..`Z` = Player
    /// - `a`..`z` = Box owned by the player with the same letter
    ///
    /// Anything else is outside the play area and decodes to `None`.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Entity::Wall),
            '.' | '@' => Some(Entity::Empty),
            _ => PlayerId::from_player_char(ch)
                .map(Entity::Player)
                .or_else(|| PlayerId::from_box_char(ch).map(Entity::Box)),
        }
    }

    /// Encodes the entity; `Empty` cells need the destination flag to pick `@` or `.`.
    pub fn to_char(self, is_destination: bool) -> char {
        match self {
            Entity::Wall => '#',
            Entity::Empty if is_destination => '@',
            Entity::Empty => '.',
            Entity::Box(owner) => owner.box_char(),
            Entity::Player(id) => id.player_char(),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Entity::Empty)
    }
}
