//! Line-oriented terminal front end: reads commands, prints the board.

use crate::action::{Action, ActionResult};
use crate::entity::PlayerId;
use crate::position::Direction;
use crate::resolver::Resolver;
use crate::state::GameState;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

/// The key bindings only cover two players.
pub const MAX_TERMINAL_PLAYERS: usize = 2;

pub const GAME_READY_MESSAGE: &str = "Sokoban game is ready.";
pub const INVALID_INPUT_MESSAGE: &str = "Invalid Input.";
pub const WIN_MESSAGE: &str = "You win.";
pub const GAME_EXIT_MESSAGE: &str = "Game exits.";
pub const PROMPT: &str = ">>>";

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("terminal game supports at most 2 players, map has {0}")]
    TooManyPlayers(usize),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Exited,
}

/// Decodes one command per line.
///
/// Commands (case-insensitive):
/// - `W`/`A`/`S`/`D` = player A up/left/down/right
/// - `K`/`H`/`J`/`L` = player B up/left/down/right
/// - `U` = undo
/// - `EXIT` = exit
pub struct TerminalInput<R> {
    reader: R,
}

impl<R: BufRead> TerminalInput<R> {
    pub fn new(reader: R) -> Self {
        TerminalInput { reader }
    }

    /// Reads the next action. End of input is treated as `Exit`.
    pub fn fetch_action(&mut self) -> io::Result<Action> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            debug!("input closed");
            return Ok(Action::Exit);
        }
        Ok(parse_command(line.trim()))
    }
}

pub fn parse_command(command: &str) -> Action {
    let movement = |player: u8, direction: Direction| match PlayerId::new(player) {
        Some(player) => Action::Move { player, direction },
        None => Action::InvalidInput(INVALID_INPUT_MESSAGE.to_string()),
    };
    match command.to_ascii_uppercase().as_str() {
        "W" => movement(0, Direction::Up),
        "A" => movement(0, Direction::Left),
        "S" => movement(0, Direction::Down),
        "D" => movement(0, Direction::Right),
        "K" => movement(1, Direction::Up),
        "H" => movement(1, Direction::Left),
        "J" => movement(1, Direction::Down),
        "L" => movement(1, Direction::Right),
        "U" => Action::Undo,
        "EXIT" => Action::Exit,
        _ => Action::InvalidInput(INVALID_INPUT_MESSAGE.to_string()),
    }
}

pub struct TerminalRenderer<W> {
    writer: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(writer: W) -> Self {
        TerminalRenderer { writer }
    }

    /// Draws the board: `#` wall, lowercase box, uppercase player, `@` free
    /// destination, `.` empty, space for cells outside the map.
    pub fn render(&mut self, state: &GameState) -> io::Result<()> {
        write!(self.writer, "{}", state)?;
        self.writer.flush()
    }

    pub fn message(&mut self, content: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub struct TerminalGame<R, W> {
    state: GameState,
    input: TerminalInput<R>,
    renderer: TerminalRenderer<W>,
}

impl<R: BufRead, W: Write> TerminalGame<R, W> {
    pub fn new(
        state: GameState,
        input: TerminalInput<R>,
        renderer: TerminalRenderer<W>,
    ) -> Result<Self, TuiError> {
        let players = state.map().player_ids().len();
        if players > MAX_TERMINAL_PLAYERS {
            return Err(TuiError::TooManyPlayers(players));
        }
        Ok(TerminalGame {
            state,
            input,
            renderer,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_renderer(self) -> TerminalRenderer<W> {
        self.renderer
    }

    /// Plays until the board is solved or the user exits.
    pub fn run(&mut self) -> Result<Outcome, TuiError> {
        self.renderer.message(GAME_READY_MESSAGE)?;

        let mut turns = 0usize;
        while !self.state.is_win() {
            self.renderer.render(&self.state)?;
            self.renderer.message("")?;
            self.renderer
                .message(&format!("Undo Quota: {}", self.state.remaining_undos()))?;
            self.renderer.message(PROMPT)?;

            let action = self.input.fetch_action()?;
            turns += 1;
            let result = Resolver::new(&mut self.state).resolve(action);
            match result {
                ActionResult::Failed { reason, .. } => {
                    self.renderer.message(&reason.to_string())?;
                }
                ActionResult::Success(Action::InvalidInput(msg)) => {
                    self.renderer.message(&msg)?;
                }
                ActionResult::Success(Action::Exit) => {
                    info!(turns, "player exited");
                    self.finish(GAME_EXIT_MESSAGE)?;
                    return Ok(Outcome::Exited);
                }
                ActionResult::Success(_) => {}
            }
        }

        info!(turns, "board solved");
        self.finish(WIN_MESSAGE)?;
        Ok(Outcome::Won)
    }

    fn finish(&mut self, message: &str) -> io::Result<()> {
        self.renderer.render(&self.state)?;
        self.renderer.message("")?;
        self.renderer.message(message)
    }
}
