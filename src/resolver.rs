use crate::action::{Action, ActionResult, Failure};
use crate::entity::{Entity, PlayerId};
use crate::position::Direction;
use crate::state::GameState;
use tracing::debug;

/// Applies actions to a game state one at a time.
///
/// Every rejected action leaves the state exactly as it was. Win detection is
/// left to the caller through [`GameState::is_win`].
pub struct Resolver<'a> {
    state: &'a mut GameState,
}

impl<'a> Resolver<'a> {
    pub fn new(state: &'a mut GameState) -> Self {
        Resolver { state }
    }

    pub fn state(&self) -> &GameState {
        &*self.state
    }

    pub fn resolve(&mut self, action: Action) -> ActionResult {
        let outcome = match &action {
            Action::Move { player, direction } => self.resolve_move(*player, *direction),
            Action::Undo => self.resolve_undo(),
            Action::Exit | Action::InvalidInput(_) => Ok(()),
        };
        match outcome {
            Ok(()) => {
                debug!(%action, "action resolved");
                ActionResult::Success(action)
            }
            Err(reason) => {
                debug!(%action, %reason, "action rejected");
                ActionResult::Failed { action, reason }
            }
        }
    }

    fn resolve_move(&mut self, player: PlayerId, direction: Direction) -> Result<(), Failure> {
        let from = self
            .state
            .player_position(player)
            .ok_or(Failure::PlayerNotFound(player))?;
        let target = from.step(direction);

        match self.state.entity(target) {
            Some(Entity::Box(owner)) if owner == player => {
                let beyond = target.step(direction);
                if !self.state.entity(beyond).is_some_and(Entity::is_empty) {
                    return Err(Failure::PushBlocked);
                }
                self.state.move_entity(target, beyond);
                self.state.move_entity(from, target);
            }
            Some(Entity::Box(_)) => return Err(Failure::BlockedByForeignBox),
            Some(Entity::Player(_)) => return Err(Failure::BlockedByPlayer),
            Some(Entity::Empty) => self.state.move_entity(from, target),
            // Cells outside the drawn map block like walls.
            Some(Entity::Wall) | None => return Err(Failure::BlockedByWall),
        }

        self.state.checkpoint();
        Ok(())
    }

    fn resolve_undo(&mut self) -> Result<(), Failure> {
        if self.state.remaining_undos().is_exhausted() {
            return Err(Failure::UndoQuotaExhausted);
        }
        self.state.undo();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GameMap;
    use crate::position::{ALL_DIRECTIONS, Position};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn state_from(lines: &[&str]) -> GameState {
        let map = GameMap::from_text(&lines.join("\n")).unwrap();
        GameState::new(Arc::new(map))
    }

    fn id(ch: char) -> PlayerId {
        PlayerId::from_player_char(ch).unwrap()
    }

    fn mv(player: char, direction: Direction) -> Action {
        Action::Move {
            player: id(player),
            direction,
        }
    }

    fn resolve(state: &mut GameState, action: Action) -> ActionResult {
        Resolver::new(state).resolve(action)
    }

    #[test]
    fn test_move_into_empty() {
        let mut state = state_from(&["-1", "#####", "#.A.#", "#a@.#", "#####"]);
        let result = resolve(&mut state, mv('A', Direction::Right));

        assert!(result.is_success());
        assert_eq!(state.player_position(id('A')), Some(Position::new(3, 1)));
        assert_eq!(state.entity(Position::new(2, 1)), Some(Entity::Empty));
        assert_eq!(state.checkpoint_count(), 2);
    }

    #[test]
    fn test_move_onto_destination() {
        let mut state = state_from(&["-1", "#####", "#.A.#", "#a@.#", "#####"]);
        let result = resolve(&mut state, mv('A', Direction::Down));

        assert!(result.is_success());
        assert_eq!(state.player_position(id('A')), Some(Position::new(2, 2)));
        assert!(state.is_destination(Position::new(2, 2)));
        assert!(!state.is_win());
    }

    #[test]
    fn test_push_all_directions() {
        let tests = vec![
            (Direction::Right, vec!["-1", "#####", "#Aa.#", "#@..#", "#####"], (3, 1)),
            (Direction::Left, vec!["-1", "#####", "#.aA#", "#@..#", "#####"], (1, 1)),
            (Direction::Down, vec!["-1", "###", "#A#", "#a#", "#.#", "#@#", "###"], (1, 3)),
            (Direction::Up, vec!["-1", "###", "#@#", "#.#", "#a#", "#A#", "###"], (1, 2)),
        ];

        for (direction, lines, (bx, by)) in tests {
            let mut state = state_from(&lines);
            let before = state.player_position(id('A')).unwrap();
            let result = resolve(&mut state, mv('A', direction));

            assert!(result.is_success(), "Failed for {:?}", direction);
            assert_eq!(
                state.entity(Position::new(bx, by)),
                Some(Entity::Box(id('A'))),
                "Failed for {:?}",
                direction
            );
            assert_eq!(
                state.player_position(id('A')),
                Some(before.step(direction)),
                "Failed for {:?}",
                direction
            );
            assert_eq!(state.entity(before), Some(Entity::Empty));
        }
    }

    #[test]
    fn test_push_onto_destination_wins() {
        let mut state = state_from(&["-1", "##@##", "#...#", "#.a.#", "#.A.#", "#####"]);

        assert!(resolve(&mut state, mv('A', Direction::Up)).is_success());
        assert!(!state.is_win());
        assert!(resolve(&mut state, mv('A', Direction::Up)).is_success());
        assert_eq!(state.entity(Position::new(2, 0)), Some(Entity::Box(id('A'))));
        assert!(state.is_win());
    }

    #[test]
    fn test_push_off_misaligned_destination_is_blocked() {
        // The box column is walled off; the destination sits one column over.
        let mut state = state_from(&["-1", "###@#", "#.a.#", "#.A.#", "#####"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Up));
        assert_eq!(result.failure(), Some(Failure::PushBlocked));
        assert_eq!(state, before);
        assert!(!state.is_win());
    }

    #[test]
    fn test_push_into_wall() {
        let mut state = state_from(&["-1", "#####", "#Aa##", "#@..#", "#####"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Right));
        assert_eq!(result.failure(), Some(Failure::PushBlocked));
        assert_eq!(result.action(), &mv('A', Direction::Right));
        assert_eq!(state, before);
    }

    #[test]
    fn test_push_into_another_box() {
        let mut state = state_from(&["-1", "######", "#Aaa.#", "#@@..#", "######"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Right));
        assert_eq!(result.failure(), Some(Failure::PushBlocked));
        assert_eq!(state, before);
    }

    #[test]
    fn test_push_into_player() {
        let mut state = state_from(&["-1", "######", "#AaB.#", "#@@.b#", "######"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Right));
        assert_eq!(result.failure(), Some(Failure::PushBlocked));
        assert_eq!(state, before);
    }

    #[test]
    fn test_push_off_the_map() {
        // The row ends right after the box.
        let mut state = state_from(&["-1", "Aa", "@."]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Right));
        assert_eq!(result.failure(), Some(Failure::PushBlocked));
        assert_eq!(state, before);
    }

    #[test]
    fn test_foreign_box() {
        let mut state = state_from(&["-1", "######", "#Ab.B#", "#a@@.#", "######"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Right));
        assert_eq!(result.failure(), Some(Failure::BlockedByForeignBox));
        assert_eq!(state, before);
    }

    #[test]
    fn test_hit_wall() {
        let mut state = state_from(&["-1", "#####", "#A..#", "#a@.#", "#####"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Left));
        assert_eq!(result.failure(), Some(Failure::BlockedByWall));
        assert_eq!(state, before);
    }

    #[test]
    fn test_hit_player() {
        let mut state = state_from(&["-1", "######", "#AB..#", "#a@b@#", "######"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('A', Direction::Right));
        assert_eq!(result.failure(), Some(Failure::BlockedByPlayer));
        assert_eq!(state, before);
    }

    #[test]
    fn test_non_existent_cell_blocks_like_wall() {
        let mut state = state_from(&["-1", "A.", "a@"]);
        let before = state.clone();

        for direction in [Direction::Up, Direction::Left] {
            let result = resolve(&mut state, mv('A', direction));
            assert_eq!(result.failure(), Some(Failure::BlockedByWall));
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_player_not_found() {
        let mut state = state_from(&["-1", "#A@a#"]);
        let before = state.clone();

        let result = resolve(&mut state, mv('C', Direction::Up));
        assert_eq!(result.failure(), Some(Failure::PlayerNotFound(id('C'))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_exit_and_invalid_input_succeed() {
        let mut state = state_from(&["0", "#A@a#"]);
        let before = state.clone();

        assert_eq!(resolve(&mut state, Action::Exit), ActionResult::Success(Action::Exit));
        let invalid = Action::InvalidInput("Invalid Input.".into());
        assert_eq!(
            resolve(&mut state, invalid.clone()),
            ActionResult::Success(invalid)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_undo_restores_previous_placement() {
        let mut state = state_from(&["3", "######", "#A...#", "#a@..#", "######"]);
        let initial = state.clone();

        assert!(resolve(&mut state, mv('A', Direction::Right)).is_success());
        let after_first = state.to_string();
        assert!(resolve(&mut state, mv('A', Direction::Right)).is_success());

        assert!(resolve(&mut state, Action::Undo).is_success());
        assert_eq!(state.to_string(), after_first);
        assert_eq!(state.player_position(id('A')), Some(Position::new(2, 1)));
        assert_eq!(state.undo_quota(), Some(2));

        assert!(resolve(&mut state, Action::Undo).is_success());
        assert_eq!(state.to_string(), initial.to_string());
        assert_eq!(state.undo_quota(), Some(1));
    }

    #[test]
    fn test_undo_after_push() {
        let mut state = state_from(&["-1", "#####", "#Aa.#", "#@..#", "#####"]);
        let initial = state.to_string();

        assert!(resolve(&mut state, mv('A', Direction::Right)).is_success());
        assert!(resolve(&mut state, Action::Undo).is_success());

        assert_eq!(state.to_string(), initial);
        assert_eq!(state.entity(Position::new(2, 1)), Some(Entity::Box(id('A'))));
        assert_eq!(state.player_position(id('A')), Some(Position::new(1, 1)));
        assert_eq!(state.undo_quota(), None);
    }

    #[test]
    fn test_undo_quota_exhausted() {
        let mut state = state_from(&["2", "######", "#A...#", "#a@..#", "######"]);
        for _ in 0..3 {
            assert!(resolve(&mut state, mv('A', Direction::Right)).is_success());
        }

        assert!(resolve(&mut state, Action::Undo).is_success());
        assert!(resolve(&mut state, Action::Undo).is_success());
        assert_eq!(state.undo_quota(), Some(0));

        let before = state.clone();
        let result = resolve(&mut state, Action::Undo);
        assert_eq!(result.failure(), Some(Failure::UndoQuotaExhausted));
        assert_eq!(state, before);
    }

    #[test]
    fn test_undo_disabled_before_any_move() {
        let mut state = state_from(&["0", "#.A.#", "#.a.#", "#.@.#"]);

        let result = resolve(&mut state, mv('A', Direction::Up));
        assert_eq!(result.failure(), Some(Failure::BlockedByWall));

        let before = state.clone();
        let result = resolve(&mut state, Action::Undo);
        assert_eq!(result.failure(), Some(Failure::UndoQuotaExhausted));
        assert_eq!(state, before);
    }

    #[test]
    fn test_undo_without_moves_is_noop_on_placement() {
        let mut state = state_from(&["-1", "#####", "#A..#", "#a@.#", "#####"]);
        let initial = state.clone();

        assert!(resolve(&mut state, Action::Undo).is_success());
        assert_eq!(state, initial);
    }

    #[test]
    fn test_undo_without_moves_consumes_quota() {
        let mut state = state_from(&["1", "#####", "#A..#", "#a@.#", "#####"]);
        let layout = state.to_string();

        assert!(resolve(&mut state, Action::Undo).is_success());
        assert_eq!(state.to_string(), layout);
        assert_eq!(state.undo_quota(), Some(0));
        assert_eq!(
            resolve(&mut state, Action::Undo).failure(),
            Some(Failure::UndoQuotaExhausted)
        );
    }

    #[test]
    fn test_two_players_take_turns() {
        let mut state = state_from(&["-1", "#######", "#A...B#", "#a@.@b#", "#######"]);

        assert!(resolve(&mut state, mv('A', Direction::Right)).is_success());
        assert!(resolve(&mut state, mv('B', Direction::Left)).is_success());
        assert!(resolve(&mut state, mv('B', Direction::Left)).is_success());
        assert_eq!(
            resolve(&mut state, mv('A', Direction::Right)).failure(),
            Some(Failure::BlockedByPlayer)
        );

        // Undo reverts B's move first.
        assert!(resolve(&mut state, Action::Undo).is_success());
        assert_eq!(state.player_position(id('B')), Some(Position::new(4, 1)));
        assert_eq!(state.player_position(id('A')), Some(Position::new(2, 1)));
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            8 => (0u8..3, 0usize..4).prop_map(|(player, dir)| Action::Move {
                player: PlayerId::new(player).unwrap(),
                direction: ALL_DIRECTIONS[dir],
            }),
            2 => Just(Action::Undo),
            1 => Just(Action::Exit),
        ]
    }

    const ARENA: [&str; 7] = [
        "4",
        "########",
        "#A.a..@#",
        "#.#.b..#",
        "#..@.B.#",
        "#.a..@.#",
        "########",
    ];

    proptest! {
        #[test]
        fn prop_resolution_keeps_invariants(actions in proptest::collection::vec(arb_action(), 0..80)) {
            let mut state = state_from(&ARENA);
            let box_count = state.box_positions().count();

            for action in actions {
                let before = state.clone();
                let result = resolve(&mut state, action);

                if !result.is_success() {
                    prop_assert_eq!(&state, &before);
                }

                prop_assert_eq!(state.box_positions().count(), box_count);
                prop_assert!(state.checkpoint_count() >= 1);
                for (player, pos) in state.player_positions() {
                    prop_assert_eq!(state.entity(pos), Some(Entity::Player(player)));
                }
                prop_assert_eq!(state.player_positions().count(), 2);
                prop_assert_eq!(state.destinations(), before.destinations());
            }
        }

        #[test]
        fn prop_undo_reverts_last_move(actions in proptest::collection::vec(arb_action(), 1..40)) {
            let mut state = state_from(&ARENA);
            let mut history = vec![state.to_string()];

            for action in actions {
                let is_move = matches!(action, Action::Move { .. });
                let is_undo = matches!(action, Action::Undo);
                let result = resolve(&mut state, action);
                if !result.is_success() {
                    continue;
                }
                if is_move {
                    history.push(state.to_string());
                } else if is_undo {
                    if history.len() > 1 {
                        history.pop();
                    }
                    prop_assert_eq!(&state.to_string(), history.last().unwrap());
                }
            }
        }
    }
}
