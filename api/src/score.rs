//! Score reconstruction: per-game rally grids, headline lines, and score chips.
//!
//! Everything here is a total function over an [`Order`]; missing data renders
//! as blank cells or placeholder labels and never fails.

use crate::{Order, OrderSide, PlayerScores, TeamIdentity, TournamentConfig};
use serde::Serialize;
use std::collections::HashMap;

/// The full score breakdown of one order, most recent game first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreView {
    pub doubles: bool,
    pub games: Vec<GameGrid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameGrid {
    /// 1-based game number.
    pub number: usize,
    pub label: String,
    /// The game being played right now.
    pub current: bool,
    /// The last game of a finished order.
    pub is_final: bool,
    /// Rally columns shown for this game.
    pub columns: usize,
    pub deuce_column: Option<usize>,
    pub sides: Vec<SideBlock>,
}

/// One team's rows in a game grid. `games_won` and `final_point` belong to the
/// whole side and span all of its player rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SideBlock {
    pub team_id: String,
    pub games_won: u32,
    pub final_point: Option<u32>,
    pub row_span: usize,
    pub rows: Vec<PlayerRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerRow {
    pub name: String,
    pub outcome: Option<Outcome>,
    pub cells: Vec<ScoreCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreCell {
    /// Blank when nothing was recorded at this rally.
    pub text: String,
    pub deuce: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}

/// One `G{n} a-b` summary for compact live cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreChip {
    pub label: String,
    pub current: bool,
}

/// One row of the headline score column on a match card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreLine {
    pub number: usize,
    pub left: u32,
    pub right: u32,
    /// 0 for the left side, 1 for the right; `None` on level points.
    pub leader: Option<usize>,
    pub current: bool,
}

// ---------------------------------------------------------------------------
// Game grid
// ---------------------------------------------------------------------------

/// Rebuild the per-game rally grids for a two-sided order.
/// Returns `None` when the order has fewer than two sides.
pub fn reconstruct(
    order: &Order,
    config: &TournamentConfig,
    teams: &HashMap<String, TeamIdentity>,
) -> Option<ScoreView> {
    let sides = order.sides.get(..2)?;

    let game_count = game_count(order);
    let deuce_column = config.deuce_column();
    let winner = order.winning_side();
    let doubles = sides.iter().any(|s| s.players.len() > 1);

    let games = (0..game_count)
        .rev()
        .map(|index| {
            let number = index + 1;
            let columns = sides
                .iter()
                .flat_map(|s| s.players.iter())
                .map(|p| p.game(index).len())
                .max()
                .unwrap_or(0);

            let blocks = sides
                .iter()
                .enumerate()
                .map(|(side_index, side)| {
                    let outcome = winner.map(|w| {
                        if w == side_index { Outcome::Win } else { Outcome::Lose }
                    });
                    let team = teams.get(&side.team_id);
                    side_block(side, team, index, columns, deuce_column, outcome)
                })
                .collect();

            GameGrid {
                number,
                label: format!("{number}G"),
                current: order.is_current_game(number),
                is_final: order.is_finished() && number == game_count,
                columns,
                deuce_column,
                sides: blocks,
            }
        })
        .collect();

    Some(ScoreView { doubles, games })
}

/// Largest of the order-level game entries, each side's final entries and
/// every player's rally-sequence count. Never below one.
pub fn game_count(order: &Order) -> usize {
    let finals = order.sides.iter().map(|s| s.finals.len());
    let rallies = order
        .sides
        .iter()
        .flat_map(|s| s.players.iter())
        .map(|p| p.games.len());
    finals
        .chain(rallies)
        .chain(std::iter::once(order.games.len()))
        .max()
        .unwrap_or(0)
        .max(1)
}

fn side_block(
    side: &OrderSide,
    team: Option<&TeamIdentity>,
    game_index: usize,
    columns: usize,
    deuce_column: Option<usize>,
    outcome: Option<Outcome>,
) -> SideBlock {
    let synthetic = [PlayerScores::default()];
    let players: &[PlayerScores] = if side.players.is_empty() {
        &synthetic
    } else {
        &side.players
    };

    let rows: Vec<PlayerRow> = players
        .iter()
        .enumerate()
        .map(|(player_index, player)| {
            let rallies = player.game(game_index);
            let cells = (0..columns)
                .map(|col| ScoreCell {
                    text: rallies.get(col).cloned().unwrap_or_default(),
                    deuce: deuce_column == Some(col),
                })
                .collect();
            PlayerRow {
                name: row_name(team, player_index),
                outcome,
                cells,
            }
        })
        .collect();

    SideBlock {
        team_id: side.team_id.clone(),
        games_won: side.games_won,
        final_point: side.final_point(game_index),
        row_span: rows.len(),
        rows,
    }
}

/// Player name at `index`, else the team label, else "-".
fn row_name(team: Option<&TeamIdentity>, index: usize) -> String {
    let Some(team) = team else {
        return "-".to_owned();
    };
    team.players
        .get(index)
        .map(|p| p.name.as_str())
        .filter(|n| !n.is_empty())
        .or(Some(team.label.as_str()).filter(|l| !l.is_empty()))
        .unwrap_or("-")
        .to_owned()
}

// ---------------------------------------------------------------------------
// Compact summaries
// ---------------------------------------------------------------------------

/// One chip per game in either side's final points; "-" for missing points.
pub fn score_chips(order: &Order) -> Vec<ScoreChip> {
    let (Some(a), Some(b)) = (order.sides.first(), order.sides.get(1)) else {
        return Vec::new();
    };
    let games = a.finals.len().max(b.finals.len());
    (0..games)
        .map(|i| {
            let point = |side: &OrderSide| {
                side.final_point(i)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_owned())
            };
            ScoreChip {
                label: format!("G{} {}-{}", i + 1, point(a), point(b)),
                current: order.is_current_game(i + 1),
            }
        })
        .collect()
}

/// Headline score column: one line per game up to the active game, missing
/// points shown as 0, the side ahead on points marked as leader.
pub fn score_lines(order: &Order) -> Vec<ScoreLine> {
    let empty = OrderSide::default();
    let a = order.sides.first().unwrap_or(&empty);
    let b = order.sides.get(1).unwrap_or(&empty);

    let games = a
        .finals
        .len()
        .max(b.finals.len())
        .max(order.active_game.unwrap_or(0) as usize)
        .max(1);

    (0..games)
        .map(|i| {
            let left = a.final_point(i).unwrap_or(0);
            let right = b.final_point(i).unwrap_or(0);
            let leader = match left.cmp(&right) {
                std::cmp::Ordering::Greater => Some(0),
                std::cmp::Ordering::Less => Some(1),
                std::cmp::Ordering::Equal => None,
            };
            ScoreLine {
                number: i + 1,
                left,
                right,
                leader,
                current: order.is_current_game(i + 1),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderStatus, Player};

    fn rallies(seq: &[&str]) -> Vec<String> {
        seq.iter().map(|s| s.to_string()).collect()
    }

    fn side(team_id: &str, players: Vec<Vec<Vec<String>>>, finals: &[u32], won: u32) -> OrderSide {
        OrderSide {
            team_id: team_id.into(),
            players: players.into_iter().map(|games| PlayerScores { games }).collect(),
            finals: finals.iter().map(|&p| Some(p)).collect(),
            games_won: won,
        }
    }

    fn teams() -> HashMap<String, TeamIdentity> {
        let mut teams = HashMap::new();
        teams.insert(
            "a".into(),
            TeamIdentity {
                label: "Aoki".into(),
                players: vec![Player { name: "Aoki".into(), belong: String::new() }],
            },
        );
        teams.insert(
            "b".into(),
            TeamIdentity {
                label: "Baba / Chiba".into(),
                players: vec![
                    Player { name: "Baba".into(), belong: String::new() },
                    Player { name: String::new(), belong: String::new() },
                ],
            },
        );
        teams
    }

    fn finished_singles() -> Order {
        let a_game: Vec<String> = (1..=21).map(|p| p.to_string()).collect();
        let b_game: Vec<String> = (0..=15).map(|p| p.to_string()).collect();
        Order {
            status: OrderStatus::Finished,
            ended_at: Some(1),
            sides: vec![
                side("a", vec![vec![a_game]], &[21], 1),
                side("b", vec![vec![b_game]], &[15], 0),
            ],
            ..Default::default()
        }
    }

    fn outcomes(view: &ScoreView) -> Vec<Option<Outcome>> {
        view.games
            .iter()
            .flat_map(|g| g.sides.iter())
            .flat_map(|s| s.rows.iter())
            .map(|r| r.outcome)
            .collect()
    }

    #[test]
    fn finished_order_flags_winner_rows_and_deuce_column() {
        let config = TournamentConfig { game_point: Some(21) };
        let view = reconstruct(&finished_singles(), &config, &teams()).unwrap();

        assert_eq!(view.games.len(), 1);
        let game = &view.games[0];
        assert!(game.is_final);
        assert!(!game.current);
        assert_eq!(game.columns, 21);
        assert_eq!(game.deuce_column, Some(20));

        let a = &game.sides[0].rows[0];
        let b = &game.sides[1].rows[0];
        assert_eq!(a.outcome, Some(Outcome::Win));
        assert_eq!(b.outcome, Some(Outcome::Lose));
        assert!(a.cells[20].deuce && b.cells[20].deuce);
        assert_eq!(a.cells.iter().filter(|c| c.deuce).count(), 1);
        assert_eq!(a.cells[20].text, "21");
        // Side B's shorter sequence pads with blanks, never zeros.
        assert_eq!(b.cells[16].text, "");
        assert_eq!(b.cells[20].text, "");
        assert_eq!(game.sides[0].final_point, Some(21));
        assert_eq!(game.sides[1].final_point, Some(15));
    }

    #[test]
    fn deuce_column_marked_on_every_game() {
        let game = |n: usize| vec!["1".to_string(); n];
        let order = Order {
            status: OrderStatus::Finished,
            sides: vec![
                side("a", vec![vec![game(22), game(25), game(21)]], &[19, 23, 21], 2),
                side("b", vec![vec![game(22), game(25), game(21)]], &[21, 21, 10], 1),
            ],
            ..Default::default()
        };
        let view = reconstruct(&order, &TournamentConfig::default(), &teams()).unwrap();
        assert_eq!(view.games.iter().map(|g| g.number).collect::<Vec<_>>(), vec![3, 2, 1]);
        for g in &view.games {
            for row in g.sides.iter().flat_map(|s| s.rows.iter()) {
                assert!(row.cells[20].deuce, "game {} missing deuce", g.number);
            }
        }
        assert!(view.games[0].is_final);
        assert!(!view.games[1].is_final && !view.games[2].is_final);
    }

    #[test]
    fn tie_in_games_won_yields_no_flags_for_any_status() {
        for status in [
            OrderStatus::NotStarted,
            OrderStatus::InProgress,
            OrderStatus::BetweenGames,
            OrderStatus::Finished,
        ] {
            let mut order = finished_singles();
            order.status = status;
            order.sides[1].games_won = 1;
            let view = reconstruct(&order, &TournamentConfig::default(), &teams()).unwrap();
            assert!(outcomes(&view).iter().all(Option::is_none), "{status:?}");
        }
    }

    #[test]
    fn unfinished_order_has_no_outcomes() {
        let mut order = finished_singles();
        order.status = OrderStatus::InProgress;
        let view = reconstruct(&order, &TournamentConfig::default(), &teams()).unwrap();
        assert!(outcomes(&view).iter().all(Option::is_none));
        assert!(!view.games[0].is_final);
    }

    #[test]
    fn game_count_takes_the_largest_source_and_is_at_least_one() {
        let mut order = Order {
            sides: vec![OrderSide::default(), OrderSide::default()],
            ..Default::default()
        };
        assert_eq!(game_count(&order), 1);

        order.games = vec![Some(21), Some(21)];
        assert_eq!(game_count(&order), 2);

        order.sides[1].players = vec![PlayerScores { games: vec![vec![], vec![], vec![]] }];
        assert_eq!(game_count(&order), 3);

        order.sides[0].finals = vec![None; 4];
        assert_eq!(game_count(&order), 4);
    }

    #[test]
    fn empty_order_still_renders_one_blank_game() {
        let order = Order {
            sides: vec![OrderSide::default(), OrderSide::default()],
            ..Default::default()
        };
        let view = reconstruct(&order, &TournamentConfig::default(), &HashMap::new()).unwrap();
        assert_eq!(view.games.len(), 1);
        let game = &view.games[0];
        assert_eq!(game.columns, 0);
        for block in &game.sides {
            assert_eq!(block.row_span, 1);
            assert_eq!(block.rows[0].name, "-");
            assert!(block.rows[0].cells.is_empty());
            assert_eq!(block.final_point, None);
        }
    }

    #[test]
    fn fewer_than_two_sides_yields_nothing() {
        let mut order = Order::default();
        assert!(reconstruct(&order, &TournamentConfig::default(), &teams()).is_none());
        order.sides.push(OrderSide::default());
        assert!(reconstruct(&order, &TournamentConfig::default(), &teams()).is_none());
        assert!(score_chips(&order).is_empty());
    }

    #[test]
    fn current_game_flag_follows_active_index() {
        let order = Order {
            status: OrderStatus::InProgress,
            active_game: Some(2),
            sides: vec![
                side("a", vec![vec![rallies(&["1"]), rallies(&["1", "2"])]], &[21, 2], 1),
                side("b", vec![vec![rallies(&["0"]), rallies(&["0"])]], &[18, 0], 0),
            ],
            ..Default::default()
        };
        let view = reconstruct(&order, &TournamentConfig::default(), &teams()).unwrap();
        let current: Vec<(usize, bool)> = view.games.iter().map(|g| (g.number, g.current)).collect();
        assert_eq!(current, vec![(2, true), (1, false)]);

        let chips = score_chips(&order);
        assert_eq!(chips[0], ScoreChip { label: "G1 21-18".into(), current: false });
        assert_eq!(chips[1], ScoreChip { label: "G2 2-0".into(), current: true });
    }

    #[test]
    fn doubles_side_spans_rows_and_names_fall_back_to_label() {
        let order = Order {
            status: OrderStatus::Finished,
            sides: vec![
                side("a", vec![vec![rallies(&["1"])]], &[21], 1),
                side("b", vec![vec![rallies(&["0"])], vec![rallies(&["0", "1"])]], &[9], 0),
            ],
            ..Default::default()
        };
        let view = reconstruct(&order, &TournamentConfig { game_point: None }, &teams()).unwrap();
        assert!(view.doubles);
        let game = &view.games[0];
        assert_eq!(game.deuce_column, None);
        assert_eq!(game.columns, 2);

        let b = &game.sides[1];
        assert_eq!(b.row_span, 2);
        assert_eq!(b.games_won, 0);
        assert_eq!(b.final_point, Some(9));
        assert_eq!(b.rows[0].name, "Baba");
        assert_eq!(b.rows[1].name, "Baba / Chiba");
        assert!(b.rows.iter().all(|r| r.outcome == Some(Outcome::Lose)));
        assert!(game.sides[0].rows[0].cells.iter().all(|c| !c.deuce));
    }

    #[test]
    fn chips_mark_missing_points_with_dash() {
        let mut order = finished_singles();
        order.sides[0].finals.push(Some(11));
        let chips = score_chips(&order);
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[1].label, "G2 11--");
    }

    #[test]
    fn score_lines_cover_active_game_and_mark_leader() {
        let order = Order {
            status: OrderStatus::InProgress,
            active_game: Some(2),
            sides: vec![side("a", vec![], &[21], 1), side("b", vec![], &[23], 0)],
            ..Default::default()
        };
        let lines = score_lines(&order);
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].left, lines[0].right, lines[0].leader), (21, 23, Some(1)));
        assert_eq!((lines[1].left, lines[1].right, lines[1].leader), (0, 0, None));
        assert!(lines[1].current && !lines[0].current);

        assert_eq!(score_lines(&Order::default()).len(), 1);
    }
}
