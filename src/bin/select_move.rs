use clap::Parser;
use crush_solver::cascade::available_moves;
use crush_solver::config::PlayerConfig;
use crush_solver::engine::{Board, DirectedMove, PlayerMove};
use crush_solver::player::MinMaxPlayer;
use crush_solver::utils::board_from_text;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Pick the next swap for a crush board", long_about = None)]
struct Args {
    /// Path to the board file (one row of color digits per line, top row first)
    board_file: PathBuf,

    /// Player configuration (TOML); defaults apply for missing keys
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Search depth, overrides the configuration
    #[clap(short, long)]
    depth: Option<usize>,

    /// Time budget in milliseconds, overrides the configuration
    #[clap(short, long)]
    time_ms: Option<u64>,

    /// Search root moves in parallel
    #[clap(long)]
    parallel: bool,

    /// Harness move `x,y,direction` with direction 0=up 1=down 2=left 3=right;
    /// repeat for each legal move. Defaults to every matching swap.
    #[clap(long = "offer", value_name = "X,Y,DIR")]
    offers: Vec<String>,
}

fn read_board_file(path: &PathBuf) -> Result<Board, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    board_from_text(&content).map_err(|e| format!("Invalid board format: {}", e))
}

fn parse_offer(text: &str) -> Result<DirectedMove, String> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Invalid move '{}': {}", text, e))?;
    let raw: [u8; 3] = parts
        .try_into()
        .map_err(|_| format!("Invalid move '{}': expected x,y,direction", text))?;
    DirectedMove::from_raw(raw).map_err(|e| format!("Invalid move '{}': {}", text, e))
}

/// The harness moves given on the command line, or every matching swap.
fn offered_moves(offers: &[String], board: &Board) -> Result<Vec<DirectedMove>, String> {
    if offers.is_empty() {
        return Ok(available_moves(board)
            .iter()
            .map(PlayerMove::to_directed)
            .collect());
    }
    offers.iter().map(|o| parse_offer(o)).collect()
}

fn build_player(args: &Args) -> Result<MinMaxPlayer, String> {
    let mut player_config = match &args.config {
        Some(path) => PlayerConfig::load(path).map_err(|e| e.to_string())?,
        None => PlayerConfig::default(),
    };
    if let Some(depth) = args.depth {
        player_config.depth = depth;
    }
    if let Some(ms) = args.time_ms {
        player_config.time_budget_ms = Some(ms);
    }
    if args.parallel {
        player_config.parallel = true;
    }
    let config = player_config.to_search_config().map_err(|e| e.to_string())?;
    Ok(MinMaxPlayer::new(config))
}

fn run(args: &Args) -> Result<(), String> {
    let board = read_board_file(&args.board_file)?;
    let player = build_player(args)?;
    println!("Loaded board from {}\n", args.board_file.display());
    println!("Board:\n{}\n", board);

    let offered = offered_moves(&args.offers, &board)?;
    println!(
        "Searching {} moves with depth {}{}...\n",
        offered.len(),
        player.config().depth,
        player
            .config()
            .time_budget
            .map(|d: Duration| format!(" and a {} ms budget", d.as_millis()))
            .unwrap_or_default()
    );

    let directed = player
        .select_move(&offered, &board)
        .map_err(|e| e.to_string())?;
    let mv = PlayerMove::from_directed(&board, &directed).map_err(|e| e.to_string())?;
    println!("Best move: {} -> {}", directed, mv);
    let [x1, y1, x2, y2] = mv.to_coords();
    println!("Reply: [{}, {}, {}, {}]", x1, y1, x2, y2);

    println!(
        "\n{}",
        board.to_string_with_highlight(&[(x1, y1), (x2, y2)])
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crush_solver::cascade::RefillPolicy;
    use crush_solver::engine::Direction;
    use crush_solver::heuristics::HeuristicProfile;
    use crush_solver::solver::SearchConfig;

    const SINGLE_SWAP: &str = "0123456012
1236566123
2345601234
3456012345
4560123456
5601234560
0123456012
1234560123
2345601234
3456012345";

    #[test]
    fn test_parse_offer() {
        assert_eq!(
            parse_offer("4, 2,1").unwrap(),
            DirectedMove::new(4, 2, Direction::Down)
        );
        assert!(parse_offer("4,2").is_err());
        assert!(parse_offer("4,2,9").is_err());
        assert!(parse_offer("a,2,0").is_err());
    }

    #[test]
    fn test_offered_moves_go_through_select_move() {
        let board = board_from_text(SINGLE_SWAP).unwrap();
        let player = MinMaxPlayer::new(
            SearchConfig::default()
                .with_depth(1)
                .with_refill(RefillPolicy::Diagonal)
                .with_root_profile(HeuristicProfile::candies_only()),
        );

        let engine_list = offered_moves(&[], &board).unwrap();
        assert_eq!(engine_list.len(), 3);
        let chosen = player.select_move(&engine_list, &board).unwrap();
        assert_eq!(chosen, DirectedMove::new(4, 1, Direction::Up));

        // An explicit harness list is answered in its own encoding.
        let explicit = offered_moves(&["4,2,1".to_string()], &board).unwrap();
        let chosen = player.select_move(&explicit, &board).unwrap();
        assert_eq!(chosen, DirectedMove::new(4, 2, Direction::Down));
    }
}
