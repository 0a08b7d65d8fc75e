use clap::Parser;
use crush_solver::cascade::{available_moves, resolve_cascade, settle, Refill};
use crush_solver::config::PlayerConfig;
use crush_solver::engine::{Board, DirectedMove, PlayerMove};
use crush_solver::error::CrushError;
use crush_solver::player::MinMaxPlayer;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Two players alternate on a seeded random board", long_about = None)]
struct Args {
    /// Seed for the starting board and the in-game refills
    #[clap(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of turns to play (both players combined)
    #[clap(short, long, default_value_t = 20)]
    turns: usize,

    /// Board width
    #[clap(long, default_value_t = 10)]
    width: usize,

    /// Board height
    #[clap(long, default_value_t = 10)]
    height: usize,

    /// Configuration of the first player (TOML); defaults to the search player
    #[clap(long)]
    first: Option<PathBuf>,

    /// Configuration of the second player (TOML); defaults to the greedy one-ply player
    #[clap(long)]
    second: Option<PathBuf>,

    /// Print the board after every turn
    #[clap(short, long)]
    verbose: bool,
}

fn load_player(path: &Option<PathBuf>, fallback: MinMaxPlayer) -> Result<MinMaxPlayer, String> {
    match path {
        Some(path) => {
            let config = PlayerConfig::load(path)
                .and_then(|c| c.to_search_config())
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            Ok(MinMaxPlayer::new(config))
        }
        None => Ok(fallback),
    }
}

/// A fresh settled board, as the harness deals when nobody can move.
fn deal(width: usize, height: usize, rng: &mut SmallRng, refill: &mut Refill) -> Result<Board, String> {
    let board = Board::new_random(width, height, rng).map_err(|e| e.to_string())?;
    Ok(settle(&board, refill).board)
}

fn run(args: &Args) -> Result<(), String> {
    let players = [
        load_player(&args.first, MinMaxPlayer::default())?,
        load_player(&args.second, MinMaxPlayer::heuristic())?,
    ];
    let mut rng = SmallRng::seed_from_u64(args.seed);
    let mut refill = Refill::seeded(rng.gen());
    let mut board = deal(args.width, args.height, &mut rng, &mut refill)?;
    let mut removed = [0usize; 2];

    println!("Starting board:\n{}\n", board);
    println!("As a board file:\n{}\n", board.to_scheme_string());

    for turn in 0..args.turns {
        let who = turn % 2;
        // The harness offers every matching swap in its directed encoding.
        let offered: Vec<DirectedMove> = available_moves(&board)
            .iter()
            .map(PlayerMove::to_directed)
            .collect();

        let directed = match players[who].select_move(&offered, &board) {
            Ok(directed) => directed,
            Err(CrushError::NoAvailableMove) => {
                println!("Turn {}: no move left, dealing a new board", turn + 1);
                board = deal(args.width, args.height, &mut rng, &mut refill)?;
                continue;
            }
            Err(e) => return Err(e.to_string()),
        };

        let mv = PlayerMove::from_directed(&board, &directed).map_err(|e| e.to_string())?;
        let outcome = resolve_cascade(&board, &mv, &mut refill).map_err(|e| e.to_string())?;
        removed[who] += outcome.removed;
        info!(
            "turn {}: player {} plays {} removing {} tiles in {} steps",
            turn + 1,
            who + 1,
            mv,
            outcome.removed,
            outcome.steps
        );
        println!(
            "Turn {}: player {} plays {} ({} tiles)",
            turn + 1,
            who + 1,
            directed,
            outcome.removed
        );
        board = outcome.board;
        if args.verbose {
            println!("{}\n", board);
        }
    }

    println!("\nFinal board:\n{}\n", board);
    println!("Player 1 removed {} tiles", removed[0]);
    println!("Player 2 removed {} tiles", removed[1]);
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
