mod gen;
mod interactive;
mod render;

use std::error::Error;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use trellis_core::{hint, solvable, Board, PairConstraint, Pos, SearchDriver, TraceEvent};

#[derive(Parser)]
#[command(name = "trellis", about = "Instrumented grid-puzzle solver", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve the board and print the completed grid
    Solve {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Print the full search trace, one event per line
    Trace {
        #[command(flatten)]
        board: BoardArgs,
        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,
        /// Milliseconds to sleep between events
        #[arg(long, default_value_t = 0)]
        delay: u64,
    },
    /// Suggest the next move for an empty cell
    Hint {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Step through the search interactively
    Step {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Generate a solvable starting grid
    Gen {
        /// Board shape to fill
        #[arg(long, value_enum, default_value_t = Shape::Mini6)]
        shape: Shape,
        /// Number of givens to place
        #[arg(long, default_value_t = 8)]
        givens: usize,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    /// 6x6 grid with 3x2 blocks
    Mini6,
    /// 9x9 grid with 3x3 blocks
    Classic9,
}

impl Shape {
    fn board(self) -> Board {
        match self {
            Shape::Mini6 => Board::mini6(),
            Shape::Classic9 => Board::classic9(),
        }
    }
}

#[derive(Args)]
struct BoardArgs {
    /// Board shape
    #[arg(long, value_enum, default_value_t = Shape::Mini6)]
    shape: Shape,
    /// Packed givens, row-major; '0' or '.' marks an empty cell
    #[arg(long)]
    grid: Option<String>,
    /// Equal pair constraint "r1,c1,r2,c2" (1-based), repeatable
    #[arg(long = "equal", value_name = "R1,C1,R2,C2")]
    equal: Vec<String>,
    /// Opposite pair constraint "r1,c1,r2,c2" (1-based), repeatable
    #[arg(long = "opposite", value_name = "R1,C1,R2,C2")]
    opposite: Vec<String>,
}

impl BoardArgs {
    fn build(&self) -> Result<Board, Box<dyn Error>> {
        let mut board = self.shape.board();
        if let Some(grid) = &self.grid {
            board = board.with_digits(grid)?;
        }
        let mut pairs = Vec::new();
        for spec in &self.equal {
            let (a, b) = parse_pair(spec)?;
            pairs.push(PairConstraint::equal(a, b));
        }
        for spec in &self.opposite {
            let (a, b) = parse_pair(spec)?;
            pairs.push(PairConstraint::opposite(a, b));
        }
        Ok(board.with_pairs(pairs)?)
    }
}

/// Parse "r1,c1,r2,c2" with 1-based coordinates.
fn parse_pair(spec: &str) -> Result<(Pos, Pos), Box<dyn Error>> {
    let fields: Vec<usize> = spec
        .split(',')
        .map(|s| s.trim().parse::<usize>())
        .collect::<Result<_, _>>()?;
    match fields.as_slice() {
        [r1, c1, r2, c2] if *r1 > 0 && *c1 > 0 && *r2 > 0 && *c2 > 0 => Ok((
            Pos::new(r1 - 1, c1 - 1),
            Pos::new(r2 - 1, c2 - 1),
        )),
        _ => Err(format!("expected four 1-based coordinates, got {:?}", spec).into()),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Solve { board } => cmd_solve(&board.build()?),
        Command::Trace { board, json, delay } => cmd_trace(&board.build()?, json, delay),
        Command::Hint { board } => cmd_hint(&board.build()?),
        Command::Step { board } => {
            let board = board.build()?;
            check_preflight(&board)?;
            interactive::run(&board)?;
            Ok(())
        }
        Command::Gen {
            shape,
            givens,
            seed,
        } => cmd_gen(shape, givens, seed),
    }
}

/// The original front-end refuses to search an impossible position; so do we.
fn check_preflight(board: &Board) -> Result<(), Box<dyn Error>> {
    if !solvable(board) {
        return Err("current puzzle state is impossible to solve".into());
    }
    Ok(())
}

fn cmd_solve(board: &Board) -> Result<(), Box<dyn Error>> {
    check_preflight(board)?;
    let mut nodes = 0;
    let mut solution = None;
    for event in SearchDriver::new(board) {
        match event {
            TraceEvent::Solution { assignment, .. } => solution = Some(assignment),
            TraceEvent::Done { nodes_visited, .. } => nodes = nodes_visited,
            _ => {}
        }
    }
    match solution {
        Some(assignment) => {
            print!("{}", board.filled(&assignment));
            println!("solved in {} nodes", nodes);
        }
        // reachable only through an oracle node-limit false positive
        None => println!("unsatisfiable after {} nodes", nodes),
    }
    Ok(())
}

fn cmd_trace(board: &Board, json: bool, delay: u64) -> Result<(), Box<dyn Error>> {
    check_preflight(board)?;
    for event in SearchDriver::new(board) {
        if json {
            println!("{}", render::event_json(&event));
        } else {
            println!("{}", render::event_line(&event));
        }
        if delay > 0 && !event.is_terminal() {
            thread::sleep(Duration::from_millis(delay));
        }
    }
    Ok(())
}

fn cmd_hint(board: &Board) -> Result<(), Box<dyn Error>> {
    match hint(board) {
        Some(h) => println!("hint: set cell {} = {}", h.pos, h.value),
        None => println!("no hint available (puzzle complete or impossible)"),
    }
    Ok(())
}

fn cmd_gen(shape: Shape, givens: usize, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    match gen::generate(&shape.board(), givens, &mut rng) {
        Some(board) => {
            print!("{}", board);
            println!("generated solvable puzzle with {} givens", board.given_count());
            Ok(())
        }
        None => Err("could not generate a solvable puzzle; try fewer givens".into()),
    }
}
