//! Basic example of driving the trellis engine

use trellis_core::{
    hint, solvable, solve, Board, Delivery, SearchDriver, StepController, TraceEvent,
};

fn main() {
    // A 6x6 mini grid (3x2 blocks) with a handful of givens
    let board = Board::mini6()
        .with_digits("100004 000000 020000 000000 000300 000000")
        .expect("well-formed grid");

    println!("Starting grid:");
    println!("{}", board);

    // Pre-flight: is the position worth searching at all?
    println!("Oracle verdict: solvable = {}\n", solvable(&board));

    // Full search
    match solve(&board) {
        Some(solution) => {
            println!("Solution:");
            println!("{}", solution);
        }
        None => println!("No solution exists."),
    }

    // A hint for the first empty cell the search commits to
    if let Some(h) = hint(&board) {
        println!("Hint: set cell {} = {}\n", h.pos, h.value);
    }

    // Stepping through the first few trace events by hand
    let mut controller = StepController::new(SearchDriver::new(&board));
    println!("First five search steps:");
    for _ in 0..5 {
        match controller.step() {
            Delivery::Event(event) => println!("  {}", kind(&event)),
            other => println!("  {:?}", other),
        }
    }
    controller.cancel();
}

fn kind(event: &TraceEvent) -> &'static str {
    match event {
        TraceEvent::Enter { .. } => "enter",
        TraceEvent::Try { .. } => "try",
        TraceEvent::Deadend { .. } => "deadend",
        TraceEvent::Backtrack { .. } => "backtrack",
        TraceEvent::Solution { .. } => "solution",
        TraceEvent::Done { .. } => "done",
    }
}
