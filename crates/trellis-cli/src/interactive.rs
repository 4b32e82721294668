//! Interactive stepping session: the step controller driven by keyboard.
//!
//! space steps one event, `r` runs, `p` pauses, `q` (or Esc / Ctrl+C)
//! cancels. The terminal stays in raw mode for the duration.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use trellis_core::{Board, ControlState, Delivery, SearchDriver, StepController};

use crate::render;

/// Pacing of event delivery while running, and the key-poll tick.
const RUN_DELAY: Duration = Duration::from_millis(50);

pub fn run(board: &Board) -> io::Result<()> {
    enable_raw_mode()?;
    let result = event_loop(board);
    disable_raw_mode()?;
    result
}

fn event_loop(board: &Board) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut ctl = StepController::new(SearchDriver::new(board));

    write_line(
        &mut stdout,
        "space: step   r: run   p: pause   q: cancel",
    )?;

    loop {
        if event::poll(RUN_DELAY)? {
            if let Event::Key(key) = event::read()? {
                let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c');
                match key.code {
                    KeyCode::Char(' ') => {
                        let delivery = ctl.step();
                        deliver(&mut stdout, delivery)?;
                    }
                    KeyCode::Char('r') => ctl.run(),
                    KeyCode::Char('p') => {
                        ctl.pause();
                        write_line(&mut stdout, "[paused]")?;
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        ctl.cancel();
                        write_line(&mut stdout, "[cancelled]")?;
                        break;
                    }
                    _ if ctrl_c => {
                        ctl.cancel();
                        write_line(&mut stdout, "[cancelled]")?;
                        break;
                    }
                    _ => {}
                }
            }
        }

        if ctl.state() == ControlState::Running {
            let delivery = ctl.poll();
            deliver(&mut stdout, delivery)?;
        }
        if ctl.state() == ControlState::Stopped {
            break;
        }
    }

    if let Some(outcome) = ctl.outcome() {
        write_line(&mut stdout, &format!("session over: {}", outcome))?;
    }
    Ok(())
}

fn deliver(stdout: &mut io::Stdout, delivery: Delivery) -> io::Result<()> {
    match delivery {
        Delivery::Event(event) => write_line(stdout, &render::event_line(&event)),
        Delivery::Suspended => Ok(()),
        Delivery::Finished(outcome) => write_line(stdout, &format!("[finished: {}]", outcome)),
        Delivery::Cancelled => write_line(stdout, "[cancelled]"),
    }
}

/// Raw mode needs explicit carriage returns.
fn write_line(stdout: &mut io::Stdout, line: &str) -> io::Result<()> {
    write!(stdout, "{}\r\n", line)?;
    stdout.flush()
}
