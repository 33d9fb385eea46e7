//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `sprintboard_core` linkage and storage wiring from a terminal.
//! - Print a deterministic per-column summary of the stored board.
//!
//! Usage: `sprintboard_cli [DB_PATH]`. Without a path an in-memory database is used.

use sprintboard_core::db::{open_db, open_db_in_memory};
use sprintboard_core::{
    Board, BoardService, BoardSnapshot, BoardStore, SqliteBoardStore, TaskState,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sprintboard error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteBoardStore::new(&conn);

    let (snapshot, source) = match store.load()? {
        Some(snapshot) => (snapshot, "stored"),
        None => (BoardSnapshot::default_board(), "default"),
    };
    let service = BoardService::new(Board::from_snapshot(snapshot)?, store);
    let board = service.board();

    println!("sprintboard_core version={}", sprintboard_core::core_version());
    println!("board source={source} users={}", board.users().len());
    for state in TaskState::ALL {
        println!("{:<12} {}", state.title(), board.column(state).len());
    }
    if let Some(user) = board.current_user() {
        println!(
            "current user={} role={:?} assigned={}",
            user.id,
            user.role,
            service.assigned_task_count(&user.id)
        );
    }
    Ok(())
}
