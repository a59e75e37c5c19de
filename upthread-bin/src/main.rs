#![cfg_attr(not(debug_assertions), windows_subsystem = "console")]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

mod commands;
mod date_ago;
mod ui;

use std::sync::atomic::Ordering;
use std::{env, thread};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use upthread_lib::{Error, ToOverlordMessage, GLOBALS};

pub const AVATAR_SIZE_F32: f32 = 48.0; // points, not pixels

fn main() -> Result<(), Error> {
    // Setup logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    let env_filter = EnvFilter::from_default_env();
    let max_level = match env_filter.max_level_hint() {
        Some(l) => l,
        None => LevelFilter::ERROR,
    };
    let show_debug = cfg!(debug_assertions) || max_level <= LevelFilter::DEBUG;
    tracing_subscriber::fmt::fmt()
        .with_target(false)
        .with_file(show_debug)
        .with_line_number(show_debug)
        .with_env_filter(env_filter)
        .init();

    // Initialize the lib
    upthread_lib::init()?;

    // Setup async
    // The runtime moves to its own thread below; the handle lets the main
    // thread keep a runtime context for spawning from UI code.
    let rt = tokio::runtime::Runtime::new()?;
    let handle = rt.handle().clone();
    let _main_rt = handle.enter();

    // If we were handed a command, execute the command and return
    let args = env::args();
    if args.len() > 1 {
        match commands::handle_command(args, &rt) {
            Err(e) => {
                println!("{}", e);
                return Ok(());
            }
            Ok(exit) => {
                if exit {
                    return Ok(());
                }
            }
        }
    }

    // We run our main async code on a separate thread, not just a
    // separate task. This leaves the main thread for UI work only.
    // egui is most portable when it is on the main thread.
    let async_thread = thread::spawn(move || {
        rt.block_on(upthread_lib::run());
    });

    // Run the UI
    if let Err(e) = ui::run() {
        tracing::error!("{}", e);
    }

    // Tell the async parties to close down
    GLOBALS.shutting_down.store(true, Ordering::Relaxed);
    let _ = GLOBALS.to_overlord.send(ToOverlordMessage::Shutdown);

    // Wait for the async thread to complete
    if async_thread.join().is_err() {
        tracing::error!("Async thread panicked");
    }

    upthread_lib::shutdown()?;

    Ok(())
}
