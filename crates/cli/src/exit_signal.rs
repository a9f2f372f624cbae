use std::io::BufRead;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::Sender;

const ESC: char = '\u{1b}';

/// Exit code after a second Ctrl-C, matching the shell convention for SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Whether a line typed on stdin asks the loop to stop.
pub fn is_exit_line(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q") || line.contains(ESC)
}

/// Routes Ctrl-C to `tx` so the loop stops between frames and the frame
/// source is closed. A second Ctrl-C while the loop is still winding down
/// terminates the process.
pub fn install_interrupt_handler(tx: Sender<()>) -> Result<(), ctrlc::Error> {
    let interrupted = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if !request_stop(&tx, &interrupted) {
            process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
}

/// Sends the stop message the first time. Returns `false` when a stop was
/// already requested.
fn request_stop(tx: &Sender<()>, interrupted: &AtomicBool) -> bool {
    if interrupted.swap(true, Ordering::SeqCst) {
        return false;
    }
    log::info!("Interrupted, stopping after the current frame");
    let _ = tx.try_send(());
    true
}

/// Watches `input` on a background thread and sends on `tx` when an exit
/// line arrives or the input ends. Returns `false` if the thread cannot start.
pub fn spawn_exit_watcher<R>(input: R, tx: Sender<()>) -> bool
where
    R: BufRead + Send + 'static,
{
    match thread::Builder::new()
        .name("exit-key".into())
        .spawn(move || watch(input, tx))
    {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Exit key watcher unavailable: {e}");
            false
        }
    }
}

fn watch<R: BufRead>(input: R, tx: Sender<()>) {
    for line in input.lines() {
        match line {
            Ok(line) if is_exit_line(&line) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("Stopped reading exit key: {e}");
                return;
            }
        }
    }
    let _ = tx.try_send(());
}
