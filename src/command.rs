use std::os::unix::process::ExitStatusExt;
use std::process::Command;

/// Runs `command` through `sh -c`, blocking until it finishes, and returns
/// its exit status using the shell convention: the raw exit code on normal
/// exit, 128 + signal number when the command is killed by a signal, and
/// 127 when the interpreter cannot be started at all. A failure to start
/// is reported as a status, never as an error, so the caller's
/// acknowledgement path is never interrupted.
pub fn run(command: &str) -> i32 {
    match Command::new("sh").arg("-c").arg(command).status() {
        Ok(status) => match status.code() {
            Some(code) => code,
            None => status.signal().map_or(-1, |sig| 128 + sig),
        },
        Err(_) => 127,
    }
}
