use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process;

/// Writes the daemon's PID to `path`, if one is configured. Failures are
/// warnings only; the daemon keeps running without its pidfile.
pub fn write(progname: &str, path: Option<&Path>) {
    let Some(path) = path else { return };
    if let Err(err) = fs::write(path, process::id().to_string()) {
        eprintln!("{}: can't write pidfile {}: {}", progname, path.display(), err);
    }
}

/// Removes the pidfile on shutdown. An already-absent file is fine.
pub fn clear(progname: &str, path: Option<&Path>) {
    let Some(path) = path else { return };
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != ErrorKind::NotFound {
            eprintln!("{}: can't clear pidfile {}: {}", progname, path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_records_our_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleepwatch.pid");
        write("sleepwatch", Some(&path));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, process::id().to_string());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleepwatch.pid");
        fs::write(&path, "1234").unwrap();
        clear("sleepwatch", Some(&path));
        assert!(!path.exists());
    }

    #[test]
    fn no_configured_path_is_a_noop() {
        write("sleepwatch", None);
        clear("sleepwatch", None);
    }

    #[test]
    fn clearing_an_absent_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        clear("sleepwatch", Some(&dir.path().join("never-written.pid")));
    }

    #[test]
    fn unwritable_path_only_warns() {
        write("sleepwatch", Some(Path::new("/no/such/dir/sleepwatch.pid")));
    }
}
