//! Fake scheduler programs for tests.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write an executable shell script `name` into `dir` and return its path.
pub fn fake_program(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}
