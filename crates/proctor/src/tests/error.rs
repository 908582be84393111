use crate::AppError;

use std::{fs, io, path::Path};

fn read_file(path: &Path) -> Result<String, AppError> {
    let contents = fs::read_to_string(path)?;
    Ok(contents)
}

/// WHAT: IO failures convert into IoError with the source kept
/// WHY: Filesystem errors surface with their cause and call site
#[test]
#[allow(clippy::unwrap_used)]
fn given_io_error_when_propagated_then_io_error_variant() {
    // Given: A path that does not exist
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("missing.toml");

    // When: The read error crosses a `?`
    let result = read_file(&missing);

    // Then: IoError wrapping the original error
    assert!(matches!(
        result,
        Err(AppError::IoError { ref source, .. }) if source.kind() == io::ErrorKind::NotFound
    ));
}
