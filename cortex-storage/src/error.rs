//! Error-context helpers bridging `libsql`/`serde_json` failures into
//! [`cortex_core::Error::Storage`], preserving the underlying cause the
//! way the teacher's `storage_err!` macro does.

use cortex_core::Error;

#[macro_export]
macro_rules! storage_err {
    ($msg:literal, $err:expr) => {{
        $crate::error::storage_error($msg, $err)
    }};
}

pub fn storage_error<C, E>(context: C, error: E) -> Error
where
    C: std::fmt::Display,
    E: std::fmt::Display,
{
    Error::Storage(format!("{context}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_context_and_cause() {
        let err = storage_error("failed to open connection", "disk full");
        assert!(err.to_string().contains("failed to open connection"));
        assert!(err.to_string().contains("disk full"));
    }
}
