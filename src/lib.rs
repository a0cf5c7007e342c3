pub mod configuration;
pub mod domain;
pub mod mailing_list;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;

/// Writes an error and its full chain of causes, one per line. Used by the
/// `Debug` implementations of the error enums so logs carry the root cause.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
