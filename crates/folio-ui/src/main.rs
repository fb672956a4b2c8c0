#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Folio UI wasm entry point and native stub fallback.

#[cfg(target_arch = "wasm32")]
fn main() -> Result<(), std::io::Error> {
    folio_ui::run_app();
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), std::io::Error> {
    write_notice(&mut std::io::stderr().lock())
}

/// Explain how to run the client and where it reads its configuration.
#[cfg(not(target_arch = "wasm32"))]
fn write_notice(out: &mut impl std::io::Write) -> Result<(), std::io::Error> {
    use folio_ui::core::config::{CONFIG_ELEMENT_ID, DEFAULT_API_BASE_URL};

    writeln!(
        out,
        "folio-ui runs in the browser; build with `trunk build` or `cargo build --target wasm32-unknown-unknown`."
    )?;
    writeln!(
        out,
        "Configuration is read from <script id=\"{CONFIG_ELEMENT_ID}\" type=\"application/json\">; the API defaults to {DEFAULT_API_BASE_URL}."
    )
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn notice_names_the_config_element() {
        let mut out = Vec::new();
        write_notice(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("wasm32-unknown-unknown"));
        assert!(text.contains("id=\"folio-config\""));
        assert_eq!(text.lines().count(), 2);
    }
}
