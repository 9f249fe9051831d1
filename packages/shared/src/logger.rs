//! Logging setup utilities for the Tandem binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for the library crates and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "tandem-server", "tandem-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use tandem_shared::logger::setup_logger;
///
/// setup_logger("tandem-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
///
/// Every Tandem crate gets the same level so that logs from the server
/// library show up next to the binary's own logs.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets = vec!["tandem_shared", "tandem_server", "tandem_client"];
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }
    let mut directives: Vec<String> = targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect();
    // HTTP request spans from tower-http
    directives.push(format!("tower_http={}", default_log_level));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_contains_all_crates() {
        // テスト項目: デフォルトのフィルタに全クレートとバイナリが含まれる
        // given (前提条件):
        let binary_name = "tandem-server";

        // when (操作):
        let filter = default_filter(binary_name, "info");

        // then (期待する結果):
        assert!(filter.contains("tandem_shared=info"));
        assert!(filter.contains("tandem_server=info"));
        assert!(filter.contains("tandem_client=info"));
        assert!(filter.contains("tower_http=info"));
    }

    #[test]
    fn test_default_filter_skips_binary_matching_crate_name() {
        // テスト項目: バイナリ名がクレート名と同じ場合、ディレクティブが重複しない
        // given (前提条件):
        let binary_name = "tandem-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(filter.matches("tandem_server=debug").count(), 1);
    }

    #[test]
    fn test_default_filter_keeps_custom_binary_name() {
        // テスト項目: クレート名と異なるバイナリ名もフィルタに追加される
        // given (前提条件):
        let binary_name = "load-generator";

        // when (操作):
        let filter = default_filter(binary_name, "warn");

        // then (期待する結果):
        assert!(filter.contains("load_generator=warn"));
    }
}
