use crate::utils::truncate_str;
use crate::LinkData;
use std::fmt::Display;
use tracing::{error, info};

#[cfg(feature = "logging")]
pub use self::subscriber::{setup_logging, LogConfig};

fn create_separator(width: usize, ch: char) -> String {
    std::iter::repeat(ch).take(width).collect()
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut wrapped = String::new();
    let mut line_length = 0;

    for word in text.split_whitespace() {
        if line_length + word.len() + 1 > width {
            wrapped.push('\n');
            wrapped.push_str("  ");
            wrapped.push_str(word);
            line_length = word.len() + 2;
        } else {
            if line_length > 0 {
                wrapped.push(' ');
                line_length += 1;
            }
            wrapped.push_str(word);
            line_length += word.len();
        }
    }
    wrapped
}

/// Short description of an inlined asset; data URLs are far too long to log.
fn describe_asset(asset: &str) -> String {
    if asset.is_empty() {
        "N/A".to_string()
    } else if let Some(rest) = asset.strip_prefix("data:") {
        let mime = rest.split(';').next().unwrap_or("unknown");
        format!("inlined {mime} ({} bytes)", asset.len())
    } else {
        asset.to_string()
    }
}

pub fn log_link_card(link: &LinkData) {
    const CARD_WIDTH: usize = 80;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 2;

    let horizontal_line = "═".repeat(CARD_WIDTH - 2);

    info!(
        "\n╔{}╗\n\
         URL: {}\n\
         Template: {}\n\
         Title: {}\n\
         Author: {}\n\
         Desc: {}\n\
         Image: {}\n\
         Icon: {}\n\
         ╚{}╝",
        horizontal_line,
        wrap_text(&link.url, CONTENT_WIDTH - 5),
        link.template,
        wrap_text(&link.title, CONTENT_WIDTH - 7),
        link.author.as_deref().unwrap_or("N/A"),
        wrap_text(&link.description, CONTENT_WIDTH - 6),
        describe_asset(&link.image),
        describe_asset(&link.favicon),
        horizontal_line,
    );
}

pub fn log_error_card<E: Display + std::error::Error>(url: &str, error: &E) {
    const CARD_WIDTH: usize = 70;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 8;

    let top_bottom = create_separator(CARD_WIDTH - 2, '═');
    let middle = create_separator(CARD_WIDTH - 2, '─');

    let mut error_details = error.to_string();
    if let Some(source) = error.source() {
        error_details = format!("{error_details} (cause: {source})");
    }

    error!(
        "\n╔═{}═╗\n\
         ║ URL: {:<width$} ║\n\
         ║{}║\n\
         ║ Error: {:<width$} ║\n\
         ╚═{}═╝",
        top_bottom,
        truncate_str(url, CONTENT_WIDTH),
        middle,
        truncate_str(&error_details, CONTENT_WIDTH),
        top_bottom,
        width = CONTENT_WIDTH
    );
}

#[cfg(feature = "logging")]
mod subscriber {
    use std::path::PathBuf;
    use tracing::debug;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{
        fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    #[derive(Debug)]
    pub struct LogConfig {
        pub log_dir: PathBuf,
        pub log_level: String,
        pub console_output: bool,
        pub file_output: bool,
    }

    impl Default for LogConfig {
        fn default() -> Self {
            Self {
                log_dir: "logs".into(),
                log_level: "info".into(),
                console_output: true,
                file_output: false,
            }
        }
    }

    /// Installs the global subscriber. `RUST_LOG` overrides `log_level`.
    pub fn setup_logging(
        config: LogConfig,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

        let mut layers = Vec::new();

        if config.console_output {
            let console_layer = subscriber_fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .pretty();
            layers.push(console_layer.boxed());
        }

        if config.file_output {
            std::fs::create_dir_all(&config.log_dir)?;

            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "link-card.log");

            let file_layer = subscriber_fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_writer(file_appender);

            layers.push(file_layer.boxed());
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()?;

        debug!("Logging system initialized with config: {:?}", config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_asset() {
        assert_eq!(describe_asset(""), "N/A");
        assert_eq!(describe_asset("/favicon-light.svg"), "/favicon-light.svg");
        assert_eq!(
            describe_asset("data:image/png;base64,AAAA"),
            "inlined image/png (26 bytes)"
        );
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 8), "one two\n  three");
    }
}
