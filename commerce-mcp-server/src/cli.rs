//! Command-line arguments for the commerce MCP server.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use commerce_mcp_core::{BASE_URL_ENV, CLIENT_ID_ENV, CLIENT_SECRET_ENV, MIN_EXPIRY_MARGIN};

#[derive(Debug, Parser)]
#[command(name = "commerce-mcp")]
#[command(version, about = "Expose commerce back-office operations to agents over MCP (stdio)")]
pub struct Cli {
    /// Base URL of the back office, e.g. https://shop.example.com
    #[arg(long, env = BASE_URL_ENV, value_name = "URL")]
    pub base_url: String,

    /// OAuth2 client ID of the API user
    #[arg(long, env = CLIENT_ID_ENV)]
    pub client_id: String,

    /// OAuth2 client secret of the API user
    #[arg(long, env = CLIENT_SECRET_ENV, hide_env_values = true)]
    pub client_secret: String,

    /// Directory scanned for `*.tool.json` manifests
    #[arg(long, env = "COMMERCE_MCP_TOOLS_DIR", value_name = "DIR")]
    pub tools_dir: Option<PathBuf>,

    /// Seconds before expiry at which the token is refreshed (minimum 30)
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub token_margin_secs: u64,

    /// Timeout for each downstream HTTP call, in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub http_timeout_secs: u64,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace); overridden by RUST_LOG
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn token_margin(&self) -> Duration {
        Duration::from_secs(self.token_margin_secs).max(MIN_EXPIRY_MARGIN)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec![
            "commerce-mcp",
            "--base-url",
            "https://shop.example.com",
            "--client-id",
            "umbraco-back-office-mcp",
            "--client-secret",
            "s3cret",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.base_url, "https://shop.example.com");
        assert_eq!(cli.tools_dir, None);
        assert_eq!(cli.token_margin(), Duration::from_secs(30));
        assert_eq!(cli.http_timeout(), Duration::from_secs(30));
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn test_margin_is_clamped() {
        assert_eq!(
            parse(&["--token-margin-secs", "5"]).token_margin(),
            MIN_EXPIRY_MARGIN
        );
        assert_eq!(
            parse(&["--token-margin-secs", "120"]).token_margin(),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["-v"]).log_filter(), "info");
        assert_eq!(parse(&["-vv"]).log_filter(), "debug");
        assert_eq!(parse(&["-vvvv"]).log_filter(), "trace");
    }

    #[test]
    fn test_tools_dir() {
        let cli = parse(&["--tools-dir", "./tools"]);
        assert_eq!(cli.tools_dir, Some(PathBuf::from("./tools")));
    }
}
