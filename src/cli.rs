use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::scraper::{ScrapeRequest, TwitterCredentials};
use crate::storage::ExportFormat;

#[derive(Debug, Parser)]
#[command(author, version, about = "Collect public comments from Play Store, Twitter, YouTube and TikTok")]
pub struct Cli {
    /// TOML configuration file, created with defaults when missing
    #[arg(short, long, global = true, default_value = "comment-scraper.toml", env = "COMMENT_SCRAPER_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reviews of a Google Play app
    Playstore {
        /// App page URL, e.g. https://play.google.com/store/apps/details?id=com.example
        url: String,
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Recent tweets matching a search query
    Twitter {
        query: String,
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[command(flatten)]
        credentials: TwitterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Comments and replies on a YouTube video
    Youtube {
        /// Watch URL, short link or bare video ID
        video: String,
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Comments on a TikTok video
    Tiktok {
        url: String,
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Export format, defaults to output.format from the config
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Browse the result in a terminal table
    #[arg(long, default_value_t = false)]
    pub view: bool,
    #[arg(long, default_value_t = false)]
    pub no_save: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct TwitterArgs {
    #[arg(long, env = "TWITTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "TWITTER_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,
    #[arg(long, env = "TWITTER_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
    #[arg(long, env = "TWITTER_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub access_token_secret: Option<String>,
}

impl From<TwitterArgs> for TwitterCredentials {
    fn from(args: TwitterArgs) -> Self {
        TwitterCredentials {
            api_key: args.api_key.unwrap_or_default(),
            api_secret: args.api_secret.unwrap_or_default(),
            access_token: args.access_token.unwrap_or_default(),
            access_token_secret: args.access_token_secret.unwrap_or_default(),
        }
    }
}

impl Command {
    /// The scrape this subcommand asks for, with its output options; `None` for `serve`
    pub fn into_scrape(self) -> Option<(ScrapeRequest, OutputArgs)> {
        match self {
            Command::Playstore { url, count, output } => Some((ScrapeRequest::PlayStore { app_url: url, count }, output)),
            Command::Twitter {
                query,
                count,
                credentials,
                output,
            } => Some((
                ScrapeRequest::Twitter {
                    credentials: credentials.into(),
                    query,
                    count,
                },
                output,
            )),
            Command::Youtube { video, api_key, output } => Some((
                ScrapeRequest::YouTube {
                    api_key: api_key.unwrap_or_default(),
                    video,
                },
                output,
            )),
            Command::Tiktok { url, count, output } => Some((ScrapeRequest::TikTok { video_url: url, count }, output)),
            Command::Serve { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_playstore_subcommand() {
        let cli = Cli::try_parse_from([
            "comment-scraper",
            "playstore",
            "https://play.google.com/store/apps/details?id=com.example",
            "-n",
            "50",
            "--format",
            "xlsx",
            "--view",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("comment-scraper.toml"));
        let (request, output) = cli.command.into_scrape().unwrap();
        assert_eq!(
            request,
            ScrapeRequest::PlayStore {
                app_url: "https://play.google.com/store/apps/details?id=com.example".to_string(),
                count: Some(50),
            }
        );
        assert_eq!(output.format, Some(ExportFormat::Excel));
        assert!(output.view);
        assert!(!output.no_save);
    }

    #[test]
    fn test_twitter_credentials_from_flags() {
        let cli = Cli::try_parse_from([
            "comment-scraper",
            "twitter",
            "rust lang",
            "--api-key",
            "k",
            "--api-secret",
            "s",
            "--access-token",
            "t",
            "--access-token-secret",
            "ts",
            "--no-save",
        ])
        .unwrap();

        let (request, output) = cli.command.into_scrape().unwrap();
        match request {
            ScrapeRequest::Twitter { credentials, query, count } => {
                assert!(credentials.missing_fields().is_empty());
                assert_eq!(query, "rust lang");
                assert_eq!(count, None);
            }
            other => panic!("unexpected request {:?}", other),
        }
        assert!(output.no_save);
    }

    #[test]
    fn test_serve_has_no_scrape() {
        let cli = Cli::try_parse_from(["comment-scraper", "--config", "other.toml", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Command::Serve { port: Some(9000) }));
        assert!(cli.command.into_scrape().is_none());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let parsed = Cli::try_parse_from(["comment-scraper", "tiktok", "https://x", "--format", "parquet"]);
        assert!(parsed.is_err());
    }
}
