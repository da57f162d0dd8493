use std::time::Duration;
use clap::{Arg, ArgMatches, Command};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Pacing of the rolling-ball reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub roll: Duration,
    pub pause: Duration,
    pub tick: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        RevealTiming {
            roll: Duration::from_millis(1500),
            pause: Duration::from_millis(800),
            tick: Duration::from_millis(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_host: String,
    pub log_file: Option<String>,
    pub gemini: GeminiSettings,
    pub timing: RevealTiming,
}

pub fn command() -> Command {
    Command::new("luckyd")
        .version("0.1")
        .author("Ron Straight <straightre@gmail.com>")
        .about("Lottery stage with an AI-backed draw machine")
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .num_args(1)
                .default_value("0.0.0.0:2346")
                .help("Specify the listen address (e.g., 0.0.0.0:2346)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .env("API_KEY")
                .num_args(1)
                .hide_env_values(true)
                .help("Credential for the generative model endpoint"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .num_args(1)
                .default_value(DEFAULT_MODEL)
                .help("Model used to draw numbers"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .num_args(1)
                .default_value(DEFAULT_ENDPOINT)
                .help("Base URL of the generative model API"),
        )
        .arg(
            Arg::new("request-timeout-secs")
                .long("request-timeout-secs")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("60")
                .help("Give up on the draw machine after this many seconds"),
        )
        .arg(
            Arg::new("roll-ms")
                .long("roll-ms")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("1500")
                .help("How long each ball rolls before it is revealed"),
        )
        .arg(
            Arg::new("pause-ms")
                .long("pause-ms")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("800")
                .help("Pause between two revealed balls"),
        )
        .arg(
            Arg::new("tick-ms")
                .long("tick-ms")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("60")
                .help("Refresh rate of the rolling number"),
        )
}

fn millis(matches: &ArgMatches, id: &str, fallback: u64) -> Duration {
    Duration::from_millis(matches.get_one::<u64>(id).copied().unwrap_or(fallback))
}

impl AppConfig {
    pub fn from_matches(matches: &ArgMatches) -> AppConfig {
        let string = |id: &str, fallback: &str| {
            matches.get_one::<String>(id).cloned().unwrap_or_else(|| fallback.to_string())
        };

        let timeout_secs = matches.get_one::<u64>("request-timeout-secs").copied().unwrap_or(60);

        AppConfig {
            listen_host: string("listen-host", "0.0.0.0:2346"),
            log_file: matches.get_one::<String>("log-file").cloned(),
            gemini: GeminiSettings {
                api_key: string("api-key", ""),
                model: string("model", DEFAULT_MODEL),
                endpoint: string("endpoint", DEFAULT_ENDPOINT),
                timeout: Duration::from_secs(timeout_secs),
            },
            timing: RevealTiming {
                roll: millis(matches, "roll-ms", 1500),
                pause: millis(matches, "pause-ms", 800),
                tick: millis(matches, "tick-ms", 60),
            },
        }
    }
}
