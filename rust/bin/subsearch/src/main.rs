//! `subsearch`: terminal front-end for community keyword search.
//!
//! Reads one search per line from stdin (`<community> <keyword...>`) and
//! re-renders whenever the result changes. Results refresh on their own
//! every poll interval until the next line or EOF.
//!
//! Commands: `/community <name>`, `/keyword <text>`, `/refresh`, `/quit`.

mod render;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::Parser;
use subsearch_client::RelayClient;
use subsearch_session::{SearchSession, SessionConfig, SessionView};
use subsearch_types::{ResultState, SearchOptions, SearchQuery, SearchSort, TimeFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Community keyword search client.
#[derive(Parser, Debug)]
#[command(name = "subsearch", about = "Search a community's posts by keyword")]
struct Cli {
    /// Relay base URL.
    #[arg(long = "relay", env = "SUBSEARCH_RELAY", default_value = "http://localhost:3001")]
    relay: String,

    /// Sort order: new, hot, top, relevance.
    #[arg(long = "sort", default_value = "new")]
    sort: SearchSort,

    /// Time window: hour, day, week, month, year, all.
    #[arg(long = "time", default_value = "all")]
    time: TimeFilter,

    /// Results per search (1-100).
    #[arg(long = "limit", default_value_t = 25)]
    limit: u32,

    /// Quiet period before a typed query is searched, in milliseconds.
    #[arg(long = "debounce-ms", default_value_t = 300)]
    debounce_ms: u64,

    /// Refresh interval for an unchanged query, in seconds.
    #[arg(long = "poll-secs", default_value_t = 60)]
    poll_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Search(SearchQuery),
    Community(String),
    Keyword(String),
    Refresh,
    Quit,
}

fn parse_line(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head {
        "/quit" | "/q" => Command::Quit,
        "/refresh" | "/r" => Command::Refresh,
        "/community" => Command::Community(rest.to_string()),
        "/keyword" => Command::Keyword(rest.to_string()),
        _ => Command::Search(SearchQuery::new(head, rest)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let relay = RelayClient::new(&cli.relay);
    match relay.health().await {
        Ok(true) => info!("relay {} is up", cli.relay),
        Ok(false) => warn!("relay {} answered health check without ok status", cli.relay),
        Err(e) => warn!("relay {} unreachable: {}", cli.relay, e.reason()),
    }

    let config = SessionConfig {
        debounce: Duration::from_millis(cli.debounce_ms),
        poll_interval: Duration::from_secs(cli.poll_secs.max(1)),
        options: SearchOptions {
            sort: cli.sort,
            time: cli.time,
            limit: cli.limit,
        },
    };
    let session = SearchSession::start(Arc::new(relay), config);

    // Re-render only when the result changes, not on every keystroke.
    let last_shown: Mutex<Option<ResultState>> = Mutex::new(None);
    session.subscribe(move |state| {
        let mut last = last_shown.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&state.result) {
            return;
        }
        *last = Some(state.result.clone());
        let view = SessionView::from(state);
        println!("{}", render::render(&view, chrono::Utc::now()));
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Command::Search(query) => session.input(query),
                    Command::Community(name) => session.set_community(name),
                    Command::Keyword(text) => session.set_keyword(text),
                    Command::Refresh => session.refresh(),
                    Command::Quit => break,
                }
            }
        }
    }

    session.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_then_keyword_words() {
        assert_eq!(
            parse_line("technology  machine learning "),
            Command::Search(SearchQuery::new("technology", "machine learning"))
        );
        assert_eq!(parse_line("r/rust async"), Command::Search(SearchQuery::new("r/rust", "async")));
    }

    #[test]
    fn lone_community_is_inert() {
        let Command::Search(q) = parse_line("technology") else {
            panic!("expected search");
        };
        assert!(!q.is_executable());
    }

    #[test]
    fn commands() {
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line("/refresh"), Command::Refresh);
        assert_eq!(parse_line("/community rust"), Command::Community("rust".into()));
        assert_eq!(parse_line("/keyword borrow checker"), Command::Keyword("borrow checker".into()));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["subsearch"]).unwrap();
        assert_eq!(cli.sort, SearchSort::New);
        assert_eq!(cli.time, TimeFilter::All);
        assert_eq!(cli.limit, 25);
        assert_eq!(cli.debounce_ms, 300);

        let cli = Cli::try_parse_from(["subsearch", "--sort", "top", "--time", "week"]).unwrap();
        assert_eq!(cli.sort, SearchSort::Top);
        assert_eq!(cli.time, TimeFilter::Week);
        assert!(Cli::try_parse_from(["subsearch", "--sort", "sideways"]).is_err());
    }
}
