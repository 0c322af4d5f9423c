//! Text rendering of a session view. Pure: same view and clock, same output.

use chrono::{DateTime, Utc};
use subsearch_session::SessionView;
use subsearch_types::{Post, ResultState};

/// Body preview is clamped to this many lines.
const BODY_LINES: usize = 3;

pub fn render(view: &SessionView, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let q = &view.raw_input;
    out.push_str(&format!("r/{} | {}\n", q.community_name(), q.keyword_text()));

    match &view.result {
        ResultState::Idle => out.push_str("Enter a community and a keyword to search.\n"),
        ResultState::Loading => out.push_str("Searching...\n"),
        ResultState::Empty => out.push_str("No posts found.\n"),
        ResultState::Failed(reason) => out.push_str(&format!("Error: {}\n", reason)),
        ResultState::Populated(posts) => {
            for post in posts {
                out.push('\n');
                out.push_str(&render_post(post, now));
            }
        }
    }
    out
}

fn render_post(post: &Post, now: DateTime<Utc>) -> String {
    let mut out = format!("{}\n  {}\n", post.title, post.link());
    for line in post.body.lines().filter(|l| !l.trim().is_empty()).take(BODY_LINES) {
        out.push_str(&format!("  {}\n", line.trim()));
    }
    out.push_str(&format!(
        "  Posted by u/{} • {} ({}) • ↑{} • {} comments\n",
        post.author,
        format_date(post.created_at),
        format_age(post.created_at, now),
        post.score,
        post.comment_count,
    ));
    out
}

/// `Nov 14, 2023`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// Coarse relative age: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}
