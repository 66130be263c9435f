use crate::core::pipeline::Digest;
use crate::error::Result;
use std::fmt::Write as _;

const WRAP_WIDTH: usize = 100;

/// Plain-text rendering of a digest for the terminal.
pub fn render_text(digest: &Digest) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# {} digest ({})",
        digest.topic,
        digest.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "{} discovered, {} analyzed, {} without transcript, {} failed",
        digest.discovered.len(),
        digest.items.len(),
        digest.skipped.len(),
        digest.failed.len()
    );
    out.push('\n');

    out.push_str(&textwrap::fill(digest.synthesis.trim(), WRAP_WIDTH));
    out.push_str("\n\n");

    if !digest.verdicts.is_empty() {
        out.push_str("## Videos\n");
        for verdict in &digest.verdicts {
            let action = verdict
                .action
                .map(|a| a.to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = writeln!(
                out,
                "{:>3}. {:<5} https://youtu.be/{}",
                verdict.sequence, action, verdict.item_id
            );
        }
        out.push('\n');
    }

    for id in &digest.skipped {
        let _ = writeln!(out, "skipped (no transcript): {id}");
    }
    for id in &digest.failed {
        let _ = writeln!(out, "skipped (analysis failed): {id}");
    }

    match digest.recommendation {
        Some(action) => {
            let _ = writeln!(out, "Recommendation: {action}");
        }
        None => out.push_str("Recommendation: not found in reply\n"),
    }

    out
}

pub fn render_json(digest: &Digest) -> Result<String> {
    Ok(serde_json::to_string_pretty(digest)?)
}
