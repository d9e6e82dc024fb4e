//! Prompt assembly for AI pull-request reviews.
//!
//! The diff is truncated to a fixed character budget before it is placed in
//! the prompt, bounding the cost and latency of a single review. Truncation
//! is a plain prefix cut; no summarization.

/// Maximum number of characters of diff text included in the prompt.
pub const MAX_DIFF_CHARS: usize = 16_000;

/// System prompt for code review.
pub fn get_system_prompt() -> String {
    include_str!("../prompt.txt").to_string()
}

/// Returns the first [`MAX_DIFF_CHARS`] characters of the diff.
///
/// Counts characters, not bytes, so the cut never lands inside a UTF-8
/// sequence.
pub fn truncate_diff(diff: &str) -> &str {
    match diff.char_indices().nth(MAX_DIFF_CHARS) {
        Some((byte_offset, _)) => &diff[..byte_offset],
        None => diff,
    }
}

/// Builds the user message for a review request: PR title, PR description
/// (with a placeholder when absent) and the truncated diff.
pub fn create_user_prompt(pr_title: &str, pr_body: Option<&str>, diff: &str) -> String {
    let body = match pr_body {
        Some(text) if !text.is_empty() => text,
        _ => "(no description)",
    };

    format!(
        "Pull Request Title: {}\n\nPull Request Description:\n{}\n\nGit Diff:\n{}\n",
        pr_title,
        body,
        truncate_diff(diff)
    )
}

/// Wraps generated review text in the fixed comment frame that is posted to
/// the pull request.
pub fn assemble_comment(review: &str) -> String {
    format!(
        "\u{1F916} **PR Guardian AI Review**\n\n{}\n\n---\n_Automated review powered by OpenAI_",
        review
    )
}
