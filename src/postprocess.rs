use chat_provider::{DEFAULT_THINK_END_TAG, DEFAULT_THINK_START_TAG};
use regex::Regex;
use tracing::warn;

/// Removes every `start…end` reasoning block, tags included, and trims the result.
///
/// Matching is non-greedy and case-sensitive. A start tag without a matching end
/// tag is left in place. Whitespace directly after a removed block goes with it.
/// Empty tags fall back to `<think>` and `</think>`.
#[must_use]
pub fn strip_think_blocks(text: &str, start_tag: &str, end_tag: &str) -> String {
    let start_tag = if start_tag.is_empty() {
        DEFAULT_THINK_START_TAG
    } else {
        start_tag
    };
    let end_tag = if end_tag.is_empty() {
        DEFAULT_THINK_END_TAG
    } else {
        end_tag
    };

    let pattern = format!(
        r"(?s){}.*?{}\s*",
        regex::escape(start_tag),
        regex::escape(end_tag)
    );
    match Regex::new(&pattern) {
        Ok(blocks) => blocks.replace_all(text, "").trim().to_owned(),
        Err(error) => {
            warn!(%error, "reasoning block pattern rejected; returning text unchanged");
            text.trim().to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::strip_think_blocks;

    #[test]
    fn removes_block_and_following_whitespace() {
        assert_eq!(
            strip_think_blocks("<think>internal</think>\n\nresult", "<think>", "</think>"),
            "result"
        );
    }

    #[test]
    fn custom_tags_are_matched_literally() {
        assert_eq!(
            strip_think_blocks("[[t]]hidden[[/t]] visible", "[[t]]", "[[/t]]"),
            "visible"
        );
    }

    #[test]
    fn multiple_blocks_are_removed_non_greedily() {
        assert_eq!(
            strip_think_blocks(
                "<think>first</think> visible <think>second</think> more text",
                "<think>",
                "</think>"
            ),
            "visible more text"
        );
    }

    #[test]
    fn multiline_block_is_removed() {
        assert_eq!(
            strip_think_blocks("<think>a\nb\nc</think>\nanswer\n", "<think>", "</think>"),
            "answer"
        );
    }

    #[test]
    fn unterminated_block_is_kept() {
        assert_eq!(
            strip_think_blocks(
                "<think>done</think>kept <think>never closed",
                "<think>",
                "</think>"
            ),
            "kept <think>never closed"
        );
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert_eq!(
            strip_think_blocks("<THINK>x</THINK> y", "<think>", "</think>"),
            "<THINK>x</THINK> y"
        );
    }

    #[test]
    fn empty_tags_use_defaults() {
        assert_eq!(strip_think_blocks("<think>x</think>y", "", ""), "y");
        assert_eq!(strip_think_blocks("", "<think>", "</think>"), "");
        assert_eq!(
            strip_think_blocks("just visible text", "<think>", "</think>"),
            "just visible text"
        );
    }
}
