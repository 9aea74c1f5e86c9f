//! Unwrap an optional single fenced code block.
//!
//! At most one leading fence (with an optional language tag) and one
//! trailing fence are removed. Text without fences passes through trimmed.

const FENCE: &str = "```";

pub fn unwrap_fenced(text: &str) -> String {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        let (first_line, remainder) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        body = if is_language_tag(first_line.trim()) {
            remainder
        } else {
            rest
        };
    }

    let body = body.trim_end();
    let body = body.strip_suffix(FENCE).unwrap_or(body);
    body.trim().to_string()
}

fn is_language_tag(tag: &str) -> bool {
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(unwrap_fenced("df[\"a\"] = 1"), "df[\"a\"] = 1");
        assert_eq!(unwrap_fenced("  x = 1\n"), "x = 1");
    }

    #[test]
    fn test_fence_with_tag() {
        let text = "```python\ndf[\"a\"] = 1\ndf[\"b\"] = 2\n```";
        assert_eq!(unwrap_fenced(text), "df[\"a\"] = 1\ndf[\"b\"] = 2");
    }

    #[test]
    fn test_fence_without_tag() {
        assert_eq!(unwrap_fenced("```\ndf = df.copy()\n```\n"), "df = df.copy()");
    }

    #[test]
    fn test_code_on_fence_line_is_kept() {
        assert_eq!(unwrap_fenced("```df[\"a\"] = 1```"), "df[\"a\"] = 1");
    }

    #[test]
    fn test_only_one_fence_pair_removed() {
        let text = "```\n```\ninner\n```\n```";
        assert_eq!(unwrap_fenced(text), "```\ninner\n```");
    }

    #[test]
    fn test_unterminated_fence() {
        assert_eq!(unwrap_fenced("```rtfs\ndf[\"a\"] = 1"), "df[\"a\"] = 1");
    }
}
