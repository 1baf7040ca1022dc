//! Keyword classification applied when a task is created without a category.

const RULES: &[(&[&str], &str)] = &[
    (&["买", "购", "超市", "buy", "shop"], "🛒 购物"),
    (&["学", "习", "书", "code", "py", "react", "bug"], "💻 学习"),
    (&["跑", "健身", "运动", "gym", "run"], "💪 运动"),
];

const FALLBACK: &str = "📌 日常";

/// Derive a category label from task content. First matching rule wins.
#[must_use]
pub fn classify_content(content: &str) -> &'static str {
    let text = content.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map_or(FALLBACK, |(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shopping_keywords() {
        assert_eq!(classify_content("去超市买牛奶"), "🛒 购物");
        assert_eq!(classify_content("Buy milk"), "🛒 购物");
    }

    #[test]
    fn rules_are_checked_in_order() {
        // "shop" wins over "react" because shopping is listed first.
        assert_eq!(classify_content("shop for a React book"), "🛒 购物");
        assert_eq!(classify_content("fix the login bug"), "💻 学习");
        assert_eq!(classify_content("Gym at 7"), "💪 运动");
    }

    #[test]
    fn unmatched_content_falls_back_to_daily() {
        assert_eq!(classify_content("call mom"), "📌 日常");
    }
}
