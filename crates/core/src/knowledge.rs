//! Knowledge Base
//!
//! A small, static set of troubleshooting articles searched by keyword
//! overlap. It backs the `check_knowledge_base` action.

use serde::Serialize;

/// A troubleshooting article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub keywords: Vec<String>,
    pub steps: Vec<String>,
}

impl Article {
    pub fn new(title: &str, keywords: &[&str], steps: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn score(&self, terms: &[String]) -> usize {
        terms
            .iter()
            .filter(|term| self.keywords.iter().any(|k| term.starts_with(k.as_str())))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    articles: Vec<Article>,
    fallback_steps: Vec<String>,
}

impl KnowledgeBase {
    pub fn new(articles: Vec<Article>, fallback_steps: Vec<String>) -> Self {
        Self {
            articles,
            fallback_steps,
        }
    }

    /// Returns the article sharing the most keywords with the query, if any.
    /// Ties go to the article listed first.
    pub fn search(&self, query: &str) -> Option<&Article> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let mut best: Option<(&Article, usize)> = None;
        for article in &self.articles {
            let score = article.score(&terms);
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((article, score));
            }
        }
        best.map(|(article, _)| article)
    }

    /// Generic steps offered when no article matches.
    pub fn fallback_steps(&self) -> &[String] {
        &self.fallback_steps
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(
            vec![
                Article::new(
                    "Signing in and password resets",
                    &["login", "log", "sign", "password", "locked", "2fa"],
                    &[
                        "Use the 'Forgot password' link on the sign-in page",
                        "Check your inbox and spam folder for the reset email",
                        "Sign in with the new password within 30 minutes",
                    ],
                ),
                Article::new(
                    "Slow or unresponsive application",
                    &["slow", "performance", "lag", "freez", "hang", "crash"],
                    &[
                        "Close and reopen the application",
                        "Clear the application cache",
                        "Install any pending updates",
                    ],
                ),
                Article::new(
                    "Network and connectivity problems",
                    &["network", "internet", "wifi", "connect", "offline", "router"],
                    &[
                        "Restart your router and wait two minutes",
                        "Forget and rejoin the Wi-Fi network",
                        "Try a wired connection to rule out wireless issues",
                    ],
                ),
                Article::new(
                    "Charges, invoices and refunds",
                    &["bill", "charge", "invoice", "refund", "payment"],
                    &[
                        "Open Billing in your account settings",
                        "Compare the charge with your latest invoice",
                        "Request a refund from the invoice page if it is incorrect",
                    ],
                ),
            ],
            vec![
                "Restart the device".to_string(),
                "Clear cache and cookies".to_string(),
                "Check network connectivity".to_string(),
            ],
        )
    }
}
