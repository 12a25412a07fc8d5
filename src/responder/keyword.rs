use async_trait::async_trait;

use super::{Answer, Responder};

pub const SECURITY_REPLY: &str = "Security is crucial in application development. Always validate input, use HTTPS, implement proper authentication, and keep dependencies updated. What specific security topic would you like to know more about?";
pub const PASSWORD_REPLY: &str = "Password security best practices include: using strong, unique passwords; enabling multi-factor authentication; storing passwords using secure hashing algorithms like bcrypt; and never storing passwords in plain text.";
pub const SQL_INJECTION_REPLY: &str = "SQL injection occurs when user input is directly included in SQL queries. Prevent it by using parameterized queries, stored procedures, or ORM frameworks that handle input sanitization automatically.";
pub const XSS_REPLY: &str = "Cross-Site Scripting (XSS) attacks inject malicious scripts into web pages. Prevent XSS by sanitizing user input, using Content Security Policy headers, and encoding output properly.";
pub const GREETING_REPLY: &str = "Hello! I'm WizKnowledge AI, your security-focused assistant. I can help you with cybersecurity questions, secure coding practices, and general IT security topics. What would you like to know?";

/// Canned answers picked by substring match. First rule that hits wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordResponder;

const RULES: &[(&[&str], &str)] = &[
    (&["security", "vulnerability"], SECURITY_REPLY),
    (&["password"], PASSWORD_REPLY),
    (&["sql injection", "sqli"], SQL_INJECTION_REPLY),
    (&["xss", "cross-site scripting"], XSS_REPLY),
    (&["hello", "hi"], GREETING_REPLY),
];

pub fn fallback_reply(message: &str) -> String {
    format!(
        "Thank you for your question: '{}'. While I'm a mock AI assistant in this security lab environment, I can help with security-related topics like secure coding, vulnerability assessment, and cybersecurity best practices. Could you ask something more specific about security?",
        message
    )
}

impl KeywordResponder {
    pub fn reply(&self, message: &str) -> String {
        let lower = message.to_lowercase();
        RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map(|(_, reply)| reply.to_string())
            .unwrap_or_else(|| fallback_reply(message))
    }
}

#[async_trait]
impl Responder for KeywordResponder {
    async fn answer(&self, question: &str, _context: Option<&str>) -> Answer {
        Answer {
            text: self.reply(question),
            confidence: None,
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_injection_is_deterministic() {
        let r = KeywordResponder;
        assert_eq!(r.reply("What is SQL Injection?"), SQL_INJECTION_REPLY);
        assert_eq!(r.reply("explain sqli"), SQL_INJECTION_REPLY);
    }

    #[test]
    fn xss_is_deterministic() {
        let r = KeywordResponder;
        assert_eq!(r.reply("xss"), XSS_REPLY);
        assert_eq!(r.reply("Cross-Site Scripting?"), XSS_REPLY);
    }

    #[test]
    fn priority_order_prefers_earlier_rules() {
        let r = KeywordResponder;
        // "security" outranks "password", which outranks "sql injection"
        assert_eq!(r.reply("password security"), SECURITY_REPLY);
        assert_eq!(r.reply("password in a sql injection"), PASSWORD_REPLY);
        assert_eq!(r.reply("Hello there"), GREETING_REPLY);
    }

    #[test]
    fn unknown_topic_falls_back_with_message() {
        let r = KeywordResponder;
        let msg = "Tell me about quantum gravity";
        assert_eq!(r.reply(msg), fallback_reply(msg));
        assert!(r.reply(msg).contains("'Tell me about quantum gravity'"));
    }

    #[tokio::test]
    async fn answer_has_no_confidence() {
        let a = KeywordResponder.answer("xss", Some("ignored")).await;
        assert_eq!(a.text, XSS_REPLY);
        assert_eq!(a.confidence, None);
    }

    #[tokio::test]
    async fn always_healthy() {
        assert!(KeywordResponder.health_check().await);
    }
}
