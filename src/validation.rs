use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

use crate::auth::SignUpForm;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Every complexity rule the password breaks; empty when it is acceptable.
pub fn password_problems(password: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if password.chars().count() < 8 {
        problems.push("password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        problems.push("password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        problems.push("password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("password must contain a number");
    }
    if !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        problems.push("password must contain a special character");
    }
    problems
}

pub fn validate_sign_up(form: &SignUpForm) -> Vec<String> {
    let mut problems = Vec::new();
    if form.full_name.trim().is_empty() {
        problems.push("full name is required".to_string());
    }
    if !is_valid_email(&form.email) {
        problems.push(format!("'{}' is not a valid email address", form.email.trim()));
    }
    problems.extend(password_problems(&form.password).into_iter().map(String::from));
    problems
}

/// Arithmetic challenge shown on sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Captcha {
    pub a: u32,
    pub b: u32,
}

impl Captcha {
    #[cfg(test)]
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            a: rng.gen_range(1..=10),
            b: rng.gen_range(1..=10),
        }
    }

    pub fn question(&self) -> String {
        format!("What is {} + {}?", self.a, self.b)
    }

    /// Only the exact sum is accepted.
    pub fn verify(&self, answer: &str) -> bool {
        answer
            .trim()
            .parse::<u64>()
            .is_ok_and(|n| n == u64::from(self.a) + u64::from(self.b))
    }
}
