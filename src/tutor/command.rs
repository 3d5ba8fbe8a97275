//! Classification of inbound text into tutor commands.

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!translate <phrase...> <lang>`
    Translate { phrase: String, target: String },
    /// `!translate` with fewer than two arguments.
    TranslateUsage,
    Quiz,
    Lesson,
    Leaderboard,
    Help,
    /// Anything else, lower-cased. Consumed as a quiz answer if the sender has a session.
    Text(String),
}

impl Command {
    /// Parse a message. Matching is case-insensitive and `/cmd` or
    /// `/cmd@botname` is accepted wherever `!cmd` is.
    pub fn parse(text: &str) -> Self {
        let content = text.to_lowercase();
        // Surrounding whitespace is not significant: "!quiz " is still a command.
        let tokens: Vec<&str> = content.split_whitespace().collect();

        let Some(head) = tokens.first().map(|t| normalize_head(t)) else {
            return Self::Text(content);
        };

        if head == "!translate" {
            // phrase is everything between the command and the language code
            return match tokens.len() {
                0..=2 => Self::TranslateUsage,
                n => Self::Translate {
                    phrase: tokens[1..n - 1].join(" "),
                    target: tokens[n - 1].to_string(),
                },
            };
        }

        if tokens.len() > 1 {
            return Self::Text(content);
        }

        match head.as_str() {
            "!quiz" => Self::Quiz,
            "!lesson" => Self::Lesson,
            "!leaderboard" => Self::Leaderboard,
            "!help" => Self::Help,
            _ => Self::Text(content),
        }
    }
}

/// Map `/cmd` and `/cmd@botname` onto `!cmd`.
fn normalize_head(token: &str) -> String {
    match token.strip_prefix('/') {
        Some(rest) => {
            let name = rest.split_once('@').map(|(name, _)| name).unwrap_or(rest);
            format!("!{}", name)
        }
        None => token.to_string(),
    }
}
