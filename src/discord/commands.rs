//! Chat command parsing and reply construction.
//!
//! Nothing here talks to Discord; the gateway handler parses incoming text
//! with these helpers and sends the resulting [`Card`]s.
use super::format::{Card, BRAND_COLOR, ERROR_COLOR, SUCCESS_COLOR, WARN_COLOR};
use crate::pipeline::{PipelineStatus, RunOutcome, RunReport};
use chrono::{DateTime, Utc};

/// A prefixed chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Manual fetch-and-post to all configured channels (admin only).
    News,
    Status,
    Info,
}

impl Command {
    /// Parses the first word of `content` as a command with `prefix`.
    pub fn parse(content: &str, prefix: &str) -> Option<Self> {
        let word = content.split_whitespace().next()?;
        let name = word.strip_prefix(prefix)?.to_lowercase();
        match name.as_str() {
            "news" => Some(Command::News),
            "status" => Some(Command::Status),
            "info" | "help" => Some(Command::Info),
            _ => None,
        }
    }
}

/// What a mention of the bot is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionIntent {
    NewsRequest,
    Greeting,
}

/// Phrases that turn a mention into a news request (Mongolian and English).
const NEWS_KEYWORDS: &[&str] = &[
    "шинэ мэдээ",
    "мэдээ",
    "юу байна",
    "сонин",
    "мэдээлэл",
    "tech news",
    "news",
];

impl MentionIntent {
    pub fn classify(content: &str) -> Self {
        let content = content.to_lowercase();
        if NEWS_KEYWORDS.iter().any(|k| content.contains(k)) {
            MentionIntent::NewsRequest
        } else {
            MentionIntent::Greeting
        }
    }
}

/// The member invoking a command, as far as authorization cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
    /// Holds Manage Messages in the channel's guild.
    pub manage_messages: bool,
}

/// Who may trigger a manual run: members with Manage Messages, plus the
/// configured users and roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    pub user_ids: Vec<u64>,
    pub role_ids: Vec<u64>,
}

impl AdminPolicy {
    pub fn allows(&self, caller: &Caller) -> bool {
        caller.manage_messages
            || self.user_ids.contains(&caller.user_id)
            || caller.role_ids.iter().any(|r| self.role_ids.contains(r))
    }
}

pub fn permission_denied_text() -> &'static str {
    "Энэ командыг ашиглах эрх танд байхгүй байна."
}

pub fn searching_card() -> Card {
    Card::new(
        "🔍 Шинэ мэдээ хайж байна...",
        "Хамгийн сүүлийн технологийн мэдээг авч байна",
        WARN_COLOR,
    )
}

/// Reply after a mention-triggered run.
pub fn mention_result_card(report: &RunReport) -> Card {
    match report.outcome {
        RunOutcome::NothingToPost => Card::new(
            "📰 Мэдээ олдсонгүй",
            "Одоогоор шинэ мэдээ байхгүй байна. Дахин оролдоно уу.",
            ERROR_COLOR,
        ),
        RunOutcome::Failed => Card::new(
            "❌ Алдаа гарлаа",
            "Мэдээ татахад алдаа гарлаа. Дахин оролдоно уу.",
            ERROR_COLOR,
        ),
        RunOutcome::Delivered | RunOutcome::Partial => Card::new(
            "✅ Амжилттай",
            format!("{} шинэ мэдээ олдлоо!", report.selected),
            SUCCESS_COLOR,
        ),
    }
}

/// One-line summary of a manual run for the `!news` caller.
pub fn manual_run_text(report: &RunReport) -> String {
    let ok = report.channels.iter().filter(|c| c.error.is_none()).count();
    match report.outcome {
        RunOutcome::NothingToPost => "Шинэ технологийн мэдээ олдсонгүй.".to_string(),
        _ if report.channels.is_empty() => "Суваг тохируулаагүй байна.".to_string(),
        _ => format!(
            "Мэдээ шинэчлэлт дууслаа: {} мэдээ, {}/{} суваг.",
            report.selected,
            ok,
            report.channels.len()
        ),
    }
}

/// Picks one of the greeting cards, rotating by `seed`.
pub fn greeting_card(seed: u64) -> Card {
    let options = [
        (
            "👋 Сайн байна уу!",
            "Би GDG Ulaanbaatar-ын технологийн мэдээний бот байна.",
            BRAND_COLOR,
        ),
        (
            "🤖 Технологийн мэдээ",
            "Шинэ мэдээ авахыг хүсвэл **'шинэ мэдээ'** гэж бичээрэй.",
            SUCCESS_COLOR,
        ),
        (
            "ℹ️ Тусламж",
            "Дэлгэрэнгүй мэдээлэл авахыг хүсвэл **`!info`** командыг ашиглана уу.",
            0x339af0,
        ),
    ];
    let (title, description, color) = options[(seed % options.len() as u64) as usize];
    Card::new(title, description, color)
}

pub fn info_card(status: &PipelineStatus, prefix: &str) -> Card {
    let sources = source_names(status);
    Card::new(
        "ℹ️ GDG Ulaanbaatar News Bot тусламж",
        format!("🤖 Технологийн мэдээний бот • {} -ээс мэдээ авч орчуулдаг", sources),
        BRAND_COLOR,
    )
    .field(
        "⚡ Командууд",
        format!(
            "🔍 `{p}news` - Шинэ мэдээ татах (админ)\n📊 `{p}status` - Ботын статус шалгах\nℹ️ `{p}info` - Энэ тусламжийг харах",
            p = prefix
        ),
        false,
    )
    .field(
        "💬 Ментион",
        "```@bot шинэ мэдээ юу байна?```\nШинэ мэдээ харахын тулд ботыг дуудаарай",
        false,
    )
    .field(
        "🔄 Автомат мэдээ",
        format!("```Өдөр бүр {:02}:00 UTC```", status.trigger_hour),
        false,
    )
    .field("🌍 Орчуулга", "```Англи ➜ Монгол```", true)
    .field("📰 Эх сурвалж", format!("```{}```", sources), true)
}

pub fn status_card(status: &PipelineStatus, now: DateTime<Utc>) -> Card {
    let last_run = match &status.last_run {
        Some(run) => format!(
            "{}\n{:?} • {}/{}",
            run.at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.outcome,
            run.channels_ok,
            run.channels_total
        ),
        None => "Хэзээ ч".to_string(),
    };
    let next = if status.next_scheduled <= now {
        "Удахгүй".to_string()
    } else {
        status.next_scheduled.format("%Y-%m-%d %H:%M UTC").to_string()
    };
    let channels = if status.channels.len() <= 5 {
        status
            .channels
            .iter()
            .map(|c| format!("<#{}>", c))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        format!("```{} суваг```", status.channels.len())
    };

    Card::new(
        "🤖 GDG News Bot статус",
        "Технологийн мэдээний ботын одоогийн байдал",
        BRAND_COLOR,
    )
    .field("⏰ Сүүлийн ажиллагаа", format!("```{}```", last_run), true)
    .field("⏭️ Дараагийн ажиллагаа", format!("```{}```", next), true)
    .field(
        "🔄 Шалгах интервал",
        format!("```{} минут```", status.poll_interval.as_secs() / 60),
        true,
    )
    .field(
        "📺 Сувгууд",
        if channels.is_empty() { "-".to_string() } else { channels },
        true,
    )
    .field("🌐 Эх сурвалж", format!("```{}```", source_names(status)), true)
    .field(
        "🔍 Tech Filter",
        format!(
            "```{}```",
            if status.strict_filter { "Enabled" } else { "Disabled" }
        ),
        true,
    )
}

fn source_names(status: &PipelineStatus) -> String {
    let mut names: Vec<&str> = status
        .sources
        .iter()
        .map(|s| s.source.display_name())
        .collect();
    names.dedup();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedSource;
    use std::time::Duration;

    fn status() -> PipelineStatus {
        PipelineStatus {
            last_run: None,
            last_fired: None,
            next_scheduled: "2024-05-02T01:00:00Z".parse().unwrap(),
            trigger_hour: 1,
            poll_interval: Duration::from_secs(3600),
            channels: vec![111, 222],
            strict_filter: true,
            sources: FeedSource::defaults(),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("!news", "!"), Some(Command::News));
        assert_eq!(Command::parse("  !STATUS please", "!"), Some(Command::Status));
        assert_eq!(Command::parse("!help", "!"), Some(Command::Info));
        assert_eq!(Command::parse("!unknown", "!"), None);
        assert_eq!(Command::parse("news", "!"), None);
        assert_eq!(Command::parse("", "!"), None);
        assert_eq!(Command::parse("?news", "?"), Some(Command::News));
    }

    #[test]
    fn test_mention_intent() {
        assert_eq!(
            MentionIntent::classify("<@123> шинэ мэдээ юу байна?"),
            MentionIntent::NewsRequest
        );
        assert_eq!(
            MentionIntent::classify("<@123> any Tech News today?"),
            MentionIntent::NewsRequest
        );
        assert_eq!(MentionIntent::classify("<@123> hello"), MentionIntent::Greeting);
    }

    #[test]
    fn test_admin_policy() {
        let policy = AdminPolicy {
            user_ids: vec![1],
            role_ids: vec![50],
        };
        let caller = |user_id, role_ids: &[u64], manage_messages| Caller {
            user_id,
            role_ids: role_ids.to_vec(),
            manage_messages,
        };
        assert!(policy.allows(&caller(1, &[], false)));
        assert!(policy.allows(&caller(2, &[49, 50], false)));
        assert!(!policy.allows(&caller(2, &[49], false)));
        assert!(policy.allows(&caller(2, &[49], true)));
    }

    #[test]
    fn test_default_policy_allows_message_managers_only() {
        let policy = AdminPolicy::default();
        assert!(policy.allows(&Caller {
            user_id: 7,
            role_ids: vec![],
            manage_messages: true,
        }));
        assert!(!policy.allows(&Caller {
            user_id: 7,
            role_ids: vec![50],
            manage_messages: false,
        }));
    }

    #[test]
    fn test_status_card_fields() {
        let now = "2024-05-01T12:00:00Z".parse().unwrap();
        let card = status_card(&status(), now);
        let channels = card.fields.iter().find(|f| f.name == "📺 Сувгууд").unwrap();
        assert_eq!(channels.value, "<#111>\n<#222>");
        let next = card
            .fields
            .iter()
            .find(|f| f.name == "⏭️ Дараагийн ажиллагаа")
            .unwrap();
        assert!(next.value.contains("2024-05-02 01:00 UTC"));
        let sources = card.fields.iter().find(|f| f.name == "🌐 Эх сурвалж").unwrap();
        assert_eq!(sources.value, "```The Verge, CNET```");
    }

    #[test]
    fn test_info_card_uses_prefix() {
        let card = info_card(&status(), "?");
        assert!(card.fields[0].value.contains("`?news`"));
    }

    #[test]
    fn test_greeting_rotates() {
        assert_ne!(greeting_card(0).title, greeting_card(1).title);
        assert_eq!(greeting_card(0), greeting_card(3));
    }
}
