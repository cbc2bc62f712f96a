//! Reply text and keyboard construction.
//!
//! Every user-facing string the bot sends is built here, so handlers stay
//! free of formatting and tests can assert on exact output.

use chrono::{DateTime, Utc};

use crate::channels::Keyboard;
use crate::listing::PageWindow;
use crate::store::User;

/// Admin panel button labels. These arrive back as plain text, so the
/// dispatcher matches inbound messages against them verbatim.
pub mod buttons {
    pub const LIST_USERS: &str = "📜 List Users";
    pub const LIST_ADMINS: &str = "👑 List Admins";
    pub const DELETE_USER: &str = "🗑 Delete User";
    pub const PROMOTE_USER: &str = "⬆ Promote User";
    pub const UNPROMOTE_ADMIN: &str = "⬇ Unpromote Admin";
    pub const APPROVE_PENDING: &str = "✅ Approve Pending Admins";
    pub const MY_PROFILE: &str = "👤 My Profile";
}

/// Callback names carried in inline buttons.
pub mod actions {
    pub const MY_PROFILE: &str = "my_profile";
    pub const REQUEST_ADMIN: &str = "request_admin";
    /// Pagination callbacks are `page_<n>`.
    pub const PAGE_PREFIX: &str = "page_";
}

/// Persistent keyboard shown to admins after /start.
pub fn admin_keyboard() -> Keyboard {
    Keyboard::Reply(vec![
        vec![buttons::LIST_USERS.into(), buttons::LIST_ADMINS.into()],
        vec![buttons::DELETE_USER.into(), buttons::PROMOTE_USER.into()],
        vec![buttons::UNPROMOTE_ADMIN.into(), buttons::APPROVE_PENDING.into()],
        vec![buttons::MY_PROFILE.into()],
    ])
}

/// Inline options offered to a freshly registered user.
pub fn user_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        vec![("My Profile".into(), actions::MY_PROFILE.into())],
        vec![("Request to be Admin".into(), actions::REQUEST_ADMIN.into())],
    ])
}

/// "March 5, 2026 3:07 PM" style registration timestamp.
pub fn format_registration_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y %-I:%M %p").to_string()
}

fn user_entry(index: usize, user: &User) -> String {
    format!(
        "{index}. 👤 Name: {}\n   📧 Email: {}\n   📱 Phone: {}\n   💬 Telegram ID: {}\n   📅 Registered: {}",
        user.full_name,
        user.email,
        user.phone_number,
        user.telegram_id,
        format_registration_date(user.created_at),
    )
}

/// One page of registered users, numbered from 1 within the page.
pub fn user_list(users: &[User]) -> String {
    let entries: Vec<String> = users
        .iter()
        .enumerate()
        .map(|(i, user)| user_entry(i + 1, user))
        .collect();
    format!("Registered Users:\n\n{}", entries.join("\n\n"))
}

pub fn admin_list(admins: &[User]) -> String {
    let entries: Vec<String> = admins
        .iter()
        .enumerate()
        .map(|(i, admin)| user_entry(i + 1, admin))
        .collect();
    format!("List of Admins:\n\n{}", entries.join("\n\n"))
}

/// Queued admin requests. Shorter entries: the approver only needs name,
/// email, and the id to paste into the promote prompt.
pub fn pending_list(pending: &[User]) -> String {
    let entries: Vec<String> = pending
        .iter()
        .enumerate()
        .map(|(i, user)| {
            format!(
                "{}. 👤 Name: {}\n   📧 Email: {}\n   💬 Telegram ID: {}",
                i + 1,
                user.full_name,
                user.email,
                user.telegram_id,
            )
        })
        .collect();
    format!("Pending Admin Approvals:\n\n{}", entries.join("\n"))
}

/// Plain-text profile for the "👤 My Profile" panel button.
pub fn profile(user: &User) -> String {
    format!(
        "👤 Name: {}\n📧 Email: {}\n📱 Phone: {}\n📅 Registered: {}",
        user.full_name,
        user.email,
        user.phone_number,
        format_registration_date(user.created_at),
    )
}

/// Markdown profile for the `my_profile` inline callback.
pub fn profile_markdown(user: &User) -> String {
    format!(
        "📌 *Your Profile:*\n\n👤 *Full Name:* {}\n📧 *Email:* {}\n📞 *Phone:* {}",
        user.full_name, user.email, user.phone_number,
    )
}

/// Previous/next controls for a user-list page. `None` when the whole
/// list fits on one page.
pub fn page_buttons(window: &PageWindow) -> Option<Keyboard> {
    let mut row = Vec::new();
    if window.has_prev {
        row.push((
            "◀ Previous".to_string(),
            format!("{}{}", actions::PAGE_PREFIX, window.page - 1),
        ));
    }
    if window.has_next {
        row.push((
            "Next ▶".to_string(),
            format!("{}{}", actions::PAGE_PREFIX, window.page + 1),
        ));
    }
    if row.is_empty() {
        None
    } else {
        Some(Keyboard::Inline(vec![row]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::page_window;
    use chrono::TimeZone;

    fn sample_user() -> User {
        User {
            telegram_id: 42,
            full_name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: "+15551234567".to_string(),
            is_admin: false,
            created_at: Utc.with_ymd_and_hms(2026, 3, 5, 15, 7, 0).unwrap(),
        }
    }

    #[test]
    fn registration_date_is_unpadded() {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 15, 7, 0).unwrap();
        assert_eq!(format_registration_date(at), "March 5, 2026 3:07 PM");
    }

    #[test]
    fn registration_date_morning_hour() {
        let at = Utc.with_ymd_and_hms(2025, 12, 31, 9, 5, 0).unwrap();
        assert_eq!(format_registration_date(at), "December 31, 2025 9:05 AM");
    }

    #[test]
    fn user_list_numbers_entries_within_page() {
        let mut second = sample_user();
        second.telegram_id = 43;
        second.full_name = "Bob Jones".to_string();
        second.email = "bob@example.com".to_string();

        let text = user_list(&[sample_user(), second]);
        assert!(text.starts_with("Registered Users:\n\n1. 👤 Name: Alice Smith"));
        assert!(text.contains("2. 👤 Name: Bob Jones"));
        assert!(text.contains("💬 Telegram ID: 42"));
        assert!(text.contains("📅 Registered: March 5, 2026 3:07 PM"));
    }

    #[test]
    fn admin_list_uses_full_entries() {
        let text = admin_list(&[sample_user()]);
        assert!(text.starts_with("List of Admins:\n\n1. "));
        assert!(text.contains("📱 Phone: +15551234567"));
    }

    #[test]
    fn pending_list_omits_phone_and_date() {
        let text = pending_list(&[sample_user()]);
        assert!(text.starts_with("Pending Admin Approvals:\n\n1. "));
        assert!(text.contains("💬 Telegram ID: 42"));
        assert!(!text.contains("📱"));
        assert!(!text.contains("📅"));
    }

    #[test]
    fn profile_includes_registration_date() {
        let text = profile(&sample_user());
        assert_eq!(
            text,
            "👤 Name: Alice Smith\n📧 Email: alice@example.com\n📱 Phone: +15551234567\n📅 Registered: March 5, 2026 3:07 PM"
        );
    }

    #[test]
    fn markdown_profile_shape() {
        let text = profile_markdown(&sample_user());
        assert!(text.starts_with("📌 *Your Profile:*\n\n"));
        assert!(text.contains("👤 *Full Name:* Alice Smith"));
        assert!(!text.contains("Registered"));
    }

    #[test]
    fn admin_keyboard_rows() {
        let Keyboard::Reply(rows) = admin_keyboard() else {
            panic!("admin panel is a reply keyboard");
        };
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec!["📜 List Users", "👑 List Admins"]);
        assert_eq!(rows[3], vec!["👤 My Profile"]);
    }

    #[test]
    fn user_keyboard_callbacks() {
        let Keyboard::Inline(rows) = user_keyboard() else {
            panic!("user options are inline buttons");
        };
        assert_eq!(rows[0][0], ("My Profile".to_string(), "my_profile".to_string()));
        assert_eq!(
            rows[1][0],
            ("Request to be Admin".to_string(), "request_admin".to_string())
        );
    }

    #[test]
    fn page_buttons_follow_window() {
        let first = page_window(1, 10, 25);
        let Some(Keyboard::Inline(rows)) = page_buttons(&first) else {
            panic!("first of three pages has controls");
        };
        assert_eq!(rows[0], vec![("Next ▶".to_string(), "page_2".to_string())]);

        let middle = page_window(2, 10, 25);
        let Some(Keyboard::Inline(rows)) = page_buttons(&middle) else {
            panic!("middle page has controls");
        };
        assert_eq!(
            rows[0],
            vec![
                ("◀ Previous".to_string(), "page_1".to_string()),
                ("Next ▶".to_string(), "page_3".to_string()),
            ]
        );

        let only = page_window(1, 10, 5);
        assert!(page_buttons(&only).is_none());
    }
}
