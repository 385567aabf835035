//! CSV rendering of the user list.
//!
//! Only produces the text; where it is written is the caller's business.

use crate::types::UserData;

/// One `username,email,role` line per user, newline-terminated, no header.
pub fn render_user_csv(users: &[UserData]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(&csv_field(&user.username));
        out.push(',');
        out.push_str(&csv_field(&user.email));
        out.push(',');
        out.push_str(&csv_field(user.role.as_str()));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
