//! Telegram legacy `Markdown` rendering, matching the `parse_mode` the sink sends.

use crate::model::{Audience, DealNotification};

/// Telegram `parse_mode` the rendered text is written for.
pub const PARSE_MODE: &str = "Markdown";

/// Entity openers in legacy Markdown; nothing else honours a backslash.
const SPECIAL_CHARS: [char; 4] = ['_', '*', '`', '['];

/// Backslash-escape the Markdown entity openers in user supplied text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn header(audience: Audience) -> &'static str {
    match audience {
        Audience::Broadcast => "🚀 *DEAL CONFIRMED*",
        Audience::Subscriber => "🔔 *PRICE DROP ON AN ITEM YOU FOLLOW*",
    }
}

pub fn render(deal: &DealNotification, audience: Audience) -> String {
    let mut msg = format!(
        "{}\n\
        \n\
        🎮 *Game:* {}\n\
        💰 *Price:* {}$ _(was {}$)_\n\
        📉 *Discount:* %{}\n\
        🧠 *Analysis:* {}",
        header(audience),
        escape_markdown(&deal.item_name),
        deal.new_price,
        deal.old_price,
        deal.discount_rate,
        escape_markdown(&deal.rationale),
    );

    if let Some(link) = &deal.link {
        msg.push_str(&format!("\n\n🔗 [View in store]({link})"));
    }
    msg
}

pub fn render_test_message(stamp: &str) -> String {
    format!(
        "🧪 *Test message*\n\nDeal alerts are wired up ✅\n\n_{}_",
        escape_markdown(stamp)
    )
}
