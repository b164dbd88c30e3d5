//! User-facing reply rendering.
//!
//! Replies are plain newline-delimited text. Prompts with choices use the
//! numbered-list convention: `"<body>\n\n1. <opt1>\n2. <opt2>"` — which is
//! also why bare "1"/"2" replies are meaningful to the classifier.

use crate::catalogue::CatalogueEntry;

/// Render a prompt body with numbered options.
pub fn render_options(body: &str, options: &[&str]) -> String {
    let mut out = String::from(body);
    out.push_str("\n\n");
    for (i, option) in options.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}. {}", i + 1, option));
    }
    out
}

pub fn greeting() -> String {
    "Hi! Please tell me what plumbing item you're looking for.\nExample: 2 pieces of bend"
        .to_string()
}

pub fn clarification() -> String {
    "Could you please specify what item you need and the quantity?\nExample: 2 pieces of bend"
        .to_string()
}

pub fn no_matches() -> String {
    "Sorry, I couldn't find any matching items.".to_string()
}

pub fn generic_error() -> String {
    "Sorry, something went wrong. Please try again later.".to_string()
}

pub fn order_error() -> String {
    "Sorry, there was an error processing your order. Please try again.".to_string()
}

pub fn no_thanks() -> String {
    "No problem! Let me know if you need anything else.".to_string()
}

pub fn product_offer(entry: &CatalogueEntry) -> String {
    let body = format!(
        "I found: {} {}\nSize: {}\nPrice: ₹{}/{}\n\nWould you like to order?",
        entry.brand, entry.name, entry.size_text, entry.price, entry.price_unit
    );
    render_options(&body, &["Yes", "No thanks"])
}

pub fn payment_options() -> String {
    render_options(
        "Great! How would you like to pay?",
        &["Cash on Delivery", "UPI"],
    )
}

pub fn cod_confirmed() -> String {
    "Thank you! Your order is confirmed for cash on delivery.".to_string()
}

pub fn upi_instructions(upi_id: &str) -> String {
    format!(
        "Thank you! Please complete the UPI payment to {} and reply here once done.",
        upi_id
    )
}

pub fn payment_link(base_url: &str, order_id: &str) -> String {
    format!(
        "Thank you! Please complete payment here:\n{}/{}",
        base_url.trim_end_matches('/'),
        order_id
    )
}
