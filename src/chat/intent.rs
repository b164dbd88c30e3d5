//! Pure message classification.
//!
//! Everything here is a function from normalized text to an enumeration, so
//! the resolver's transition table stays exhaustive and testable without a
//! catalogue or any store behind it.

use once_cell::sync::Lazy;
use regex::Regex;

const GREETINGS: [&str; 9] = [
    "hi", "hello", "hey", "hii", "hiii", "hiiii", "helo", "hllo", "hola",
];

const YES_TOKENS: [&str; 6] = ["yes", "yeah", "yep", "sure", "ok", "1"];
const NO_TOKENS: [&str; 5] = ["no", "nope", "no thanks", "nah", "2"];
const COD_TOKENS: [&str; 4] = ["cod", "cash", "cash on delivery", "1"];
const UPI_TOKENS: [&str; 6] = ["upi", "online", "gpay", "google pay", "phonepe", "2"];

const ORDER_ID_PREFIX: &str = "order id-";

static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:pc|pcs|pieces?|units?)?\b").expect("static regex"));

/// Lowercase and trim. All classifiers expect normalized input.
pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

pub fn is_greeting(normalized: &str) -> bool {
    GREETINGS.contains(&normalized)
}

/// Legacy direct-order messages: `order id-<id>`.
pub fn parse_order_id(normalized: &str) -> Option<String> {
    normalized
        .strip_prefix(ORDER_ID_PREFIX)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// A message is a product query when it carries enough signal: at least two
/// words, or any digit.
pub fn is_valid_query(normalized: &str) -> bool {
    normalized.split_whitespace().count() >= 2 || normalized.chars().any(|c| c.is_ascii_digit())
}

/// Reply to a product offer ("would you like to order?").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferReply {
    Yes,
    No,
}

pub fn classify_offer_reply(normalized: &str) -> Option<OfferReply> {
    if YES_TOKENS.contains(&normalized) {
        Some(OfferReply::Yes)
    } else if NO_TOKENS.contains(&normalized) {
        Some(OfferReply::No)
    } else {
        None
    }
}

/// Reply to the payment-options prompt. Digit tokens are interpreted
/// against this prompt's numbering, which is why classification is
/// stage-relative rather than global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentReply {
    CashOnDelivery,
    Upi,
    No,
}

pub fn classify_payment_reply(normalized: &str) -> Option<PaymentReply> {
    if COD_TOKENS.contains(&normalized) {
        Some(PaymentReply::CashOnDelivery)
    } else if UPI_TOKENS.contains(&normalized) {
        Some(PaymentReply::Upi)
    } else if NO_TOKENS.contains(&normalized) {
        Some(PaymentReply::No)
    } else {
        None
    }
}

/// First integer in the message, optionally followed by a unit word
/// (pc/pcs/piece/unit). `None` means the quantity was not stated.
pub fn extract_quantity(normalized: &str) -> Option<u32> {
    QUANTITY_RE
        .captures(normalized)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
