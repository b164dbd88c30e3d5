//! The per-message state machine.
//!
//! One call per inbound message: classify, consult the pending slot, drive
//! the matcher for new queries, and write order rows. Every path produces a
//! reply; order-store failures are logged and surfaced as an apology, and
//! the state transition for the failed action is skipped so the prior
//! state stays intact.

use std::sync::Arc;

use chrono::Utc;

use crate::catalogue::{rank, CatalogueEntry, CatalogueStore};
use crate::store::{status, OrderRecord, OrderStore};

use super::intent::{self, OfferReply, PaymentReply};
use super::reply;
use super::state::{ConversationEntry, ConversationStore, PendingStage};

pub struct DialogueResolver {
    catalogue: Arc<CatalogueStore>,
    orders: Arc<dyn OrderStore>,
    conversations: Arc<dyn ConversationStore>,
    payment_base_url: String,
    upi_id: String,
    top_n: usize,
}

impl DialogueResolver {
    pub fn new(
        catalogue: Arc<CatalogueStore>,
        orders: Arc<dyn OrderStore>,
        conversations: Arc<dyn ConversationStore>,
        payment_base_url: impl Into<String>,
        upi_id: impl Into<String>,
        top_n: usize,
    ) -> Self {
        Self {
            catalogue,
            orders,
            conversations,
            payment_base_url: payment_base_url.into(),
            upi_id: upi_id.into(),
            top_n,
        }
    }

    /// The single entry point the transport calls: one message in, one
    /// reply out. Never panics, never propagates an error.
    pub fn handle_message(&self, text: &str, sender: &str) -> String {
        let normalized = intent::normalize(text);
        log::debug!("message from {sender}: {normalized:?}");

        if normalized.is_empty() {
            return reply::clarification();
        }

        if intent::is_greeting(&normalized) {
            self.conversations.clear(sender);
            return reply::greeting();
        }

        if let Some(order_id) = intent::parse_order_id(&normalized) {
            return self.handle_order_id(sender, &order_id);
        }

        // Short replies are only meaningful relative to a pending question.
        if let Some(entry) = self.conversations.get(sender) {
            match entry.stage {
                PendingStage::Offered => {
                    if let Some(answer) = intent::classify_offer_reply(&normalized) {
                        return self.handle_offer_reply(sender, entry, answer);
                    }
                }
                PendingStage::PaymentChoice => {
                    if let Some(answer) = intent::classify_payment_reply(&normalized) {
                        return self.handle_payment_reply(sender, entry, answer);
                    }
                }
            }
        }

        if intent::is_valid_query(&normalized) {
            return self.handle_query(text, &normalized, sender);
        }

        reply::clarification()
    }

    fn handle_query(&self, raw: &str, normalized: &str, sender: &str) -> String {
        let snapshot = match self.catalogue.ensure_loaded() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::error!("catalogue load failed: {err}");
                return reply::generic_error();
            }
        };

        let embedder = self.catalogue.embedder();
        let matches = match rank(&snapshot, embedder.as_ref(), raw, self.top_n) {
            Ok(matches) => matches,
            Err(err) => {
                log::error!("ranking failed for {normalized:?}: {err}");
                return reply::generic_error();
            }
        };

        let Some(best) = matches.first() else {
            return reply::no_matches();
        };

        if let Err(err) = self.record_draft(raw, normalized, sender, best) {
            log::error!("failed to record draft order for {sender}: {err}");
            return reply::order_error();
        }

        self.conversations.set(
            sender,
            ConversationEntry::new(best.id.clone(), PendingStage::Offered),
        );
        reply::product_offer(best)
    }

    fn record_draft(
        &self,
        raw: &str,
        normalized: &str,
        sender: &str,
        best: &CatalogueEntry,
    ) -> Result<(), crate::store::StoreError> {
        let record = OrderRecord {
            timestamp: Utc::now().to_rfc3339(),
            phone: sender.to_string(),
            query: raw.trim().to_string(),
            sku_id: best.id.clone(),
            qty: intent::extract_quantity(normalized),
            status: status::AWAITING_CONFIRM.to_string(),
        };
        self.orders.append(&record)
    }

    fn handle_offer_reply(
        &self,
        sender: &str,
        entry: ConversationEntry,
        answer: OfferReply,
    ) -> String {
        match answer {
            OfferReply::Yes => {
                self.conversations.set(
                    sender,
                    ConversationEntry::new(entry.last_sku, PendingStage::PaymentChoice),
                );
                reply::payment_options()
            }
            OfferReply::No => {
                self.conversations.clear(sender);
                reply::no_thanks()
            }
        }
    }

    fn handle_payment_reply(
        &self,
        sender: &str,
        entry: ConversationEntry,
        answer: PaymentReply,
    ) -> String {
        match answer {
            PaymentReply::CashOnDelivery => {
                match self
                    .orders
                    .find_and_update_status(sender, &entry.last_sku, status::CONFIRMED)
                {
                    Ok(found) => {
                        if !found {
                            log::warn!("no draft order for {sender}/{}", entry.last_sku);
                        }
                        self.conversations.clear(sender);
                        reply::cod_confirmed()
                    }
                    Err(err) => {
                        log::error!("failed to confirm order for {sender}: {err}");
                        reply::order_error()
                    }
                }
            }
            PaymentReply::Upi => {
                match self.orders.find_and_update_status(
                    sender,
                    &entry.last_sku,
                    status::AWAITING_UPI_PAYMENT,
                ) {
                    Ok(found) => {
                        if !found {
                            log::warn!("no draft order for {sender}/{}", entry.last_sku);
                        }
                        self.conversations.clear(sender);
                        reply::upi_instructions(&self.upi_id)
                    }
                    Err(err) => {
                        log::error!("failed to mark order awaiting UPI for {sender}: {err}");
                        reply::order_error()
                    }
                }
            }
            PaymentReply::No => {
                self.conversations.clear(sender);
                reply::no_thanks()
            }
        }
    }

    fn handle_order_id(&self, sender: &str, order_id: &str) -> String {
        match self
            .orders
            .find_and_update_status(sender, order_id, status::AWAITING_PAYMENT)
        {
            Ok(found) => {
                if !found {
                    log::warn!("order id {order_id} not found for {sender}");
                }
                self.conversations.clear(sender);
                reply::payment_link(&self.payment_base_url, order_id)
            }
            Err(err) => {
                log::error!("failed to update order {order_id} for {sender}: {err}");
                reply::order_error()
            }
        }
    }
}
