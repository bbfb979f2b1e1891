//! Outbound customer notifications.
//!
//! [`Notifier`] owns the optional email, SMS and push senders together with
//! the message templates. Handlers use it for newsletter and broadcast
//! sends; [`dispatcher::OrderNotificationDispatcher`] uses it for
//! order-status notifications. A channel whose sender is not configured is
//! skipped with a log line.

pub mod dispatcher;
pub mod realtime;

use pausedej_core::channels::{CHANNEL_EMAIL, CHANNEL_PUSH, CHANNEL_SMS};
use pausedej_core::order::{DeliveryMode, OrderStatus};
use pausedej_core::templates::{
    push_payload, sms_text, EmailTemplate, OrderSummary, PushPayload, SummaryLine,
    TemplateRenderer,
};
use pausedej_core::types::DbId;
use pausedej_db::models::newsletter::{Campaign, Subscriber};
use pausedej_db::models::order::{Order, OrderItem};
use pausedej_db::models::profile::Profile;
use pausedej_db::models::push_subscription::PushSubscription;
use pausedej_db::repositories::{OrderRepo, ProfileRepo, PushSubscriptionRepo};
use pausedej_db::DbPool;
use pausedej_events::delivery::push::PushTarget;
use pausedej_events::{EmailDelivery, PushDelivery, SmsDelivery};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Outcome of a fan-out send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    /// Push subscriptions found gone and deleted.
    pub expired: usize,
}

impl DeliveryReport {
    fn record<E: std::fmt::Display>(&mut self, channel: &'static str, result: Result<(), E>) {
        match result {
            Ok(()) => self.sent += 1,
            Err(e) => {
                tracing::warn!(channel, error = %e, "Delivery failed");
                self.failed += 1;
            }
        }
    }
}

/// Email, SMS and push senders plus the templates they send.
pub struct Notifier {
    email: Option<EmailDelivery>,
    sms: Option<SmsDelivery>,
    push: Option<PushDelivery>,
    templates: TemplateRenderer,
    site_url: String,
}

impl Notifier {
    /// A notifier with every channel disabled.
    pub fn new(templates: TemplateRenderer, site_url: impl Into<String>) -> Self {
        Self {
            email: None,
            sms: None,
            push: None,
            templates,
            site_url: site_url.into(),
        }
    }

    pub fn with_email(mut self, email: EmailDelivery) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_sms(mut self, sms: SmsDelivery) -> Self {
        self.sms = Some(sms);
        self
    }

    pub fn with_push(mut self, push: PushDelivery) -> Self {
        self.push = Some(push);
        self
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub fn push_enabled(&self) -> bool {
        self.push.is_some()
    }

    /// Storefront page of an order.
    pub fn order_url(&self, order_id: DbId) -> String {
        format!("{}/orders/{order_id}", self.site_url)
    }

    /// One-click unsubscribe link embedded in every newsletter email.
    pub fn unsubscribe_url(&self, token: &str) -> String {
        format!("{}/newsletter/unsubscribe?token={token}", self.site_url)
    }

    // -----------------------------------------------------------------------
    // Order status
    // -----------------------------------------------------------------------

    /// Tell the customer their order reached `status`, on every channel the
    /// status maps to.
    ///
    /// Load failures are returned; per-channel failures are logged and do
    /// not stop the other channels.
    pub async fn notify_order_status(
        &self,
        pool: &DbPool,
        order_id: DbId,
        status: OrderStatus,
    ) -> AppResult<()> {
        let Some(order) = OrderRepo::find_with_items(pool, order_id).await? else {
            tracing::warn!(order_id, "Order vanished before notification");
            return Ok(());
        };
        let Some(profile) = ProfileRepo::find_by_id(pool, order.order.user_id).await? else {
            tracing::warn!(order_id, user_id = order.order.user_id, "Order owner not found");
            return Ok(());
        };

        let summary =
            order_summary(&order.order, &order.items, &profile, self.order_url(order_id))?;

        if let Some(template) = EmailTemplate::for_status(status) {
            if let Err(e) = self.send_order_email(&profile.email, template, &summary).await {
                tracing::warn!(order_id, channel = CHANNEL_EMAIL, error = %e, "Order email failed");
            }
        }

        if let Some(text) = sms_text(status, &summary) {
            let phone = order.order.phone.as_deref().or(profile.phone.as_deref());
            match phone {
                Some(phone) if profile.sms_opt_in => {
                    if let Err(e) = self.send_sms(phone, &text).await {
                        tracing::warn!(
                            order_id,
                            channel = CHANNEL_SMS,
                            error = %e,
                            "Order SMS failed"
                        );
                    }
                }
                _ => tracing::debug!(order_id, "Customer not reachable by SMS"),
            }
        }

        if let Some(payload) = push_payload(status, &summary) {
            let subscriptions = PushSubscriptionRepo::list_for_user(pool, profile.id).await?;
            let report = self.push_to(pool, &subscriptions, &payload).await;
            tracing::debug!(
                order_id,
                sent = report.sent,
                failed = report.failed,
                expired = report.expired,
                "Order push sent"
            );
        }

        tracing::info!(order_id, status = %status, "Order notifications dispatched");
        Ok(())
    }

    async fn send_order_email(
        &self,
        to: &str,
        template: EmailTemplate,
        summary: &OrderSummary,
    ) -> AppResult<()> {
        let Some(email) = &self.email else {
            tracing::debug!(channel = CHANNEL_EMAIL, "Email not configured, skipping");
            return Ok(());
        };
        let rendered = self.templates.render_order(template, summary)?;
        let id = email.send(to, &rendered).await?;
        tracing::info!(
            order_id = summary.order_id,
            template = template.name(),
            email_id = %id,
            "Order email sent"
        );
        Ok(())
    }

    async fn send_sms(&self, phone: &str, text: &str) -> AppResult<()> {
        let Some(sms) = &self.sms else {
            tracing::debug!(channel = CHANNEL_SMS, "SMS not configured, skipping");
            return Ok(());
        };
        sms.send(phone, text).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Push
    // -----------------------------------------------------------------------

    /// Send `payload` to every subscription, counting failures.
    ///
    /// Subscriptions the push service reports as gone are deleted and
    /// counted as expired rather than failed. Returns an empty report when
    /// push is not configured.
    pub async fn push_to(
        &self,
        pool: &DbPool,
        subscriptions: &[PushSubscription],
        payload: &PushPayload,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let Some(push) = &self.push else {
            tracing::debug!(channel = CHANNEL_PUSH, "Push not configured, skipping");
            return report;
        };
        for sub in subscriptions {
            let target = PushTarget {
                endpoint: &sub.endpoint,
                p256dh: &sub.p256dh,
                auth: &sub.auth,
            };
            match push.send(&target, payload).await {
                Err(e) if e.is_gone() => {
                    report.expired += 1;
                    match PushSubscriptionRepo::delete_by_endpoint(pool, &sub.endpoint).await {
                        Ok(_) => tracing::info!(
                            subscription_id = sub.id,
                            user_id = sub.user_id,
                            "Expired push subscription deleted"
                        ),
                        Err(e) => tracing::warn!(
                            subscription_id = sub.id,
                            error = %e,
                            "Expired push subscription not deleted"
                        ),
                    }
                }
                result => report.record(CHANNEL_PUSH, result),
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Newsletter
    // -----------------------------------------------------------------------

    /// Welcome a new subscriber. A no-op when email is not configured.
    pub async fn send_welcome(&self, to: &str, unsubscribe_token: &str) -> AppResult<()> {
        let Some(email) = &self.email else {
            tracing::debug!(channel = CHANNEL_EMAIL, "Email not configured, skipping welcome");
            return Ok(());
        };
        let rendered = self
            .templates
            .render_welcome(&self.unsubscribe_url(unsubscribe_token))?;
        email.send(to, &rendered).await?;
        Ok(())
    }

    /// Send a campaign to each subscriber, one email per recipient so every
    /// message carries its own unsubscribe link.
    pub async fn send_campaign(
        &self,
        campaign: &Campaign,
        subscribers: &[Subscriber],
    ) -> AppResult<DeliveryReport> {
        let email = self.email.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("Email delivery is not configured".into())
        })?;

        let mut report = DeliveryReport::default();
        for subscriber in subscribers {
            let rendered = self.templates.render_campaign(
                &campaign.subject,
                &campaign.content,
                &self.unsubscribe_url(&subscriber.unsubscribe_token),
            )?;
            let result = email.send(&subscriber.email, &rendered).await.map(|_| ());
            report.record(CHANNEL_EMAIL, result);
        }
        Ok(report)
    }
}

/// Build the template input for an order.
pub fn order_summary(
    order: &Order,
    items: &[OrderItem],
    profile: &Profile,
    order_url: String,
) -> AppResult<OrderSummary> {
    let status: OrderStatus = order.status.parse()?;
    let delivery_mode: DeliveryMode = order.delivery_mode.parse()?;

    let customer_name = profile
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&profile.email)
        .to_string();

    let lines = items
        .iter()
        .map(|item| SummaryLine {
            name: item.dish_name.clone(),
            quantity: item.quantity,
            line_total: pausedej_core::pricing::round_money(
                item.unit_price * f64::from(item.quantity),
            ),
        })
        .collect();

    Ok(OrderSummary {
        order_id: order.id,
        customer_name,
        status,
        delivery_mode,
        delivery_address: order.delivery_address.clone(),
        lines,
        subtotal: order.subtotal,
        delivery_fee: order.delivery_fee,
        discount: order.discount,
        total: order.total,
        order_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        let now = chrono::Utc::now();
        Order {
            id: 42,
            user_id: 3,
            status: "ready".into(),
            payment_status: "paid".into(),
            delivery_mode: "pickup".into(),
            delivery_address: None,
            requested_time: None,
            phone: None,
            notes: None,
            subtotal: 19.8,
            delivery_fee: 0.0,
            discount: 0.0,
            total: 19.8,
            promo_code: None,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn profile(full_name: Option<&str>) -> Profile {
        let now = chrono::Utc::now();
        Profile {
            id: 3,
            email: "lea@example.com".into(),
            password_hash: String::new(),
            full_name: full_name.map(String::from),
            phone: None,
            role: "customer".into(),
            dietary_preferences: vec![],
            sms_opt_in: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(name: &str, unit_price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            id: 1,
            order_id: 42,
            dish_id: Some(1),
            dish_name: name.into(),
            unit_price,
            quantity,
        }
    }

    #[test]
    fn summary_uses_order_snapshot() {
        let summary = order_summary(
            &order(),
            &[item("Quiche lorraine", 9.9, 2)],
            &profile(Some("Léa")),
            "https://pausedej.fr/orders/42".into(),
        )
        .unwrap();

        assert_eq!(summary.order_id, 42);
        assert_eq!(summary.customer_name, "Léa");
        assert_eq!(summary.status, OrderStatus::Ready);
        assert_eq!(summary.delivery_mode, DeliveryMode::Pickup);
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].line_total, 19.8);
    }

    #[test]
    fn summary_falls_back_to_email_without_name() {
        let summary =
            order_summary(&order(), &[], &profile(Some("  ")), String::new()).unwrap();
        assert_eq!(summary.customer_name, "lea@example.com");
    }

    #[test]
    fn summary_rejects_unknown_status() {
        let mut bad = order();
        bad.status = "lost".into();
        assert!(order_summary(&bad, &[], &profile(None), String::new()).is_err());
    }

    #[test]
    fn links_point_at_the_storefront() {
        let notifier = Notifier::new(
            TemplateRenderer::new().unwrap(),
            "https://pausedej.fr",
        );
        assert_eq!(notifier.order_url(7), "https://pausedej.fr/orders/7");
        assert_eq!(
            notifier.unsubscribe_url("abc"),
            "https://pausedej.fr/newsletter/unsubscribe?token=abc"
        );
        assert!(!notifier.email_enabled());
        assert!(!notifier.push_enabled());
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = DeliveryReport::default();
        report.record(CHANNEL_PUSH, Ok::<(), String>(()));
        report.record(CHANNEL_PUSH, Err("gone".to_string()));
        report.record(CHANNEL_PUSH, Ok::<(), String>(()));
        assert_eq!(
            report,
            DeliveryReport {
                sent: 2,
                failed: 1,
                expired: 0
            }
        );
    }
}
