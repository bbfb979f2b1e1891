//! Customer-facing message content: emails, SMS and push notifications.
//!
//! Order notifications are keyed by [`OrderStatus`]: each status maps to at
//! most one email template, one SMS text and one push payload. Emails are
//! rendered with `minijinja`; templates whose name ends in `.html` are
//! HTML-escaped automatically.

use minijinja::{context, Environment};
use serde::Serialize;

use crate::error::CoreError;
use crate::order::{DeliveryMode, OrderStatus};
use crate::types::DbId;

/// Brand name used in subjects and sender display names.
pub const STORE_NAME: &str = "Pause Dej'";

const ORDER_HTML: &str = include_str!("../templates/order_status.html");
const ORDER_TEXT: &str = include_str!("../templates/order_status.txt");
const WELCOME_HTML: &str = include_str!("../templates/newsletter_welcome.html");
const CAMPAIGN_HTML: &str = include_str!("../templates/newsletter_campaign.html");

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One line of an order as shown to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: i32,
    pub line_total: f64,
}

/// Everything a notification needs to know about an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: DbId,
    pub customer_name: String,
    pub status: OrderStatus,
    pub delivery_mode: DeliveryMode,
    pub delivery_address: Option<String>,
    pub lines: Vec<SummaryLine>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    /// Absolute link to the order page on the storefront.
    pub order_url: String,
}

/// A rendered email ready to hand to the email provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Content of a Web Push notification, serialized as the push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Status → template mapping
// ---------------------------------------------------------------------------

/// Email sent when an order reaches a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    OrderConfirmed,
    OrderPreparing,
    OrderReady,
    OrderDelivering,
    OrderDelivered,
    OrderCancelled,
}

impl EmailTemplate {
    /// Template for an order status. Pending orders get no email: the
    /// confirmation goes out once payment or the kitchen confirms.
    pub fn for_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some(Self::OrderConfirmed),
            OrderStatus::Preparing => Some(Self::OrderPreparing),
            OrderStatus::Ready => Some(Self::OrderReady),
            OrderStatus::Delivering => Some(Self::OrderDelivering),
            OrderStatus::Delivered => Some(Self::OrderDelivered),
            OrderStatus::Cancelled => Some(Self::OrderCancelled),
        }
    }

    /// Stable identifier, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::OrderConfirmed => "order_confirmed",
            Self::OrderPreparing => "order_preparing",
            Self::OrderReady => "order_ready",
            Self::OrderDelivering => "order_delivering",
            Self::OrderDelivered => "order_delivered",
            Self::OrderCancelled => "order_cancelled",
        }
    }

    fn subject(self, order_id: DbId) -> String {
        match self {
            Self::OrderConfirmed => format!("Commande #{order_id} confirmée"),
            Self::OrderPreparing => format!("Commande #{order_id} en préparation"),
            Self::OrderReady => format!("Commande #{order_id} prête"),
            Self::OrderDelivering => format!("Commande #{order_id} en route"),
            Self::OrderDelivered => format!("Commande #{order_id} livrée"),
            Self::OrderCancelled => format!("Commande #{order_id} annulée"),
        }
    }

    fn headline(self, mode: DeliveryMode) -> &'static str {
        match (self, mode) {
            (Self::OrderConfirmed, _) => "Merci ! Votre commande est confirmée.",
            (Self::OrderPreparing, _) => "Nos cuisiniers préparent votre commande.",
            (Self::OrderReady, DeliveryMode::Pickup) => {
                "Votre commande est prête, vous pouvez venir la récupérer."
            }
            (Self::OrderReady, DeliveryMode::Delivery) => {
                "Votre commande est prête et attend son livreur."
            }
            (Self::OrderDelivering, _) => "Votre commande est en route.",
            (Self::OrderDelivered, _) => "Votre commande a été livrée. Bon appétit !",
            (Self::OrderCancelled, _) => {
                "Votre commande a été annulée. Si vous avez été débité, le remboursement suit."
            }
        }
    }
}

/// SMS text for a status. Only time-sensitive statuses trigger an SMS.
pub fn sms_text(status: OrderStatus, summary: &OrderSummary) -> Option<String> {
    let id = summary.order_id;
    match (status, summary.delivery_mode) {
        (OrderStatus::Ready, DeliveryMode::Pickup) => Some(format!(
            "{STORE_NAME} : votre commande #{id} est prête, à récupérer dès maintenant."
        )),
        (OrderStatus::Ready, DeliveryMode::Delivery) => Some(format!(
            "{STORE_NAME} : votre commande #{id} est prête et part bientôt en livraison."
        )),
        (OrderStatus::Delivering, _) => Some(format!(
            "{STORE_NAME} : votre commande #{id} est en route !"
        )),
        (OrderStatus::Delivered, _) => Some(format!(
            "{STORE_NAME} : votre commande #{id} a été livrée. Bon appétit !"
        )),
        (OrderStatus::Cancelled, _) => Some(format!(
            "{STORE_NAME} : votre commande #{id} a été annulée."
        )),
        _ => None,
    }
}

/// Push payload for a status. Every status except `pending` is pushed.
pub fn push_payload(status: OrderStatus, summary: &OrderSummary) -> Option<PushPayload> {
    if status == OrderStatus::Pending {
        return None;
    }
    let template = EmailTemplate::for_status(status)?;
    Some(PushPayload {
        title: template.subject(summary.order_id),
        body: template.headline(summary.delivery_mode).to_string(),
        url: summary.order_url.clone(),
    })
}

/// Format an amount the French way: `12,50 €`.
pub fn format_euros(amount: f64) -> String {
    format!("{amount:.2} €").replace('.', ",")
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LineView {
    name: String,
    quantity: i32,
    line_total: String,
}

/// Renders every email the store sends.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Build the renderer, compiling all templates.
    pub fn new() -> Result<Self, CoreError> {
        let mut env = Environment::new();
        for (name, source) in [
            ("order_status.html", ORDER_HTML),
            ("order_status.txt", ORDER_TEXT),
            ("newsletter_welcome.html", WELCOME_HTML),
            ("newsletter_campaign.html", CAMPAIGN_HTML),
        ] {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    /// Render the order email for `template`.
    pub fn render_order(
        &self,
        template: EmailTemplate,
        summary: &OrderSummary,
    ) -> Result<RenderedEmail, CoreError> {
        let lines: Vec<LineView> = summary
            .lines
            .iter()
            .map(|l| LineView {
                name: l.name.clone(),
                quantity: l.quantity,
                line_total: format_euros(l.line_total),
            })
            .collect();

        let ctx = context! {
            store_name => STORE_NAME,
            customer_name => &summary.customer_name,
            order_id => summary.order_id,
            headline => template.headline(summary.delivery_mode),
            status_label => summary.status.label(),
            is_delivery => summary.delivery_mode == DeliveryMode::Delivery,
            delivery_address => &summary.delivery_address,
            lines => lines,
            subtotal => format_euros(summary.subtotal),
            delivery_fee => format_euros(summary.delivery_fee),
            has_discount => summary.discount > 0.0,
            discount => format_euros(summary.discount),
            total => format_euros(summary.total),
            order_url => &summary.order_url,
        };

        Ok(RenderedEmail {
            subject: format!("{STORE_NAME} · {}", template.subject(summary.order_id)),
            html: self.render("order_status.html", &ctx)?,
            text: self.render("order_status.txt", &ctx)?,
        })
    }

    /// Render the newsletter welcome email.
    pub fn render_welcome(&self, unsubscribe_url: &str) -> Result<RenderedEmail, CoreError> {
        let ctx = context! {
            store_name => STORE_NAME,
            unsubscribe_url => unsubscribe_url,
        };
        Ok(RenderedEmail {
            subject: format!("Bienvenue dans la newsletter {STORE_NAME}"),
            html: self.render("newsletter_welcome.html", &ctx)?,
            text: format!(
                "Merci de votre inscription à la newsletter {STORE_NAME} !\n\n\
                 Se désinscrire : {unsubscribe_url}\n"
            ),
        })
    }

    /// Wrap an admin-authored campaign body in the newsletter layout.
    ///
    /// `content_html` is trusted (written by an administrator) and inserted
    /// without escaping.
    pub fn render_campaign(
        &self,
        subject: &str,
        content_html: &str,
        unsubscribe_url: &str,
    ) -> Result<RenderedEmail, CoreError> {
        let ctx = context! {
            store_name => STORE_NAME,
            subject => subject,
            content => content_html,
            unsubscribe_url => unsubscribe_url,
        };
        Ok(RenderedEmail {
            subject: subject.to_string(),
            html: self.render("newsletter_campaign.html", &ctx)?,
            text: format!(
                "{}\n\nSe désinscrire : {unsubscribe_url}\n",
                strip_tags(content_html)
            ),
        })
    }

    fn render(&self, name: &str, ctx: &minijinja::Value) -> Result<String, CoreError> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(template_error)
    }
}

fn template_error(e: minijinja::Error) -> CoreError {
    CoreError::Internal(format!("Template error: {e}"))
}

/// Crude plain-text fallback for campaign bodies.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(status: OrderStatus, mode: DeliveryMode) -> OrderSummary {
        OrderSummary {
            order_id: 42,
            customer_name: "Camille <script>".to_string(),
            status,
            delivery_mode: mode,
            delivery_address: Some("3 place Bellecour, Lyon".to_string()),
            lines: vec![
                SummaryLine {
                    name: "Bowl végétarien".to_string(),
                    quantity: 2,
                    line_total: 23.8,
                },
                SummaryLine {
                    name: "Cookie".to_string(),
                    quantity: 1,
                    line_total: 2.5,
                },
            ],
            subtotal: 26.3,
            delivery_fee: 2.5,
            discount: 2.63,
            total: 26.17,
            order_url: "https://pausedej.fr/commandes/42".to_string(),
        }
    }

    #[test]
    fn every_status_but_pending_has_an_email() {
        for status in OrderStatus::ALL {
            let template = EmailTemplate::for_status(*status);
            assert_eq!(template.is_none(), *status == OrderStatus::Pending, "{status}");
        }
    }

    #[test]
    fn status_to_template_mapping() {
        assert_eq!(
            EmailTemplate::for_status(OrderStatus::Confirmed),
            Some(EmailTemplate::OrderConfirmed)
        );
        assert_eq!(
            EmailTemplate::for_status(OrderStatus::Cancelled),
            Some(EmailTemplate::OrderCancelled)
        );
        assert_eq!(EmailTemplate::OrderDelivering.name(), "order_delivering");
    }

    #[test]
    fn sms_only_for_time_sensitive_statuses() {
        let s = summary(OrderStatus::Confirmed, DeliveryMode::Pickup);
        assert!(sms_text(OrderStatus::Pending, &s).is_none());
        assert!(sms_text(OrderStatus::Confirmed, &s).is_none());
        assert!(sms_text(OrderStatus::Preparing, &s).is_none());
        assert!(sms_text(OrderStatus::Ready, &s).unwrap().contains("à récupérer"));
        assert!(sms_text(OrderStatus::Delivering, &s).unwrap().contains("#42"));
    }

    #[test]
    fn push_payload_links_to_order() {
        let s = summary(OrderStatus::Ready, DeliveryMode::Delivery);
        assert!(push_payload(OrderStatus::Pending, &s).is_none());
        let payload = push_payload(OrderStatus::Ready, &s).unwrap();
        assert_eq!(payload.title, "Commande #42 prête");
        assert_eq!(payload.url, "https://pausedej.fr/commandes/42");
    }

    #[test]
    fn euros_use_french_format() {
        assert_eq!(format_euros(12.5), "12,50 €");
        assert_eq!(format_euros(0.0), "0,00 €");
    }

    #[test]
    fn order_email_renders_lines_and_totals() {
        let renderer = TemplateRenderer::new().unwrap();
        let s = summary(OrderStatus::Confirmed, DeliveryMode::Delivery);
        let email = renderer
            .render_order(EmailTemplate::OrderConfirmed, &s)
            .unwrap();

        assert_eq!(email.subject, "Pause Dej' · Commande #42 confirmée");
        assert!(email.html.contains("Bowl végétarien"));
        assert!(email.html.contains("26,17 €"));
        assert!(email.html.contains("-2,63 €"));
        assert!(email.html.contains("3 place Bellecour"));
        assert!(email.text.contains("Total : 26,17 €"));
    }

    #[test]
    fn order_email_escapes_customer_input() {
        let renderer = TemplateRenderer::new().unwrap();
        let s = summary(OrderStatus::Confirmed, DeliveryMode::Pickup);
        let email = renderer
            .render_order(EmailTemplate::OrderConfirmed, &s)
            .unwrap();
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn campaign_keeps_admin_html_and_adds_unsubscribe() {
        let renderer = TemplateRenderer::new().unwrap();
        let email = renderer
            .render_campaign(
                "Nouveau menu",
                "<p>Le <strong>menu d'automne</strong> arrive</p>",
                "https://pausedej.fr/newsletter/desinscription?token=abc",
            )
            .unwrap();
        assert!(email.html.contains("<strong>menu d'automne</strong>"));
        assert!(email.html.contains("token=abc"));
        assert!(email.text.starts_with("Le menu d'automne arrive"));
    }

    #[test]
    fn welcome_email_has_unsubscribe_link() {
        let renderer = TemplateRenderer::new().unwrap();
        let email = renderer
            .render_welcome("https://pausedej.fr/newsletter/desinscription?token=xyz")
            .unwrap();
        assert!(email.html.contains("token=xyz"));
        assert!(email.subject.contains("Bienvenue"));
    }
}
