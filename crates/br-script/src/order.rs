//! Quick-order form: validate, format a WhatsApp message, and hand the
//! chat URL to the host.

use br_core::PageResult;
use br_dom::NodeId;
use br_page::Component;
use br_page::DomEvent;
use br_page::PageState;
use tracing::info;
use url::Url;

const MODAL_CLASS: &str = "order-confirmation-modal";
const DISMISS_ATTR: &str = "data-dismiss";

/// Order type codes offered by the form, with their display labels.
pub const ORDER_TYPE_LABELS: &[(&str, &str)] = &[
    ("birthday-cake", "Birthday Cake"),
    ("wedding-cake", "Wedding Cake"),
    ("cupcakes", "Cupcakes & Mini Treats"),
    ("bread-pastries", "Fresh Bread & Pastries"),
    ("custom-cake", "Custom Cake"),
    ("seasonal", "Seasonal Specials"),
];

/// Display label for an order type code; unknown codes pass through as-is.
pub fn order_type_label(code: &str) -> &str {
    ORDER_TYPE_LABELS
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, label)| *label)
        .unwrap_or(code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFormConfig {
    /// Element id of the form to watch.
    pub form_id: String,
    /// WhatsApp number in international format, digits only.
    pub contact: String,
}

impl Default for OrderFormConfig {
    fn default() -> Self {
        Self {
            form_id: "quickOrderForm".to_owned(),
            contact: "254743052401".to_owned(),
        }
    }
}

/// Field values pulled out of the form on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPayload {
    pub customer_name: String,
    pub customer_phone: String,
    pub order_type: String,
    pub order_details: String,
    pub delivery_location: String,
    pub delivery_date: String,
}

impl OrderPayload {
    fn required_complete(&self) -> bool {
        !self.customer_name.is_empty()
            && !self.customer_phone.is_empty()
            && !self.order_type.is_empty()
            && !self.order_details.is_empty()
            && !self.delivery_date.is_empty()
    }
}

/// The WhatsApp message body, matching the wording customers already see.
pub fn format_order_message(payload: &OrderPayload) -> String {
    let mut message = String::new();
    message.push_str("🎂 *NEW ORDER - THAMANI CAKES* 🎂\n\n");
    message.push_str("*Customer Details:*\n");
    message.push_str(&format!("👤 Name: {}\n", payload.customer_name));
    message.push_str(&format!("📱 Phone: {}\n\n", payload.customer_phone));
    message.push_str("*Order Information:*\n");
    message.push_str(&format!(
        "🍰 Type: {}\n",
        order_type_label(&payload.order_type)
    ));
    message.push_str(&format!("📝 Details: {}\n", payload.order_details));
    if !payload.delivery_location.is_empty() {
        message.push_str(&format!("📍 Delivery: {}\n", payload.delivery_location));
    }
    message.push_str(&format!("📅 Date: {}\n\n", payload.delivery_date));
    message.push_str("*Payment Options:*\n");
    message.push_str("💰 Cash on Delivery available\n\n");
    message.push_str("*Please confirm this order and provide total amount.*\n");
    message.push_str("Thank you! 🙏");
    message
}

/// Percent-encodes for a URL query component. RFC 3986 unreserved
/// characters pass through, everything else is encoded byte by byte.
pub fn percent_encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

pub fn whatsapp_url(contact: &str, message: &str) -> PageResult<Url> {
    let raw = format!(
        "https://wa.me/{contact}?text={}",
        percent_encode_component(message)
    );
    Url::parse(&raw).map_err(|err| {
        br_core::PageError::new("order.url.invalid", format!("chat url rejected: {err}"))
    })
}

/// Relays a completed quick-order form to WhatsApp and shows a
/// confirmation modal. Incomplete submissions raise a host alert.
pub struct OrderFormRelay {
    config: OrderFormConfig,
    form: Option<NodeId>,
}

impl OrderFormRelay {
    pub fn new(config: OrderFormConfig) -> Self {
        Self { config, form: None }
    }

    fn field_value(page: &PageState, form: NodeId, name: &str) -> String {
        for node in page.dom.descendants(form) {
            if page.dom.attr(node, "name") != Some(name) {
                continue;
            }
            let value = if page.dom.tag(node) == Some("textarea") {
                page.dom.text_content(node)
            } else {
                page.dom.attr(node, "value").unwrap_or("").to_owned()
            };
            return value.trim().to_owned();
        }
        String::new()
    }

    fn collect_payload(page: &PageState, form: NodeId) -> OrderPayload {
        OrderPayload {
            customer_name: Self::field_value(page, form, "customerName"),
            customer_phone: Self::field_value(page, form, "customerPhone"),
            order_type: Self::field_value(page, form, "orderType"),
            order_details: Self::field_value(page, form, "orderDetails"),
            delivery_location: Self::field_value(page, form, "deliveryLocation"),
            delivery_date: Self::field_value(page, form, "deliveryDate"),
        }
    }

    fn reset_form(page: &mut PageState, form: NodeId) {
        for node in page.dom.descendants(form) {
            if page.dom.attr(node, "name").is_none() {
                continue;
            }
            if page.dom.tag(node) == Some("textarea") {
                page.dom.clear_children(node);
            } else {
                let _ = page.dom.set_attr(node, "value", "");
            }
        }
    }

    fn show_confirmation(page: &mut PageState) {
        let root = page.dom.root();
        let modal = page.dom.create_element("div");
        page.dom.add_class(modal, MODAL_CLASS);

        let content = page.dom.create_element("div");
        page.dom.add_class(content, "modal-content");

        let heading = page.dom.create_element("h3");
        let heading_text = page.dom.create_text("✅ Order Sent!");
        let _ = page.dom.append_child(heading, heading_text);

        let line_one = page.dom.create_element("p");
        let line_one_text = page
            .dom
            .create_text("Your order has been sent to Thamani Cakes via WhatsApp.");
        let _ = page.dom.append_child(line_one, line_one_text);

        let line_two = page.dom.create_element("p");
        let line_two_text = page
            .dom
            .create_text("We'll confirm your order within 30 minutes.");
        let _ = page.dom.append_child(line_two, line_two_text);

        let button = page.dom.create_element("button");
        let _ = page.dom.set_attr(button, "type", "button");
        page.dom.add_class(button, "btn-primary");
        let _ = page.dom.set_attr(button, DISMISS_ATTR, "1");
        let button_text = page.dom.create_text("OK");
        let _ = page.dom.append_child(button, button_text);

        let _ = page.dom.append_child(content, heading);
        let _ = page.dom.append_child(content, line_one);
        let _ = page.dom.append_child(content, line_two);
        let _ = page.dom.append_child(content, button);
        let _ = page.dom.append_child(modal, content);
        let _ = page.dom.append_child(root, modal);
    }

    fn dismiss_modal(page: &mut PageState, target: NodeId) -> bool {
        if page.dom.attr(target, DISMISS_ATTR).is_none() {
            return false;
        }
        let mut current = Some(target);
        while let Some(node) = current {
            if page.dom.has_class(node, MODAL_CLASS) {
                page.dom.detach(node);
                return true;
            }
            current = page.dom.parent(node);
        }
        false
    }

    fn handle_submit(&self, page: &mut PageState, form: NodeId) {
        let payload = Self::collect_payload(page, form);
        if !payload.required_complete() {
            page.alert("Please fill in all required fields.");
            return;
        }

        let message = format_order_message(&payload);
        match whatsapp_url(&self.config.contact, &message) {
            Ok(url) => {
                info!(order_type = %payload.order_type, "relaying order to chat");
                page.open(url);
                Self::show_confirmation(page);
                Self::reset_form(page, form);
            }
            Err(err) => {
                page.alert(format!("Could not open WhatsApp: {}", err.message));
            }
        }
    }
}

impl Component for OrderFormRelay {
    fn name(&self) -> &'static str {
        "order-form"
    }

    fn attach(&mut self, page: &mut PageState) -> PageResult<()> {
        self.form = page.dom.element_by_id(&self.config.form_id);
        Ok(())
    }

    fn on_event(&mut self, page: &mut PageState, event: &DomEvent) {
        match *event {
            DomEvent::Submit { target } => {
                if Some(target) == self.form {
                    self.handle_submit(page, target);
                }
            }
            DomEvent::Click { target } => {
                Self::dismiss_modal(page, target);
            }
            _ => {}
        }
    }
}
