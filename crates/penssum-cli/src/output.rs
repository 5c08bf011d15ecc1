//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use penssum_core::notifications::Presentation;
use penssum_core::{Delivery, Product, PushNotification, SyncSnapshot, SyncTaskEvent, View};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the moderation queue as the given snapshot sees it
    pub fn print_snapshot(&self, snapshot: &SyncSnapshot, web_url: &str) {
        match self.format {
            OutputFormat::Human => match snapshot.view() {
                View::Offline => println!("Offline. Waiting for connectivity..."),
                View::Loading => println!("Loading pending products..."),
                View::Empty => println!("No products awaiting review."),
                View::Content => {
                    let products = snapshot.products.as_deref().unwrap_or_default();
                    for product in products {
                        println!("{}", product_line(product));
                    }
                    println!("\n{} pending product(s)", products.len());
                }
            },
            OutputFormat::Json => {
                let products: Vec<_> = snapshot
                    .products
                    .iter()
                    .flatten()
                    .map(|p| product_json(p, web_url))
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "view": snapshot.view(),
                        "connectivity": snapshot.connectivity,
                        "refreshing": snapshot.refreshing,
                        "products": products
                    })
                );
            }
            OutputFormat::Quiet => {
                for product in snapshot.products.iter().flatten() {
                    println!("{}", product.id);
                }
            }
        }
    }

    /// Print one product in full
    pub fn print_product(&self, product: &Product, web_url: &str) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", product.id);
                println!("Category:    {}", category_path(product));
                println!("Description: {}", product.description);
                println!("Delivery:    {}", product.delivery_date_display());
                println!("Price:       {}", product.price);
                println!("Files:       {}", product.files.len());
                if !product.link_miniature.is_empty() {
                    println!("Miniature:   {}", product.link_miniature);
                }
                println!("Link:        {}", product.information_url(web_url));
            }
            OutputFormat::Json => {
                println!("{}", product_json(product, web_url));
            }
            OutputFormat::Quiet => {
                println!("{}", product.id);
            }
        }
    }

    /// Report the outcome of an approve/reject
    pub fn print_delivery(&self, action: &str, id: &str, delivery: Delivery) {
        match self.format {
            OutputFormat::Human => match delivery {
                Delivery::Sent => println!("✓ {} {}", capitalize(action), id),
                Delivery::Skipped => println!(
                    "⚠ {} {} locally; offline, nothing was sent",
                    capitalize(action),
                    id
                ),
            },
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"action": action, "id": id, "delivery": delivery})
                );
            }
            OutputFormat::Quiet => {
                println!("{}", delivery_label(delivery));
            }
        }
    }

    /// Report a result coming back from the sync task
    pub fn print_event(&self, event: &SyncTaskEvent) {
        match event {
            SyncTaskEvent::Approved { id, delivery } => {
                self.print_delivery("approved", id, *delivery)
            }
            SyncTaskEvent::Rejected { id, delivery } => {
                self.print_delivery("rejected", id, *delivery)
            }
            SyncTaskEvent::Refreshed { count } => {
                self.message(&format!("Refreshed, {} pending", count))
            }
            SyncTaskEvent::Error { message } => self.warning(message),
        }
    }

    /// Present a received notification
    ///
    /// `pending` is the queue size shown as the badge, when known.
    pub fn print_notification(
        &self,
        notification: &PushNotification,
        presentation: Presentation,
        pending: Option<usize>,
    ) {
        match self.format {
            OutputFormat::Human => {
                if presentation.play_sound {
                    print!("\x07");
                }
                if let Some(line) = notification_line(notification, presentation, pending) {
                    println!("{}", line);
                }
            }
            OutputFormat::Json => {
                let badge = pending.filter(|_| presentation.set_badge);
                println!(
                    "{}",
                    serde_json::json!({
                        "event": "notification",
                        "title": notification.title,
                        "body": notification.body,
                        "badge": badge
                    })
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a non-fatal problem (stderr in human mode)
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn product_json(product: &Product, web_url: &str) -> serde_json::Value {
    serde_json::json!({
        "id": product.id,
        "category": product.category,
        "subCategory": product.sub_category,
        "customCategory": product.custom_category,
        "description": product.description,
        "dateOfDelivery": product.delivery_date_display(),
        "price": product.price,
        "files": product.files.len(),
        "linkMiniature": product.link_miniature,
        "url": product.information_url(web_url)
    })
}

/// One-line listing: id, category path, price, delivery date, description
fn product_line(product: &Product) -> String {
    format!(
        "{} | {} | {} | {} | {}",
        product.id,
        truncate(&category_path(product), 30),
        product.price,
        product.delivery_date_display(),
        truncate_line(&product.description, 40)
    )
}

/// `category / sub / custom`, skipping empty parts
fn category_path(product: &Product) -> String {
    [
        product.category.as_str(),
        product.sub_category.as_str(),
        product.custom_category.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" / ")
}

/// Alert text and badge, as far as the presentation allows
fn notification_line(
    notification: &PushNotification,
    presentation: Presentation,
    pending: Option<usize>,
) -> Option<String> {
    let alert = presentation.show_alert.then(|| {
        let title = notification.title.as_deref().unwrap_or("Notification");
        match notification.body.as_deref() {
            Some(body) => format!("🔔 {}: {}", title, body),
            None => format!("🔔 {}", title),
        }
    });
    let badge = pending
        .filter(|_| presentation.set_badge)
        .map(|count| format!("[{} pending]", count));

    match (alert, badge) {
        (Some(alert), Some(badge)) => Some(format!("{} {}", alert, badge)),
        (alert, badge) => alert.or(badge),
    }
}

fn delivery_label(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sent => "sent",
        Delivery::Skipped => "skipped",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
