//! Output formatting for the CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use turbo_cart::{Cart, Notice, Notifier};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print the cart, as a table or as the stored JSON array.
    pub fn cart(&self, cart: &Cart) {
        if self.json {
            self.json(cart);
            return;
        }

        if cart.is_empty() {
            self.info("Your cart is empty.");
            return;
        }

        let widths = [6, 40, 10, 6];
        println!();
        self.table_row(&["ID", "PRODUCT", "PRICE", "QTY"], &widths);
        for item in cart {
            let id = item.id.to_string();
            let title = item.title().unwrap_or("-");
            let price = item.price().map(format_price).unwrap_or_else(|| "-".to_string());
            let amount = item.amount.to_string();
            self.table_row(&[&id, title, &price, &amount], &widths);
        }
        println!();
        println!(
            "  {} product(s), {} item(s)",
            style(cart.len()).bold(),
            style(cart.item_count()).bold()
        );
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Format a catalog price for display.
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

/// Renders cart notices as toast lines on stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    json: bool,
}

impl ConsoleNotifier {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "notice": notice }));
            return;
        }
        let marker = if notice.kind.is_stock() {
            style("⚠").yellow()
        } else {
            style("✗").red()
        };
        eprintln!("{} {}", marker, style(&notice.message).red());
    }
}
