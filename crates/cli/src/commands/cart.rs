//! Cart session commands.
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_API_URL` - Store API base URL
//! - `ROCKETSHOES_API_TOKEN` - Optional bearer token
//! - `ROCKETSHOES_STORAGE_DIR` - Directory holding the persisted cart

use std::fmt::Write as _;
use std::path::PathBuf;

use rocketshoes_cart::notify::drain;
use rocketshoes_cart::storage::snapshot;
use rocketshoes_cart::{CartConfig, CartStore, FileStorage, HttpStoreApi, Notice, Outcome};
use rocketshoes_core::{CartItem, Price, ProductId};
use tracing::info;

/// What a session should do after hydrating.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Show,
    Add(ProductId),
    Remove(ProductId),
    Update(ProductId, i64),
}

/// A cart session backed by the HTTP store API and a storage directory.
pub struct Session {
    store: CartStore<HttpStoreApi, FileStorage>,
}

impl Session {
    /// Load configuration, apply overrides and hydrate the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn open(
        api_url: Option<&str>,
        storage_dir: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let mut config = CartConfig::from_lookup(|key| match (key, api_url) {
            ("ROCKETSHOES_API_URL", Some(url)) => Some(url.to_string()),
            _ => std::env::var(key).ok(),
        })?;
        if let Some(dir) = storage_dir {
            config.storage_dir = dir;
        }

        info!(
            api = %config.api.base_url,
            storage = %config.storage_dir.display(),
            "Opening cart session"
        );

        let api = HttpStoreApi::new(&config.api)?;
        let storage = FileStorage::new(config.storage_dir);

        Ok(Self {
            store: CartStore::new(api, storage),
        })
    }

    /// Run `action`, then print notices and the resulting cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be encoded for `--json` output.
    pub async fn run(self, action: Action, json: bool) -> Result<(), Box<dyn std::error::Error>> {
        let mut notices = self.store.notices();

        let outcome = match action {
            Action::Show => Outcome::Ignored,
            Action::Add(id) => self.store.add_product(id).await,
            Action::Remove(id) => self.store.remove_product(id),
            Action::Update(id, amount) => self.store.update_product_amount(id, amount).await,
        };
        tracing::debug!(?outcome, "Action finished");

        let output = if json {
            format!("{}\n", snapshot::encode(&self.store.cart())?)
        } else {
            format_cart(&self.store.cart(), self.store.total())
        };

        print_session(&drain(&mut notices), &output);
        Ok(())
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn print_session(notices: &[Notice], output: &str) {
    for notice in notices {
        eprintln!("! {notice}");
    }
    print!("{output}");
}

/// Render the cart as a plain-text table.
fn format_cart(items: &[CartItem], total: Price) -> String {
    if items.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let _ = writeln!(
            out,
            "{:>5}  {:<40}  {:>3} x {:>10}  = {:>10}",
            item.id(),
            item.product.title,
            item.amount,
            item.product.price.to_string(),
            item.subtotal().to_string(),
        );
    }

    let count = items.len();
    let plural = if count == 1 { "" } else { "s" };
    let _ = writeln!(out, "{count} product{plural}, total {total}");
    out
}
