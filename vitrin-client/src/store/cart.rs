//! Cart store
//!
//! Authoritative client view of the signed-in user's cart, one remote row
//! per (user, product). Every mutation is two-phase: the remote write
//! goes first, and the local mirror only changes after it succeeds — a
//! failed write leaves local state untouched and propagates the error.

use std::sync::Arc;

use tracing::debug;

use shared::models::{CartLine, CartLineUpsert};

use crate::error::{ClientError, ClientResult};
use crate::service::DataService;
use crate::session::SessionHandle;

/// Pure local-state transitions, applied only after a remote success
pub(crate) mod transition {
    use super::CartLine;

    /// Replace the line for this product or prepend a new one; at most
    /// one line per product survives
    pub fn apply_upsert(lines: &mut Vec<CartLine>, line: CartLine) {
        match lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => *existing = line,
            None => lines.insert(0, line),
        }
    }

    pub fn apply_remove(lines: &mut Vec<CartLine>, product_id: &str) {
        lines.retain(|l| l.product_id != product_id);
    }

    pub fn apply_remove_many(lines: &mut Vec<CartLine>, product_ids: &[String]) {
        lines.retain(|l| !product_ids.iter().any(|id| id == &l.product_id));
    }

    pub fn total_quantity(lines: &[CartLine]) -> i64 {
        lines.iter().map(|l| l.qty).sum()
    }
}

/// Cart state synchronized line-by-line with the remote store
pub struct CartStore {
    data: Arc<dyn DataService>,
    session: SessionHandle,
    lines: Vec<CartLine>,
    total_qty: i64,
}

impl CartStore {
    pub fn new(data: Arc<dyn DataService>, session: SessionHandle) -> Self {
        Self {
            data,
            session,
            lines: Vec::new(),
            total_qty: 0,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Total quantity across all lines, for badge display
    pub fn total_quantity(&self) -> i64 {
        self.total_qty
    }

    /// Load the user's lines, most-recently-updated first; wholesale
    /// replace of local state
    pub async fn fetch(&mut self) -> ClientResult<()> {
        let user = self.session.require_user()?;
        let lines = self.data.list_cart_lines(&user.id).await?;
        self.lines = lines;
        self.recount();
        Ok(())
    }

    /// Add `qty` of a product. An existing line aggregates: the remote
    /// upsert writes `existing + qty` keyed on (user, product).
    pub async fn add(&mut self, product_id: &str, qty: i64) -> ClientResult<()> {
        let user = self.session.require_user()?;
        if qty <= 0 {
            return Err(ClientError::Validation(
                "quantity to add must be positive".to_string(),
            ));
        }

        let existing = self.line(product_id).map(|l| l.qty).unwrap_or(0);
        let saved = self
            .data
            .upsert_cart_line(&CartLineUpsert {
                user_id: user.id,
                product_id: product_id.to_string(),
                qty: existing + qty,
            })
            .await?;

        transition::apply_upsert(&mut self.lines, saved);
        self.recount();
        Ok(())
    }

    /// Set a line's quantity; `qty <= 0` routes to [`Self::remove`]
    pub async fn set_qty(&mut self, product_id: &str, qty: i64) -> ClientResult<()> {
        if qty <= 0 {
            return self.remove(product_id).await;
        }
        let user = self.session.require_user()?;

        let saved = self
            .data
            .upsert_cart_line(&CartLineUpsert {
                user_id: user.id,
                product_id: product_id.to_string(),
                qty,
            })
            .await?;

        transition::apply_upsert(&mut self.lines, saved);
        self.recount();
        Ok(())
    }

    pub async fn increase(&mut self, product_id: &str, delta: i64) -> ClientResult<()> {
        let current = self.line(product_id).map(|l| l.qty).unwrap_or(0);
        self.set_qty(product_id, current + delta).await
    }

    /// Decrease floors at deletion via the set_qty-routes-to-remove rule;
    /// a negative quantity never persists
    pub async fn decrease(&mut self, product_id: &str, delta: i64) -> ClientResult<()> {
        let current = self.line(product_id).map(|l| l.qty).unwrap_or(0);
        self.set_qty(product_id, current - delta).await
    }

    pub async fn remove(&mut self, product_id: &str) -> ClientResult<()> {
        let user = self.session.require_user()?;
        self.data.delete_cart_line(&user.id, product_id).await?;
        transition::apply_remove(&mut self.lines, product_id);
        self.recount();
        Ok(())
    }

    /// Delete several lines in one batched remote call; used by
    /// "select all → remove" and the purchase flow
    pub async fn remove_many(&mut self, product_ids: &[String]) -> ClientResult<()> {
        let user = self.session.require_user()?;
        if product_ids.is_empty() {
            return Ok(());
        }
        self.data.delete_cart_lines(&user.id, product_ids).await?;
        transition::apply_remove_many(&mut self.lines, product_ids);
        self.recount();
        Ok(())
    }

    /// Purchase the selected lines: atomic stock decrement per line, then
    /// one batched delete. A decrement failure aborts before any line is
    /// removed.
    pub async fn checkout(&mut self, selected: &[String]) -> ClientResult<()> {
        self.session.require_user()?;
        for product_id in selected {
            let Some(line) = self.line(product_id) else {
                return Err(ClientError::NotFound(format!(
                    "no cart line for product {product_id}"
                )));
            };
            self.data.decrement_stock(product_id, line.qty).await?;
        }
        self.remove_many(selected).await
    }

    /// Wipe local state without touching the remote store; called on
    /// logout so the next user never sees these lines
    pub fn clear_local(&mut self) {
        self.lines.clear();
        self.total_qty = 0;
        debug!("cart local state cleared");
    }

    fn recount(&mut self) {
        self.total_qty = transition::total_quantity(&self.lines);
    }
}
