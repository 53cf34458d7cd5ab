//! Comments store
//!
//! Per-product comment lists, newest first. Mutation is gated remotely
//! to the author or an admin; the client only hides controls, it does
//! not duplicate the check.

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::{Comment, CommentDraft};

use crate::error::ClientResult;
use crate::service::DataService;
use crate::session::SessionHandle;

/// Comment lists keyed by product id
pub struct CommentsStore {
    data: Arc<dyn DataService>,
    session: SessionHandle,
    items: HashMap<String, Vec<Comment>>,
}

impl CommentsStore {
    pub fn new(data: Arc<dyn DataService>, session: SessionHandle) -> Self {
        Self {
            data,
            session,
            items: HashMap::new(),
        }
    }

    pub fn comments(&self, product_id: &str) -> &[Comment] {
        self.items.get(product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Load all comments for a product, newest first
    pub async fn fetch(&mut self, product_id: &str) -> ClientResult<()> {
        let comments = self.data.list_comments(product_id).await?;
        self.items.insert(product_id.to_string(), comments);
        Ok(())
    }

    /// Insert a comment authored by the signed-in user and prepend it
    pub async fn add(&mut self, product_id: &str, text: &str) -> ClientResult<()> {
        let user = self.session.require_user()?;
        let comment = self
            .data
            .insert_comment(&CommentDraft {
                product_id: product_id.to_string(),
                author_id: user.id,
                text: text.to_string(),
            })
            .await?;
        self.items
            .entry(product_id.to_string())
            .or_default()
            .insert(0, comment);
        Ok(())
    }

    /// Edit a comment's text; the remote store rejects non-author,
    /// non-admin callers and the error propagates unchanged
    pub async fn update(&mut self, product_id: &str, id: &str, text: &str) -> ClientResult<()> {
        self.session.require_user()?;
        let updated = self.data.update_comment(id, text).await?;
        if let Some(list) = self.items.get_mut(product_id) {
            if let Some(existing) = list.iter_mut().find(|c| c.id == id) {
                *existing = updated;
            }
        }
        Ok(())
    }

    /// Delete a comment, same ownership gate as `update`
    pub async fn remove(&mut self, product_id: &str, id: &str) -> ClientResult<()> {
        self.session.require_user()?;
        self.data.delete_comment(id).await?;
        if let Some(list) = self.items.get_mut(product_id) {
            list.retain(|c| c.id != id);
        }
        Ok(())
    }
}
