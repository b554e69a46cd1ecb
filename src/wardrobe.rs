//! Wardrobe grid: load, filter, select, delete
//!
//! The item list is an authoritative snapshot of the server state. A single
//! delete mutates it optimistically after server confirmation; a batch
//! delete always re-fetches, because partial failure leaves the local list
//! unreliable.

use crate::api::WardrobeApi;
use crate::error::ClientError;
use crate::models::ClothingItem;
use crate::notify::{Severity, UiAdapter};
use crate::session::{ClientContext, SessionState};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Category filter value that disables filtering
pub const ALL_CATEGORIES: &str = "all";

/// One item prepared for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCard {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub color: String,
    pub style: Option<String>,
    pub warmth: u8,
    /// Inline data URL when the server sent image bytes
    pub image_url: Option<String>,
    pub selected: bool,
}

/// Per-category counts over the full, unfiltered list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WardrobeStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// What the grid should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WardrobeView {
    /// Loaded fine, the wardrobe has no items
    Empty,
    /// The last load failed; distinct from an empty wardrobe
    LoadFailed,
    Cards(Vec<ItemCard>),
}

pub struct WardrobeWorkflow {
    session: SessionState,
    api: Arc<dyn WardrobeApi>,
    ui: Arc<dyn UiAdapter>,
    items: Vec<ClothingItem>,
    selected: HashSet<i64>,
    batch_mode: bool,
    current_category: String,
    load_failed: bool,
}

impl WardrobeWorkflow {
    pub fn new(context: &ClientContext, api: Arc<dyn WardrobeApi>, ui: Arc<dyn UiAdapter>) -> Self {
        Self {
            session: context.session.clone(),
            api,
            ui,
            items: Vec::new(),
            selected: HashSet::new(),
            batch_mode: false,
            current_category: ALL_CATEGORIES.to_string(),
            load_failed: false,
        }
    }

    /// Fetches the wardrobe and replaces the local list wholesale.
    ///
    /// On failure the previously shown items are kept and the failure flag
    /// is raised so the view can say "load failed" instead of "empty".
    pub async fn load_wardrobe(&mut self) -> Result<usize, ClientError> {
        let _guard = self.session.begin_loading();

        match self.api.get_wardrobe().await {
            Ok(response) if response.success => {
                let count = response.items.len();
                self.items = response.items;
                self.load_failed = false;
                log::info!("Wardrobe loaded: {} items", count);
                self.ui
                    .notify(Severity::Success, &format!("Loaded {} items", count));
                Ok(count)
            }
            Ok(response) => {
                self.load_failed = true;
                let message = response
                    .message
                    .unwrap_or_else(|| "Failed to load wardrobe".to_string());
                self.ui.notify(Severity::Error, &message);
                Err(ClientError::Server(message))
            }
            Err(e) => {
                self.load_failed = true;
                self.ui.notify(
                    Severity::Error,
                    &format!("Failed to load wardrobe: {}", e.user_message()),
                );
                Err(e)
            }
        }
    }

    pub fn view(&self) -> WardrobeView {
        if self.items.is_empty() {
            if self.load_failed {
                WardrobeView::LoadFailed
            } else {
                WardrobeView::Empty
            }
        } else {
            WardrobeView::Cards(self.card_views())
        }
    }

    /// Items under the active category filter. Records without an id or a
    /// name cannot be rendered or deleted and are skipped.
    pub fn card_views(&self) -> Vec<ItemCard> {
        self.items
            .iter()
            .filter(|item| {
                self.current_category == ALL_CATEGORIES || item.category == self.current_category
            })
            .filter_map(|item| {
                let id = match item.id {
                    Some(id) => id,
                    None => {
                        log::warn!("Skipping wardrobe record without id: {:?}", item.name);
                        return None;
                    }
                };
                if item.name.is_empty() {
                    log::warn!("Skipping wardrobe record {} without name", id);
                    return None;
                }
                Some(ItemCard {
                    id,
                    name: item.name.clone(),
                    category: item.category.clone(),
                    color: item.color.clone(),
                    style: item.style.clone(),
                    warmth: item.warmth_level(),
                    image_url: item
                        .image_data
                        .as_ref()
                        .map(|data| format!("data:image/jpeg;base64,{}", data)),
                    selected: self.selected.contains(&id),
                })
            })
            .collect()
    }

    pub fn current_category(&self) -> &str {
        &self.current_category
    }

    /// Switches the category filter; purely local, no re-fetch
    pub fn set_category(&mut self, category: &str) {
        self.current_category = category.to_string();
    }

    /// Counts over the full list, unaffected by the category filter
    pub fn stats(&self) -> WardrobeStats {
        let mut by_category = BTreeMap::new();
        for item in &self.items {
            let category = if item.category.is_empty() {
                "other"
            } else {
                &item.category
            };
            *by_category.entry(category.to_string()).or_insert(0) += 1;
        }
        WardrobeStats {
            total: self.items.len(),
            by_category,
        }
    }

    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }

    pub fn selection_count(&self) -> usize {
        self.selected.len()
    }

    /// Toggles one item in or out of the batch selection, returning the new
    /// selection size
    pub fn toggle_selection(&mut self, item_id: i64) -> usize {
        if !self.selected.remove(&item_id) {
            self.selected.insert(item_id);
        }
        self.selected.len()
    }

    /// Enters or leaves batch mode. Leaving with a non-empty selection
    /// executes the batch delete.
    pub async fn toggle_batch_mode(&mut self) -> Result<(), ClientError> {
        if !self.batch_mode {
            self.selected.clear();
            self.batch_mode = true;
            return Ok(());
        }

        self.batch_mode = false;
        if self.selected.is_empty() {
            return Ok(());
        }
        self.execute_batch_delete().await
    }

    /// Deletes one item after confirmation. On server confirmation the item
    /// is removed locally without a re-fetch.
    ///
    /// Returns whether the item was deleted.
    pub async fn delete_item(&mut self, item_id: i64) -> Result<bool, ClientError> {
        if !self.ui.confirm("Delete this item?") {
            return Ok(false);
        }

        let _guard = self.session.begin_loading();

        match self.api.delete_item(item_id).await {
            Ok(response) if response.success => {
                self.items.retain(|item| item.id != Some(item_id));
                self.selected.remove(&item_id);
                self.ui.notify(Severity::Success, "Item deleted");
                Ok(true)
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Delete failed".to_string());
                self.ui.notify(Severity::Error, &message);
                Ok(false)
            }
            Err(e) => {
                self.ui.notify(
                    Severity::Error,
                    &format!("Delete failed: {}", e.user_message()),
                );
                Err(e)
            }
        }
    }

    /// Runs the confirmed batch delete. On failure the selection survives
    /// so the user can retry it after re-entering batch mode; only leaving
    /// the mode through a completed or declined delete clears it.
    async fn execute_batch_delete(&mut self) -> Result<(), ClientError> {
        let count = self.selected.len();
        if !self
            .ui
            .confirm(&format!("Delete {} selected items?", count))
        {
            self.selected.clear();
            return Ok(());
        }

        let mut ids: Vec<i64> = self.selected.iter().copied().collect();
        ids.sort_unstable();

        let guard = self.session.begin_loading();

        match self.api.batch_delete(&ids).await {
            Ok(response) if response.success => {
                self.ui.notify(
                    Severity::Success,
                    &format!("Deleted {} items", response.success_count),
                );
                if response.fail_count > 0 {
                    self.ui.notify(
                        Severity::Warning,
                        &format!("{} items could not be deleted", response.fail_count),
                    );
                }
                self.selected.clear();
                // The local list is stale either way; reload authoritatively
                drop(guard);
                self.load_wardrobe().await?;
                Ok(())
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Batch delete failed".to_string());
                self.ui.notify(Severity::Error, &message);
                Err(ClientError::Server(message))
            }
            Err(e) => {
                self.ui.notify(
                    Severity::Error,
                    &format!("Batch delete failed: {}", e.user_message()),
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UploadPart;
    use crate::config::ClientConfig;
    use crate::models::{
        BatchDeleteResponse, StatusResponse, UploadResponse, WardrobeResponse,
    };
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedUi {
        accept: bool,
        notices: Mutex<Vec<(Severity, String)>>,
    }

    impl ScriptedUi {
        fn new(accept: bool) -> Arc<Self> {
            Arc::new(Self {
                accept,
                notices: Mutex::new(Vec::new()),
            })
        }

        fn with(&self, severity: Severity) -> Vec<String> {
            self.notices
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _)| *s == severity)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl UiAdapter for ScriptedUi {
        fn notify(&self, severity: Severity, message: &str) {
            self.notices
                .lock()
                .unwrap()
                .push((severity, message.to_string()));
        }

        fn confirm(&self, _message: &str) -> bool {
            self.accept
        }
    }

    /// Backend fake holding an item table that deletes mutate
    struct FakeApi {
        items: Mutex<Vec<ClothingItem>>,
        load_calls: AtomicUsize,
        fail_load: bool,
        server_reject_load: bool,
        server_reject_batch: bool,
        /// Ids the batch delete refuses to remove
        batch_keep: Vec<i64>,
    }

    impl FakeApi {
        fn with_items(items: Vec<ClothingItem>) -> Arc<Self> {
            Arc::new(Self {
                items: Mutex::new(items),
                load_calls: AtomicUsize::new(0),
                fail_load: false,
                server_reject_load: false,
                server_reject_batch: false,
                batch_keep: Vec::new(),
            })
        }
    }

    #[async_trait]
    impl WardrobeApi for FakeApi {
        async fn upload_images(
            &self,
            _parts: Vec<UploadPart>,
        ) -> Result<UploadResponse, ClientError> {
            unimplemented!("not used by the wardrobe workflow")
        }

        async fn get_wardrobe(&self) -> Result<WardrobeResponse, ClientError> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                return Err(ClientError::Network("connection refused".to_string()));
            }
            if self.server_reject_load {
                return Ok(WardrobeResponse {
                    success: false,
                    message: Some("database unavailable".to_string()),
                    items: Vec::new(),
                });
            }
            Ok(WardrobeResponse {
                success: true,
                message: None,
                items: self.items.lock().unwrap().clone(),
            })
        }

        async fn delete_item(&self, item_id: i64) -> Result<StatusResponse, ClientError> {
            self.items
                .lock()
                .unwrap()
                .retain(|item| item.id != Some(item_id));
            Ok(StatusResponse {
                success: true,
                message: None,
            })
        }

        async fn batch_delete(
            &self,
            item_ids: &[i64],
        ) -> Result<BatchDeleteResponse, ClientError> {
            if self.server_reject_batch {
                return Ok(BatchDeleteResponse {
                    success: false,
                    message: Some("items belong to another user".to_string()),
                    success_count: 0,
                    fail_count: 0,
                });
            }
            let mut deleted = 0;
            let mut kept = 0;
            for id in item_ids {
                if self.batch_keep.contains(id) {
                    kept += 1;
                } else {
                    self.items
                        .lock()
                        .unwrap()
                        .retain(|item| item.id != Some(*id));
                    deleted += 1;
                }
            }
            Ok(BatchDeleteResponse {
                success: true,
                message: None,
                success_count: deleted,
                fail_count: kept,
            })
        }
    }

    fn item(id: i64, name: &str, category: &str) -> ClothingItem {
        ClothingItem {
            id: Some(id),
            name: name.to_string(),
            category: category.to_string(),
            color: "black".to_string(),
            style: None,
            warmth: 5,
            image_data: None,
            created_at: None,
        }
    }

    fn setup(api: Arc<FakeApi>, accept: bool) -> (WardrobeWorkflow, Arc<ScriptedUi>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let context = ClientContext::new(ClientConfig::default(), Arc::new(MemoryStore::new()));
        let ui = ScriptedUi::new(accept);
        let workflow = WardrobeWorkflow::new(&context, api, ui.clone());
        (workflow, ui)
    }

    #[tokio::test]
    async fn test_load_failure_is_distinct_from_empty() {
        let api = FakeApi::with_items(vec![item(1, "Shirt", "Tops")]);
        let (mut workflow, _ui) = setup(api.clone(), true);
        workflow.load_wardrobe().await.unwrap();

        // Empty only when a load actually succeeded with zero items
        api.items.lock().unwrap().clear();
        workflow.load_wardrobe().await.unwrap();
        assert_eq!(workflow.view(), WardrobeView::Empty);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_items() {
        let api = Arc::new(FakeApi {
            items: Mutex::new(vec![item(1, "Shirt", "Tops"), item(2, "Jeans", "Bottoms")]),
            load_calls: AtomicUsize::new(0),
            fail_load: false,
            server_reject_load: false,
            server_reject_batch: false,
            batch_keep: Vec::new(),
        });
        let (mut workflow, ui) = setup(api.clone(), true);
        workflow.load_wardrobe().await.unwrap();
        assert_eq!(workflow.card_views().len(), 2);

        // Next load fails at transport level; the grid keeps showing items
        let failing = Arc::new(FakeApi {
            items: Mutex::new(Vec::new()),
            load_calls: AtomicUsize::new(0),
            fail_load: true,
            server_reject_load: false,
            server_reject_batch: false,
            batch_keep: Vec::new(),
        });
        workflow.api = failing;
        assert!(workflow.load_wardrobe().await.is_err());
        assert_eq!(workflow.card_views().len(), 2);
        assert_eq!(ui.with(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_server_rejected_load_reports_failed_view() {
        let api = Arc::new(FakeApi {
            items: Mutex::new(Vec::new()),
            load_calls: AtomicUsize::new(0),
            fail_load: false,
            server_reject_load: true,
            server_reject_batch: false,
            batch_keep: Vec::new(),
        });
        let (mut workflow, _ui) = setup(api, true);

        let result = workflow.load_wardrobe().await;
        assert!(matches!(result, Err(ClientError::Server(_))));
        assert_eq!(workflow.view(), WardrobeView::LoadFailed);
    }

    #[tokio::test]
    async fn test_single_delete_is_optimistic() {
        let api = FakeApi::with_items(vec![
            item(41, "Shirt", "Tops"),
            item(42, "Jeans", "Bottoms"),
            item(43, "Coat", "Outerwear"),
        ]);
        let (mut workflow, _ui) = setup(api.clone(), true);
        workflow.load_wardrobe().await.unwrap();
        let loads_before = api.load_calls.load(Ordering::SeqCst);

        assert!(workflow.delete_item(42).await.unwrap());

        // Exactly that id is gone, with no re-fetch
        let ids: Vec<i64> = workflow.card_views().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![41, 43]);
        assert_eq!(workflow.stats().total, 2);
        assert_eq!(api.load_calls.load(Ordering::SeqCst), loads_before);
    }

    #[tokio::test]
    async fn test_declined_single_delete_changes_nothing() {
        let api = FakeApi::with_items(vec![item(1, "Shirt", "Tops")]);
        let (mut workflow, _ui) = setup(api.clone(), false);
        workflow.load_wardrobe().await.unwrap();

        assert!(!workflow.delete_item(1).await.unwrap());
        assert_eq!(workflow.stats().total, 1);
    }

    #[tokio::test]
    async fn test_batch_delete_reloads_authoritatively() {
        let api = Arc::new(FakeApi {
            items: Mutex::new(vec![
                item(1, "Shirt", "Tops"),
                item(2, "Jeans", "Bottoms"),
                item(3, "Coat", "Outerwear"),
                item(4, "Hat", "Accessories"),
            ]),
            load_calls: AtomicUsize::new(0),
            fail_load: false,
            server_reject_load: false,
            server_reject_batch: false,
            batch_keep: vec![3],
        });
        let (mut workflow, ui) = setup(api.clone(), true);
        workflow.load_wardrobe().await.unwrap();
        let loads_before = api.load_calls.load(Ordering::SeqCst);

        workflow.toggle_batch_mode().await.unwrap();
        workflow.toggle_selection(1);
        workflow.toggle_selection(2);
        workflow.toggle_selection(3);
        workflow.toggle_batch_mode().await.unwrap();

        // Two deleted, one refused, list re-fetched from the server
        assert_eq!(api.load_calls.load(Ordering::SeqCst), loads_before + 1);
        let ids: Vec<i64> = workflow.card_views().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert!(!workflow.is_batch_mode());
        assert_eq!(workflow.selection_count(), 0);
        assert_eq!(ui.with(Severity::Warning).len(), 1);
    }

    #[tokio::test]
    async fn test_declined_batch_confirm_clears_selection() {
        let api = FakeApi::with_items(vec![item(1, "Shirt", "Tops"), item(2, "Jeans", "Bottoms")]);
        let (mut workflow, _ui) = setup(api.clone(), false);
        workflow.load_wardrobe().await.unwrap();

        workflow.toggle_batch_mode().await.unwrap();
        workflow.toggle_selection(1);
        workflow.toggle_batch_mode().await.unwrap();

        assert_eq!(workflow.selection_count(), 0);
        assert_eq!(workflow.stats().total, 2);
    }

    #[tokio::test]
    async fn test_server_rejected_batch_delete_surfaces_message() {
        let api = Arc::new(FakeApi {
            items: Mutex::new(vec![item(1, "Shirt", "Tops"), item(2, "Jeans", "Bottoms")]),
            load_calls: AtomicUsize::new(0),
            fail_load: false,
            server_reject_load: false,
            server_reject_batch: true,
            batch_keep: Vec::new(),
        });
        let (mut workflow, ui) = setup(api.clone(), true);
        workflow.load_wardrobe().await.unwrap();
        let loads_before = api.load_calls.load(Ordering::SeqCst);

        workflow.toggle_batch_mode().await.unwrap();
        workflow.toggle_selection(1);
        workflow.toggle_selection(2);
        let result = workflow.toggle_batch_mode().await;

        // The server's message comes back in the error and the notice;
        // nothing is reloaded and the selection survives for a retry
        match result {
            Err(ClientError::Server(message)) => {
                assert_eq!(message, "items belong to another user");
            }
            other => panic!("expected server error, got {:?}", other),
        }
        let errors = ui.with(Severity::Error);
        assert_eq!(errors, vec!["items belong to another user".to_string()]);
        assert_eq!(api.load_calls.load(Ordering::SeqCst), loads_before);
        assert_eq!(workflow.stats().total, 2);
        assert_eq!(workflow.selection_count(), 2);
        assert!(!workflow.is_batch_mode());
        assert!(!workflow.session.is_loading());
    }

    #[tokio::test]
    async fn test_category_filter_is_local() {
        let api = FakeApi::with_items(vec![
            item(1, "Shirt", "Tops"),
            item(2, "Jeans", "Bottoms"),
            item(3, "Tee", "Tops"),
        ]);
        let (mut workflow, _ui) = setup(api.clone(), true);
        workflow.load_wardrobe().await.unwrap();
        let loads_before = api.load_calls.load(Ordering::SeqCst);

        workflow.set_category("Tops");
        let ids: Vec<i64> = workflow.card_views().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);

        workflow.set_category(ALL_CATEGORIES);
        assert_eq!(workflow.card_views().len(), 3);
        assert_eq!(api.load_calls.load(Ordering::SeqCst), loads_before);

        // Stats ignore the filter
        workflow.set_category("Tops");
        let stats = workflow.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_category.get("Tops"), Some(&2));
        assert_eq!(stats.by_category.get("Bottoms"), Some(&1));
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let mut broken = item(0, "", "Tops");
        broken.id = None;
        let nameless = item(9, "", "Tops");
        let api = FakeApi::with_items(vec![broken, nameless, item(1, "Shirt", "Tops")]);
        let (mut workflow, _ui) = setup(api, true);
        workflow.load_wardrobe().await.unwrap();

        let cards = workflow.card_views();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, 1);
        // Stats still count the raw records
        assert_eq!(workflow.stats().total, 3);
    }
}
