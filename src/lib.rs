//! # Wardrobe Client
//!
//! Headless client library for a wardrobe management service.
//!
//! This crate carries the client-side workflow logic, including:
//! - Batch image upload with validation, session dedupe and compression
//! - Wardrobe grid state with filtering, single and batch delete
//! - A typed client over the backend's HTTP surface
//! - Session persistence across restarts
//!
//! ## Platform Separation
//!
//! The crate focuses on workflow logic and stays independent of any UI
//! toolkit. Presentation concerns (toasts, confirmation dialogs, preview
//! rendering) plug in through the [`UiAdapter`] and [`ImagePreviews`]
//! traits; the application crate owns the widgets.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//! use wardrobe_client::{
//!     ApiClient, ClientConfig, ClientContext, FileStore, JpegCompressor,
//!     DataUrlPreviews, LogUi, UploadWorkflow,
//! };
//!
//! let config = ClientConfig::load(Path::new("wardrobe.toml"))?;
//! let store = Arc::new(FileStore::open(PathBuf::from("session.json"))?);
//! let context = ClientContext::new(config, store);
//! context.restore_session();
//!
//! let api = Arc::new(ApiClient::new(&context.config.api, context.session.clone())?);
//! let mut upload = UploadWorkflow::new(
//!     &context,
//!     api,
//!     Arc::new(JpegCompressor),
//!     Arc::new(DataUrlPreviews::new()),
//!     Arc::new(LogUi { assume_yes: false }),
//! );
//! ```

pub mod api;
pub mod compress;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod preview;
pub mod session;
pub mod storage;
pub mod upload;
pub mod wardrobe;

pub use api::{ApiClient, UploadPart, WardrobeApi, DEFAULT_OCCASION, DEFAULT_STYLE};
pub use compress::{CompressionOptions, ImageCompressor, JpegCompressor};
pub use config::{ApiConfig, ClientConfig, UploadConfig};
pub use error::ClientError;
pub use models::{
    BatchDeleteResponse, ClothingItem, HistoryEntry, HistoryResponse, LoginResponse,
    ProfileResponse, RecommendationResponse, StatusResponse, UploadResponse, UserProfile,
    UserRef, WardrobeResponse, WeatherReport,
};
pub use notify::{LogUi, Severity, UiAdapter};
pub use preview::{DataUrlPreviews, ImagePreviews, PreviewHandle};
pub use session::{ClientContext, LoadingGuard, SessionState, UploadedNames, SESSION_STORE_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use upload::{format_file_size, CandidateView, FileInput, UploadPhase, UploadWorkflow};
pub use wardrobe::{
    ItemCard, WardrobeStats, WardrobeView, WardrobeWorkflow, ALL_CATEGORIES,
};
