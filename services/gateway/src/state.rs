use matching_engine::EngineHandle;
use order_store::OrderStore;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub store: Arc<dyn OrderStore>,
}
