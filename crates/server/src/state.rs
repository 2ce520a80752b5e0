use service::Backend;

/// Shared handler state: the storage backend chosen at startup.
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}
