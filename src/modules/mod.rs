pub mod books;

use std::sync::Arc;

use biblio_kernel::{settings::Settings, ModuleRegistry};
use biblio_store::{BookStore, MemoryStore};

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) {
    let store: Arc<dyn BookStore> = Arc::new(MemoryStore::new());
    registry.register(books::create_module(store, settings.books.clone()));
}
