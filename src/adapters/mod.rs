// Adapters layer: concrete implementations of the domain ports.

pub mod favorites;
pub mod storage;

pub use favorites::LocalFavoritesStore;
pub use storage::LocalStorage;
