mod category;
mod layer;
mod store;

pub use category::Category;
pub use layer::ReferenceLayer;
pub use store::ReferenceStore;
