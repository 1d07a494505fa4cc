pub mod dataset;
pub mod explore;
pub mod fetch;
pub mod meta;
pub mod table;

pub use dataset::{Dataset, TableState};
pub use explore::Explorer;
pub use meta::{FieldDescriptor, FieldType, ResourceMetadata};
pub use table::NormalizedTable;
