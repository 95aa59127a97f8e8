mod response;
pub use response::{CaptionBatch, CaptionItem, CollectiveCaption};
