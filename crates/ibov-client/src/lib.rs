#[cfg(feature = "browser")]
pub mod browser_renderer;
pub mod table_extractor;

#[cfg(feature = "browser")]
pub use browser_renderer::BrowserRenderer;
pub use table_extractor::{DEFAULT_TABLE_SELECTOR, HtmlTableExtractor};
