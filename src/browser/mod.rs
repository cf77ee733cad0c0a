mod filter;
mod history;

pub use filter::{ExtensionFilter, Filters, SortMode};
pub use history::NavigationHistory;
