pub mod boards;
pub mod cache;
pub mod extractor;
pub mod handlers;
pub mod heuristics;
pub mod html;
pub mod models;
pub mod prompts;
pub mod scraper;
pub mod search;
pub mod ssrf;
