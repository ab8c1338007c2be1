//! External resource opening module.

mod opener;

pub use opener::BrowserOpener;
