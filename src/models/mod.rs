pub mod history;
pub mod quote;
pub mod site;

pub use history::*;
pub use quote::*;
pub use site::*;
