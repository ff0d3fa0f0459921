mod form;
mod product;

pub use form::*;
pub use product::*;
