//! Email parsing and body conversion.

pub mod html;
pub mod model;
pub mod parser;

pub use html::strip_html;
pub use model::{Attachment, StructuredMail};
pub use parser::parse_email;
