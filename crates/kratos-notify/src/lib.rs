mod mailer;
pub use mailer::*;

mod templates;
pub use templates::*;

mod sweep;
pub use sweep::*;
