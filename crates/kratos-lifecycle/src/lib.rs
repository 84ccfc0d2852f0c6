mod error;
pub use error::*;

mod duration;
pub use duration::*;

mod effects;
pub use effects::*;

mod activation;
pub use activation::*;

mod suspension;
pub use suspension::*;
