pub mod email;

pub use email::EmailChannel;
