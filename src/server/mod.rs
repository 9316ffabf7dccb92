pub mod builder;
pub mod handler;
pub mod session;

pub use builder::ServerBuilder;
pub use handler::{EchoResponder, Responder};
pub use session::{send_all, ClientInterrupt, SessionOutcome, SessionRunner};
