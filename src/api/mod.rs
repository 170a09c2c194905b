mod harness;
mod spec;

pub use harness::{RestMock, RestMockOptions};
pub use spec::Responder;
