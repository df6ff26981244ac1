// Service exports
pub mod randomuser;
pub mod session;
pub mod source;

pub use randomuser::RandomUserClient;
pub use session::{LoadState, SearchSession, SessionError, SessionHandle, SessionOptions};
pub use source::{SourceError, StaticUserSource, UserSource};
