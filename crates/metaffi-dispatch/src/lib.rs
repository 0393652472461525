//! Call dispatch and handle-ownership arbiter (§4.7, §4.8).

mod arbiter;
mod callable;
mod dispatch;
mod error;

pub use arbiter::{disarm_and_free, disarm_foreign_handles};
pub use callable::{invoke_callable, DispatchCallableInvoker};
pub use dispatch::call;
pub use error::DispatchError;
