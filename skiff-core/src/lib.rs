mod argument;
mod as_value;
pub mod blocking;
mod builder;
mod characters;
mod connection;
mod dialect;
mod driver;
mod error;
mod factory;
mod include;
mod listener;
mod mapping;
mod paging;
pub mod provider;
mod row;
mod session;
mod sql_string;
mod transaction;
mod util;
mod value;

pub use argument::*;
pub use as_value::*;
pub use builder::*;
pub use characters::*;
pub use connection::*;
pub use dialect::*;
pub use driver::*;
pub use error::*;
pub use factory::*;
pub use include::*;
pub use listener::*;
pub use mapping::*;
pub use paging::*;
pub use provider::*;
pub use row::*;
pub use session::*;
pub use sql_string::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use ::async_trait::async_trait;
pub use ::tokio_util::sync::CancellationToken;
