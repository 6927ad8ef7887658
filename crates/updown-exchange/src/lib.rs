//! REST clients for the exchange.
//!
//! Two endpoints, two clients: `InfoClient` for unauthenticated reads (perp
//! metadata, mid prices, clearinghouse state) and `ExchangeClient` for
//! signed trade actions.

pub mod error;
pub mod exchange;
pub mod info;
pub mod response;

pub use error::{ExchangeError, ExchangeResult};
pub use exchange::{ActionEnvelope, ExchangeClient};
pub use info::{AccountState, InfoClient};
pub use response::{OrderStatus, RawExchangeResponse};
