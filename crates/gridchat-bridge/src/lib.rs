//! Local HTTP bridge between the gridchat client and a spreadsheet host.
//!
//! The bridge answers three routes on `127.0.0.1:3001` by default: a health
//! probe, a read of the targeted sheet as a header-keyed record table, and a
//! best-effort batch of write operations. Spreadsheet access goes through the
//! [`SpreadsheetHost`] trait; [`MemoryHost`] keeps workbooks in memory and can
//! load and save them as CSV.
//!
//! ```no_run
//! use std::sync::Arc;
//! use gridchat_bridge::{BridgeConfig, MemoryHost};
//!
//! # async fn example() -> gridchat_bridge::Result<()> {
//! let host = MemoryHost::new();
//! host.open_csv("sales.csv")?;
//! gridchat_bridge::serve(&BridgeConfig::default(), Arc::new(host)).await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod host;
pub mod memory;
pub mod server;
pub mod table;

pub use error::{BridgeError, HostError, Result};
pub use host::{SheetSnapshot, SpreadsheetHost};
pub use memory::MemoryHost;
pub use server::{bind_local, router, run, serve, BridgeConfig, DEFAULT_ALLOWED_ORIGIN};
