//! Process execution and output capture for the installer backend.
//!
//! Spawns the install command, streams its combined stdout/stderr as it is
//! produced, and lets the owner terminate it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ib_io::runner::{RunEvent, Runner};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> ib_io::prelude::Result<()> {
//! let runner = Runner::new("echo", vec!["Hello, World!"]);
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let handle = runner.spawn(tx)?;
//!
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         RunEvent::Output(bytes) => print!("{}", String::from_utf8_lossy(&bytes)),
//!         RunEvent::Exited(code) => println!("exited with {code}"),
//!         RunEvent::Killed => println!("killed"),
//!     }
//! }
//! assert!(!handle.is_alive());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod prelude;
pub mod process;
pub mod runner;
