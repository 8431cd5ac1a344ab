//! # Events Module
//!
//! Progress reporting over channels, so any front end can follow a run.
//!
//! `MatchEvent::Matched` fires once per accepted match. Front ends that move
//! or copy files after a match hook in here; the library itself never touches
//! the filesystem beyond reading.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Match(MatchEvent::Matched { target, candidate, .. }) = event {
//!             println!("{} came from {}", target.display(), candidate.display());
//!         }
//!     }
//! });
//!
//! finder.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
