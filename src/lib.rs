//! The `tally` crate is a reactive shopping form that recalculates its total the moment every
//! field checks out.
//!
//! The shape of the thing: four inputs (quantity, price, tax, discount), a label beside each
//! one, and a running total at the bottom.  Every change event becomes a message on a channel,
//! every consumer is a lightweight task that suspends while waiting for the next message, and
//! the only shared state is the page itself.  In other words, this is the message-passing
//! pattern applied to form validation, and the interesting part is the few dozen lines of glue
//! between the event and the total.  So that you can follow the dataflow the way the data does,
//! here is the route with links:
//!
//! 1. Standing in for the document - [`Page`]
//!     * [`Page::listen`] turns event registration into a stream.
//!     * [`Page::fire`] is where a change event enters the system.
//!     * [`Page::close`] ends every registration at once, see below.
//! 2. Checking a value - [`Rules`], behind the [`Audit`] trait.
//! 3. Turning events into verdicts - [`Auditor`], producing a [`Verdict`] per event.
//! 4. Keeping the label honest - [`Signpost`]
//! 5. Watching the whole form - [`Tallyman`]
//!     * [`Tallyman::recalculate`] files a [`Reckon`] request with the [`Abacus`].
//! 6. Wiring it all together - [`Till`]
//!
//! Two design points deserve a sentence each.  First, a field's verdicts are handled strictly in
//! the order its events fired, but across fields the merged ledger interleaves however the
//! results land; the [`Tallyman`] is written so that only the per-field order matters.  Second,
//! event listeners love to outlive the page that registered them, so subscriptions here are
//! scoped: [`Till::settle`] closes the page feeds, every stream drains and ends, and every task
//! finishes on its own.  No listener survives the till that hired it.
//!
//! The demo binary builds the form with [`storefront`], opens the [`Till`], and replays a
//! [`Script`] of keystrokes from `data/script.csv`.  We decorate `main` with `#[tokio::main]`,
//! using [`tokio`] channels and tasks for all of the above.  Run it with `RUST_LOG=tally=trace`
//! to watch the verdicts move.
mod abacus;
mod blunder;
mod field;
mod page;
mod script;
mod signpost;
mod tallyman;
mod till;
mod utils;
mod verdict;

/// Since this is a small crate, we lift all user-facing data types and functions to the parent
/// namespace for ease of access.
pub use abacus::{Abacus, Reckon};
pub use blunder::{Blunder, Upshot};
pub use field::{Field, Readings, TOTAL};
pub use page::{storefront, Elem, EventKind, Page, RawEvent};
pub use script::{Cue, Script};
pub use signpost::Signpost;
pub use tallyman::Tallyman;
pub use till::Till;
pub use utils::trace_init;
pub use verdict::{Audit, Auditor, Rules, Verdict};
