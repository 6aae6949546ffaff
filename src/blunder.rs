/// The `Upshot` alias saves us from typing out the full result type on every fallible method in
/// the crate.  An `Ok` is the upshot we hoped for, and a [`Blunder`] is the upshot we got.
pub type Upshot<T> = Result<T, Blunder>;

/// The `Blunder` enum collects the ways this crate can let you down.  Each variant wraps the
/// error type of the library that produced it, or carries a short description when the mistake is
/// entirely our own.  Note that a shopper typing "three" into the quantity box is *not* a
/// `Blunder`: invalid input is the expected signal path, carried by [`crate::Verdict`], and never
/// bubbles up through this type.
///
/// We lean on [`derive_more`] to write the [`std::fmt::Display`], [`std::error::Error`] and
/// [`From`] impls, which keeps this file honest about its actual job: naming what went wrong.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Blunder {
    /// Trouble reading or building the configuration using the [`config`] crate.
    #[display("config trouble: {_0}")]
    #[from]
    Config(config::ConfigError),
    /// Trouble touching the file system, e.g. when opening a script.
    #[display("io trouble: {_0}")]
    #[from]
    Io(std::io::Error),
    /// Trouble deserializing a script using the [`csv`] crate.
    #[display("csv trouble: {_0}")]
    #[from]
    Csv(csv::Error),
    /// The abacus dropped the reply sender without answering.
    #[display("the abacus hung up before answering: {_0}")]
    #[from]
    Reply(tokio::sync::oneshot::error::RecvError),
    /// A lookup on the page came up empty.  Carries the id we asked for.
    #[display("no element on the page with id '{_0}'")]
    MissingElem(#[error(not(source))] String),
    /// A message was sent down a channel whose receiver is gone.
    #[display("sent to a closed channel")]
    DeadLetter,
    /// The abacus was asked to perform an operation it has never heard of.
    #[display("no such operation: '{_0}'")]
    UnknownOp(#[error(not(source))] String),
    /// A reading would not parse as a number.  The validators should prevent this from ever
    /// reaching the abacus, but the abacus refuses to trust its callers.
    #[display("could not figure a number from '{_0}'")]
    Figure(#[error(not(source))] String),
}
