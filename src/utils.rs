/// The `trace_init` function sets up the [`tracing_subscriber`] with an environment filter, so
/// you can turn the chatter up or down with the `RUST_LOG` variable.  Run the demo with
/// `RUST_LOG=tally=trace` to watch every verdict move through the till.
///
/// We use [`tracing_subscriber::fmt::SubscriberBuilder::try_init`] rather than `init` because the
/// tests also call this function, and only the first caller gets to install a global subscriber.
pub fn trace_init() {
    if tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .is_ok()
    {
        tracing::trace!("Subscriber initialized.");
    };
}
