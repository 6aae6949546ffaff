use crate::{
    Abacus, Auditor, EventKind, Field, Page, Rules, Signpost, Tallyman, Upshot,
};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The `till` module contains the [`Till`] struct, which wires the whole form together and holds
/// the parent-level view of the running dataflow.
///
/// # Opening the till
///
/// [`Till::open`] lays the plumbing in one pass over the four fields.  For each field it
/// registers a change listener on the page, stands up an [`Auditor`] to turn raw events into
/// verdicts, and posts a [`Signpost`] to keep the label honest.  Every auditor also holds a
/// clone of one shared sender, and that is the entire merge point: four producers, one ledger,
/// each field's verdicts in their own firing order, the interleaving across fields being whatever
/// order the results land in.  The [`Tallyman`] folds the ledger, and an [`Abacus`] stands in for
/// the remote computation at the end of a bounded channel.
///
/// Every task goes through [`tokio::spawn`] and its handle goes into the crew.  The spawned
/// futures return our [`Upshot`], so each wrapper logs a trace on a clean exit and a warning if
/// the task quit early with a blunder — the same arrangement the rest of this crate uses anywhere
/// a task outlives the function that started it.
///
/// # Closing time
///
/// Event registrations have a habit of outliving their welcome.  Here the subscriptions are
/// scoped to the till: [`Till::close`] asks the page to drop its feeds, which lets every stream
/// drain and every task finish of its own accord, and [`Till::settle`] does that and then awaits
/// the whole crew.  After `settle` returns, every queued event has been fully processed and the
/// page holds the final word on labels and total — which is also what makes the integration tests
/// deterministic without a single sleep.
#[derive(Debug, derive_getters::Getters)]
pub struct Till {
    page: Page,
    config: config::Config,
    crew: Vec<JoinHandle<()>>,
}

impl Till {
    /// Opens the till over `page`, spawning the full crew.  The page must already hold an input
    /// and a label for each [`Field`] plus the total display; a missing element turns up here as
    /// a [`crate::Blunder::MissingElem`] rather than as a silent dead field later.  Signposts are
    /// posted before this method returns, so the label titles are captured before the caller has
    /// any opportunity to fire an event.
    #[tracing::instrument(skip_all)]
    pub fn open(page: Page) -> Upshot<Self> {
        let config = Self::load_config()?;
        let badge = config.get_string("badge")?;
        let buffer = config.get_int("buffer")? as usize;
        let op = config.get_string("operation")?;
        let mut crew = Vec::new();

        let (ledger_tx, ledger_rx) = mpsc::unbounded_channel();
        let (desk_tx, desk_rx) = mpsc::channel(buffer);

        for field in Field::iter() {
            let raw = page.listen(&field.input_id(), EventKind::Change)?;
            let (verdict_tx, verdict_rx) = mpsc::unbounded_channel();
            let auditor = Auditor::new(field, Rules, raw, verdict_tx, Some(ledger_tx.clone()));
            crew.push(tokio::spawn(async move {
                match auditor.examine().await {
                    Ok(_) => tracing::trace!("{field} auditor settled."),
                    Err(e) => tracing::warn!("{field} auditor quit: {}", e.to_string()),
                }
            }));
            let signpost = Signpost::post(field, page.clone(), badge.clone(), verdict_rx)?;
            crew.push(tokio::spawn(async move {
                match signpost.watch().await {
                    Ok(_) => tracing::trace!("{field} signpost settled."),
                    Err(e) => tracing::warn!("{field} signpost quit: {}", e.to_string()),
                }
            }));
        }
        // The auditors hold the only remaining ledger senders, so the tallyman's stream ends
        // exactly when the last auditor does.
        drop(ledger_tx);

        let tallyman = Tallyman::new(ledger_rx, page.clone(), desk_tx, op);
        crew.push(tokio::spawn(async move {
            match tallyman.track().await {
                Ok(_) => tracing::trace!("Tallyman settled."),
                Err(e) => tracing::warn!("Tallyman quit: {}", e.to_string()),
            }
        }));

        let abacus = Abacus::new(desk_rx);
        crew.push(tokio::spawn(async move {
            match abacus.serve().await {
                Ok(_) => tracing::trace!("Abacus settled."),
                Err(e) => tracing::warn!("Abacus quit: {}", e.to_string()),
            }
        }));

        tracing::trace!("Till open with a crew of {}.", crew.len());
        Ok(Self { page, config, crew })
    }

    /// Reads settings from `Tally.toml`, falling back on built-in defaults for anything the file
    /// does not say (or if there is no file at all, as in the tests).  Three settings so far:
    ///
    /// * `badge` - the class a label wears while its field is in error.
    /// * `buffer` - capacity of the channel to the abacus.
    /// * `operation` - the operation name sent with each reckoning request.
    #[tracing::instrument(skip_all)]
    pub fn load_config() -> Upshot<config::Config> {
        let config = config::Config::builder()
            .set_default("badge", "error")?
            .set_default("buffer", 100_i64)?
            .set_default("operation", "calculate")?
            .add_source(config::File::with_name("Tally").required(false))
            .build()?;
        // Read the config back to make sure it's sensible.
        tracing::trace!("{:#?}", config);
        Ok(config)
    }

    /// Ends every event registration on the page.  Streams drain and the crew winds down; the
    /// elements and their final state stay readable.
    #[tracing::instrument(skip_all)]
    pub fn close(&self) {
        self.page.close();
    }

    /// Closes the till and waits for the whole crew to finish.  Once this returns, every event
    /// fired before the close has been validated, painted, and tallied.
    #[tracing::instrument(skip_all)]
    pub async fn settle(self) {
        self.close();
        for hand in self.crew {
            if hand.await.is_err() {
                tracing::warn!("A crew member went missing at close.");
            }
        }
        tracing::trace!("Till settled.");
    }
}
