use crate::{Blunder, Field, Page, Readings, Reckon, Upshot, Verdict, TOTAL};
use std::collections::BTreeSet;
use tokio::sync::{mpsc, oneshot};

/// The `Tallyman` struct watches the whole form at once.  Tagged verdicts from every field arrive
/// interleaved on one merged ledger, and the tallyman folds them into the set of fields currently
/// in arrears.  The set is owned by this one task and touched by nobody else, so the bookkeeping
/// needs no lock; a future with more threads would have to keep this single-owner discipline or
/// start paying for a mutex.
///
/// Each pair updates the set in one consistent pass — insert the field if its verdict is dirty,
/// remove it if clear — and only then asks the deciding question: is the set empty?  An earlier
/// draft added the field and then unconditionally removed it before checking, which let the
/// recalculation fire while the reporting field was still bad; folding the add and the remove
/// into a single update closes that hole, and the regression tests below pin the behavior so it
/// stays closed.  When the set is empty the tallyman snapshots the current readings and
/// recalculates, exactly once per pair.  Note that a change to an already-valid form also
/// recalculates, which is the point of the exercise: the total follows the form wherever the
/// form is fully in good standing.
///
/// The invariant worth stating: after any pair is processed, the set holds exactly the fields
/// whose most recent verdict was dirty.
#[derive(Debug, derive_new::new)]
pub struct Tallyman {
    /// The merged stream of (field, verdict) pairs from every auditor.
    ledger: mpsc::UnboundedReceiver<(Field, Verdict)>,
    /// Read for the snapshot of current values; the total is written back here.
    page: Page,
    /// The desk where reckoning requests are filed.
    desk: mpsc::Sender<Reckon>,
    /// Operation name sent with each request.
    op: String,
    /// Fields currently in arrears.
    #[new(default)]
    lapsed: BTreeSet<Field>,
}

impl Tallyman {
    /// Folds over the ledger until every auditor has hung up.
    #[tracing::instrument(skip_all)]
    pub async fn track(mut self) -> Upshot<()> {
        while let Some((field, verdict)) = self.ledger.recv().await {
            if verdict.is_clear() {
                self.lapsed.remove(&field);
            } else {
                self.lapsed.insert(field);
            }
            tracing::trace!("In arrears: {:?}", self.lapsed);
            if self.lapsed.is_empty() {
                let readings = self.page.readings()?;
                if let Err(e) = self.recalculate(readings).await {
                    // The total keeps its last good value.
                    tracing::warn!("Recalculation declined: {}", e.to_string());
                }
            }
        }
        tracing::trace!("Ledger closed, tallyman going home.");
        Ok(())
    }

    /// Files a reckoning request for the given readings and writes the answer, fixed to two
    /// decimal places, into the total display.  The readings come in as an argument rather than
    /// being read here, so this method can be exercised against any values without a form
    /// attached.
    #[tracing::instrument(skip_all)]
    pub async fn recalculate(&self, readings: Readings) -> Upshot<()> {
        let (tx, rx) = oneshot::channel();
        let reckon = Reckon::new(self.op.clone(), readings, tx);
        self.desk.send(reckon).await.map_err(|_| Blunder::DeadLetter)?;
        let total = rx.await?;
        self.page.set_value(TOTAL, &format!("{total:.2}"))?;
        tracing::trace!("Total now reads {total:.2}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront;
    use tokio::task::JoinHandle;

    /// Wires a tallyman to a counting stand-in for the abacus.  The responder answers every
    /// request with a fixed total and reports how many requests it saw once its desk closes.
    fn rigged() -> (
        mpsc::UnboundedSender<(Field, Verdict)>,
        JoinHandle<Upshot<()>>,
        JoinHandle<usize>,
        Page,
    ) {
        let page = storefront();
        let (ledger_tx, ledger_rx) = mpsc::unbounded_channel();
        let (desk_tx, mut desk_rx) = mpsc::channel::<Reckon>(8);
        let responder = tokio::spawn(async move {
            let mut count = 0;
            while let Some(reckon) = desk_rx.recv().await {
                let (_, _, tx) = reckon.dissolve();
                let _ = tx.send(42.0);
                count += 1;
            }
            count
        });
        let tallyman = Tallyman::new(ledger_rx, page.clone(), desk_tx, "calculate".to_string());
        let tracking = tokio::spawn(tallyman.track());
        (ledger_tx, tracking, responder, page)
    }

    fn dirty(field: Field) -> (Field, Verdict) {
        (
            field,
            Verdict::faults(vec![format!("{} has to be a number.", field.title())]),
        )
    }

    fn clear(field: Field) -> (Field, Verdict) {
        (field, Verdict::clear())
    }

    #[tokio::test]
    async fn fires_once_when_last_fault_clears() {
        let (ledger, tracking, responder, page) = rigged();
        // The decisive edge case: a field goes bad and then recovers.  No recalculation while it
        // is bad; exactly one when it clears.
        ledger.send(dirty(Field::Quantity)).unwrap();
        ledger.send(clear(Field::Quantity)).unwrap();
        drop(ledger);
        tracking.await.unwrap().unwrap();
        assert_eq!(responder.await.unwrap(), 1);
        assert_eq!(page.value(TOTAL).unwrap(), "42.00");
    }

    #[tokio::test]
    async fn holds_fire_until_every_field_recovers() {
        let (ledger, tracking, responder, _page) = rigged();
        ledger.send(dirty(Field::Quantity)).unwrap();
        ledger.send(dirty(Field::Price)).unwrap();
        // Quantity recovers, but price is still in arrears.
        ledger.send(clear(Field::Quantity)).unwrap();
        ledger.send(clear(Field::Price)).unwrap();
        drop(ledger);
        tracking.await.unwrap().unwrap();
        // Only the final clearance fires.
        assert_eq!(responder.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn a_valid_form_recalculates_on_every_change() {
        let (ledger, tracking, responder, _page) = rigged();
        ledger.send(clear(Field::Quantity)).unwrap();
        ledger.send(clear(Field::Tax)).unwrap();
        drop(ledger);
        tracking.await.unwrap().unwrap();
        assert_eq!(responder.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn repeated_dirt_never_fires() {
        let (ledger, tracking, responder, page) = rigged();
        ledger.send(dirty(Field::Discount)).unwrap();
        ledger.send(dirty(Field::Discount)).unwrap();
        drop(ledger);
        tracking.await.unwrap().unwrap();
        assert_eq!(responder.await.unwrap(), 0);
        assert_eq!(page.value(TOTAL).unwrap(), "0.00");
    }

    #[tokio::test]
    async fn a_silent_abacus_leaves_the_total_alone() {
        let page = storefront();
        let (ledger_tx, ledger_rx) = mpsc::unbounded_channel();
        let (desk_tx, mut desk_rx) = mpsc::channel::<Reckon>(8);
        // This responder takes the envelope and never answers.
        tokio::spawn(async move {
            while let Some(reckon) = desk_rx.recv().await {
                drop(reckon);
            }
        });
        let tallyman = Tallyman::new(ledger_rx, page.clone(), desk_tx, "calculate".to_string());
        let tracking = tokio::spawn(tallyman.track());
        ledger_tx.send((Field::Quantity, Verdict::clear())).unwrap();
        drop(ledger_tx);
        // The failed reckoning is logged, not fatal, and the total keeps its last value.
        tracking.await.unwrap().unwrap();
        assert_eq!(page.value(TOTAL).unwrap(), "0.00");
    }
}
