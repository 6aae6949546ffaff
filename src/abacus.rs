use crate::{Blunder, Readings, Upshot};
use tokio::sync::{mpsc, oneshot};

/// The `Reckon` struct is a request for the remote computation, addressed like a self-addressed
/// stamped envelope: the requester tucks a [`oneshot::Sender`] inside, and the [`Abacus`] uses it
/// to mail the answer straight back.  No registries of pending requests, no correlation ids —
/// the channel local to the exchange is the whole bookkeeping apparatus.
///
/// * The `op` field names the operation, because the desk on the other end may one day know more
///   than one trick.
/// * The `readings` field carries the four field values as the strings the form holds, which is
///   exactly how a remote endpoint would receive them.
/// * The `tx` field is the return envelope.
#[derive(Debug, derive_new::new, derive_getters::Dissolve)]
pub struct Reckon {
    op: String,
    readings: Readings,
    tx: oneshot::Sender<f64>,
}

/// The `Abacus` struct services reckoning requests from its own task, standing in for the remote
/// computation a real deployment would call over the wire.  Requests arrive on a bounded channel
/// (the buffer comes from `Tally.toml`), get worked, and the answer goes back in the envelope.
///
/// When the arithmetic goes sideways — an unknown operation, or a reading that refuses to parse —
/// the abacus logs a warning and drops the envelope unsent.  The requester sees the dropped
/// sender as a [`Blunder::Reply`] and leaves the total alone, which is the whole failure policy:
/// a broken calculation never takes the form down with it.
#[derive(Debug, derive_new::new)]
pub struct Abacus {
    desk: mpsc::Receiver<Reckon>,
}

impl Abacus {
    /// Works requests until every sender has hung up.
    #[tracing::instrument(skip_all)]
    pub async fn serve(mut self) -> Upshot<()> {
        while let Some(reckon) = self.desk.recv().await {
            let (op, readings, tx) = reckon.dissolve();
            match Self::work(&op, &readings) {
                Ok(total) => {
                    tracing::trace!("Reckoned {op} at {total}.");
                    if tx.send(total).is_err() {
                        tracing::warn!("Nobody waiting on the total.");
                    }
                }
                Err(e) => tracing::warn!("Could not reckon {op}: {}", e.to_string()),
            }
        }
        tracing::trace!("Abacus packed up.");
        Ok(())
    }

    /// Dispatches an operation by name.
    pub fn work(op: &str, readings: &Readings) -> Upshot<f64> {
        match op {
            "calculate" => Self::shopping(readings),
            other => Err(Blunder::UnknownOp(other.to_string())),
        }
    }

    /// The shopping total: quantity times price, taxed up, discount off.
    fn shopping(readings: &Readings) -> Upshot<f64> {
        let quantity = Self::figure(readings.quantity())?;
        let price = Self::figure(readings.price())?;
        let tax = Self::figure(readings.tax())?;
        let discount = Self::figure(readings.discount())?;
        Ok(quantity * price * (1.0 + tax / 100.0) - discount)
    }

    /// Parses one reading.  The validators should have cleared these already, but the abacus
    /// checks its own inputs rather than trusting the other side of a channel.
    fn figure(raw: &str) -> Upshot<f64> {
        raw.trim()
            .parse()
            .map_err(|_| Blunder::Figure(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings() -> Readings {
        Readings::new("2".into(), "3.00".into(), "10".into(), "1.00".into())
    }

    #[test]
    fn the_shopping_total_adds_up() {
        // 2 * 3.00 = 6.00, plus 10% tax = 6.60, less 1.00 = 5.60.
        let total = Abacus::work("calculate", &readings()).unwrap();
        assert!((total - 5.60).abs() < 1e-9);
    }

    #[test]
    fn unknown_operations_blunder() {
        assert!(Abacus::work("refund", &readings()).is_err());
    }

    #[test]
    fn figures_trim_but_do_not_guess() {
        assert_eq!(Abacus::figure(" 8.25 ").unwrap(), 8.25);
        assert!(Abacus::figure("eight").is_err());
    }

    #[tokio::test]
    async fn the_envelope_comes_back() {
        let (desk_tx, desk_rx) = mpsc::channel(8);
        let hand = tokio::spawn(Abacus::new(desk_rx).serve());

        let (tx, rx) = oneshot::channel();
        desk_tx
            .send(Reckon::new("calculate".to_string(), readings(), tx))
            .await
            .unwrap();
        let total = rx.await.unwrap();
        assert!((total - 5.60).abs() < 1e-9);

        drop(desk_tx);
        assert!(hand.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn a_failed_reckoning_drops_the_envelope() {
        let (desk_tx, desk_rx) = mpsc::channel(8);
        tokio::spawn(Abacus::new(desk_rx).serve());

        let (tx, rx) = oneshot::channel();
        desk_tx
            .send(Reckon::new("refund".to_string(), readings(), tx))
            .await
            .unwrap();
        assert!(rx.await.is_err());
    }
}
