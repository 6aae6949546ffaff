use crate::{Field, Page, Upshot, Verdict};
use tokio::sync::mpsc;

/// The `Signpost` struct keeps one field's label honest.  It owns the label's visual state
/// outright: nothing else on the page writes to that label, so there is nothing to coordinate
/// with and nothing to lock.  Verdicts for the field arrive on a channel and are handled one at a
/// time, in the order the underlying change events fired.
///
/// On a clear verdict the label goes back to its original title with no badge; on a dirty one it
/// shows the first complaint and wears the badge class.  Repainting is a plain overwrite of both
/// attributes, so feeding the same verdict twice leaves the label exactly where it was — no
/// flicker, no toggling.
///
/// The original title is captured once, in [`Signpost::post`], before the signpost has consumed a
/// single event.  Capture it any later and a complaint that has already landed on the label would
/// be remembered as the "original" title, which is the kind of bug you only find on a Friday.
/// Wiring order matters here: post the signpost before anything can fire.
#[derive(Debug)]
pub struct Signpost {
    field: Field,
    page: Page,
    title: String,
    badge: String,
    verdicts: mpsc::UnboundedReceiver<Verdict>,
}

impl Signpost {
    /// Creates a signpost for `field`, capturing the label's current text as the title to restore
    /// on clear verdicts.  The `badge` argument names the class applied while the field is in
    /// error, read from `Tally.toml` by the till.
    ///
    /// Will [`crate::Blunder::MissingElem`] if the label is not on the page, which surfaces a
    /// mislaid form at wiring time.
    #[tracing::instrument(skip_all)]
    pub fn post(
        field: Field,
        page: Page,
        badge: String,
        verdicts: mpsc::UnboundedReceiver<Verdict>,
    ) -> Upshot<Self> {
        let title = page.text(&field.label_id())?;
        tracing::trace!("Signpost for {field} captured title '{title}'.");
        Ok(Self {
            field,
            page,
            title,
            badge,
            verdicts,
        })
    }

    /// Consumes verdicts until the stream ends, repainting the label after each one.
    #[tracing::instrument(skip_all)]
    pub async fn watch(mut self) -> Upshot<()> {
        while let Some(verdict) = self.verdicts.recv().await {
            self.repaint(&verdict)?;
        }
        tracing::trace!("{} signpost taken down.", self.field);
        Ok(())
    }

    /// Applies one verdict to the label.
    pub fn repaint(&self, verdict: &Verdict) -> Upshot<()> {
        let label = self.field.label_id();
        if let Some(complaint) = verdict.headline() {
            self.page.set_class(&label, &self.badge)?;
            self.page.set_text(&label, complaint)?;
            tracing::trace!("{}: '{complaint}'", self.field);
        } else {
            self.page.drop_class(&label)?;
            self.page.set_text(&label, &self.title)?;
            tracing::trace!("{} back in good standing.", self.field);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront;

    fn posted(field: Field) -> (Signpost, mpsc::UnboundedSender<Verdict>, Page) {
        let page = storefront();
        let (tx, rx) = mpsc::unbounded_channel();
        let signpost = Signpost::post(field, page.clone(), "error".to_string(), rx).unwrap();
        (signpost, tx, page)
    }

    #[test]
    fn a_dirty_verdict_shows_only_the_first_complaint() {
        let (signpost, _tx, page) = posted(Field::Quantity);
        let verdict = Verdict::faults(vec![
            "Quantity has to be a number.".to_string(),
            "Quantity can't be negative.".to_string(),
        ]);
        signpost.repaint(&verdict).unwrap();
        let label = Field::Quantity.label_id();
        assert_eq!(page.text(&label).unwrap(), "Quantity has to be a number.");
        assert_eq!(page.class(&label).unwrap(), Some("error".to_string()));
    }

    #[test]
    fn a_clear_verdict_restores_the_captured_title() {
        let (signpost, _tx, page) = posted(Field::Price);
        let label = Field::Price.label_id();
        signpost
            .repaint(&Verdict::faults(vec!["Price has to be a number.".to_string()]))
            .unwrap();
        signpost.repaint(&Verdict::clear()).unwrap();
        assert_eq!(page.text(&label).unwrap(), "Price");
        assert_eq!(page.class(&label).unwrap(), None);
    }

    #[test]
    fn repainting_the_same_verdict_changes_nothing() {
        let (signpost, _tx, page) = posted(Field::Tax);
        let label = Field::Tax.label_id();
        let verdict = Verdict::faults(vec!["Tax (%) has to be a number.".to_string()]);
        signpost.repaint(&verdict).unwrap();
        let text = page.text(&label).unwrap();
        let class = page.class(&label).unwrap();
        signpost.repaint(&verdict).unwrap();
        assert_eq!(page.text(&label).unwrap(), text);
        assert_eq!(page.class(&label).unwrap(), class);
        // Same story for clear verdicts.
        signpost.repaint(&Verdict::clear()).unwrap();
        signpost.repaint(&Verdict::clear()).unwrap();
        assert_eq!(page.text(&label).unwrap(), "Tax (%)");
        assert_eq!(page.class(&label).unwrap(), None);
    }

    #[tokio::test]
    async fn watch_handles_verdicts_in_order_until_the_stream_ends() {
        let (signpost, tx, page) = posted(Field::Discount);
        let label = Field::Discount.label_id();
        tx.send(Verdict::faults(vec![
            "Discount has to be a number.".to_string()
        ]))
        .unwrap();
        tx.send(Verdict::clear()).unwrap();
        drop(tx);
        signpost.watch().await.unwrap();
        // The last verdict wins: the label ends restored.
        assert_eq!(page.text(&label).unwrap(), "Discount");
        assert_eq!(page.class(&label).unwrap(), None);
    }
}
