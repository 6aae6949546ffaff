use crate::{Blunder, Field, RawEvent, Upshot};
use tokio::sync::mpsc;

/// The `Verdict` struct is the outcome of checking one field's current value: an ordered list of
/// error messages, where an empty list means the value is in good standing.  We run the NewType
/// pattern over the vector with [`derive_more::Deref`] and [`derive_more::DerefMut`], my
/// favorite way to hang methods on a collection without hiding it.
///
/// There is no "absent" verdict.  A validator may report nothing at all (see [`Audit`]), but the
/// stream normalizes that to [`Verdict::clear`] before anyone downstream sees it, because a
/// channel consumer cannot tell "no errors" apart from "the stream ended" unless we say it out
/// loud.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, derive_more::Deref, derive_more::DerefMut,
)]
pub struct Verdict(Vec<String>);

impl Verdict {
    /// A verdict with nothing to complain about.
    pub fn clear() -> Self {
        Self::default()
    }

    /// A verdict carrying one or more complaints, in the order the validator raised them.
    pub fn faults(msgs: Vec<String>) -> Self {
        Self(msgs)
    }

    /// True when the field is in good standing.
    pub fn is_clear(&self) -> bool {
        self.0.is_empty()
    }

    /// The first complaint, if any.  The label only ever shows the primary error; the rest stay
    /// in the verdict for anyone who wants the full story.
    pub fn headline(&self) -> Option<&str> {
        self.0.first().map(|msg| msg.as_str())
    }
}

impl From<Vec<String>> for Verdict {
    fn from(msgs: Vec<String>) -> Self {
        Self(msgs)
    }
}

/// Absence of a result means the value passed, never that the stream is over.
impl From<Option<Vec<String>>> for Verdict {
    fn from(msgs: Option<Vec<String>>) -> Self {
        msgs.map(Self::faults).unwrap_or_default()
    }
}

/// The `Audit` trait is the seam where a validator plugs in.  An implementation must be a pure
/// function of the field and the raw text: no side effects, no surprises, and above all no
/// panics.  Whatever the shopper types, including nothing at all, the answer is either `None`
/// (the value passed) or `Some` non-empty list of complaints.
pub trait Audit {
    fn audit(&self, field: Field, raw: &str) -> Option<Vec<String>>;
}

/// The `Rules` struct is the house validator for the shopping form.  Quantity must read as a
/// positive whole number; price, tax and discount must each read as a number.  Anything else
/// earns a complaint phrased for the shopper, not for us.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rules;

impl Rules {
    /// Checks the quantity: present, numeric, whole, and at least one.
    fn quantity(raw: &str) -> Vec<String> {
        let title = Field::Quantity.title();
        if raw.is_empty() {
            return vec![format!("{title} can't be empty.")];
        }
        match raw.parse::<i64>() {
            Ok(count) if count < 1 => vec![format!("{title} can't be negative.")],
            Ok(_) => Vec::new(),
            Err(_) => {
                if raw.parse::<f64>().is_ok() {
                    vec![format!("{title} has to be an integer number.")]
                } else {
                    vec![format!("{title} has to be a number.")]
                }
            }
        }
    }

    /// Checks a money-or-rate field: present and numeric.
    fn number(field: Field, raw: &str) -> Vec<String> {
        let title = field.title();
        if raw.is_empty() {
            return vec![format!("{title} can't be empty.")];
        }
        match raw.parse::<f64>() {
            Ok(figure) if figure.is_finite() => Vec::new(),
            _ => vec![format!("{title} has to be a number.")],
        }
    }
}

impl Audit for Rules {
    fn audit(&self, field: Field, raw: &str) -> Option<Vec<String>> {
        let raw = raw.trim();
        let faults = match field {
            Field::Quantity => Self::quantity(raw),
            _ => Self::number(field, raw),
        };
        if faults.is_empty() {
            None
        } else {
            Some(faults)
        }
    }
}

/// The `Auditor` struct turns one field's raw change events into a stream of verdicts.
///
/// The task is a plain loop: receive a [`RawEvent`], run it through the validator, send the
/// [`Verdict`] on.  Each auditor owns its receiving end outright, so verdicts for a field are
/// produced strictly in the order its events fired, one at a time.  When the till is watching the
/// whole form, the auditor also drops a copy of every verdict, tagged with its field, onto the
/// merged ledger that the [`crate::Tallyman`] folds over.  The merge preserves each field's own
/// order and promises nothing about the interleaving across fields, which is all the tallyman
/// needs.
///
/// The loop ends when the page closes its feeds and the raw stream drains, at which point the
/// auditor drops its senders and its own consumers wind down in turn.  Teardown rides the
/// channels the same way the data did.
#[derive(Debug, derive_new::new)]
pub struct Auditor<A: Audit> {
    field: Field,
    rules: A,
    raw: mpsc::UnboundedReceiver<RawEvent>,
    verdicts: mpsc::UnboundedSender<Verdict>,
    ledger: Option<mpsc::UnboundedSender<(Field, Verdict)>>,
}

impl<A: Audit> Auditor<A> {
    /// Consumes raw events until the underlying registration closes.
    #[tracing::instrument(skip_all)]
    pub async fn examine(mut self) -> Upshot<()> {
        while let Some(event) = self.raw.recv().await {
            let verdict = Verdict::from(self.rules.audit(self.field, event.value()));
            tracing::trace!(
                "{}: '{}' earned {} complaint(s).",
                self.field,
                event.value(),
                verdict.len()
            );
            if let Some(ledger) = &self.ledger {
                ledger
                    .send((self.field, verdict.clone()))
                    .map_err(|_| Blunder::DeadLetter)?;
            }
            self.verdicts
                .send(verdict)
                .map_err(|_| Blunder::DeadLetter)?;
        }
        tracing::trace!("{} auditor off the clock.", self.field);
        Ok(())
    }
}
