use crate::{EventKind, Field, Page, Upshot};
use std::time::Duration;
use std::{fs, path};
use tokio::time;

/// The `Cue` struct is one line of a demo script: which field changes, and to what.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    derive_new::new,
    derive_getters::Getters,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub struct Cue {
    field: Field,
    value: String,
}

/// The `Script` struct is a wrapper around a vector of type [`Cue`], deref'd through
/// [`derive_more::Deref`] so it reads like the vector it is.  The purpose of a script is to
/// replay a shopper's keystrokes against the page: the demo binary reads one from
/// `data/script.csv`, and anything that wants a canned session can build one by hand.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    derive_more::Deref,
    derive_more::DerefMut,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Script(Vec<Cue>);

impl Script {
    /// Attempts to read cues from a csv file located at `path`.  We open the file with
    /// [`fs::File::open`] and hand it to [`csv::Reader::from_reader`], deserializing each row
    /// into a [`Cue`].  A row that will not parse gets a warning and is skipped; a shaky line in
    /// a demo script is no reason to bring the show down.
    #[tracing::instrument(skip_all)]
    pub fn from_path(path: path::PathBuf) -> Upshot<Self> {
        let file = fs::File::open(path)?;
        let mut cues = Vec::new();
        let mut rdr = csv::Reader::from_reader(file);
        for result in rdr.deserialize() {
            match result {
                Ok(cue) => cues.push(cue),
                Err(e) => {
                    tracing::warn!("Skipping a shaky cue: {}", e.to_string());
                }
            }
        }
        tracing::trace!("Script holds {} cue(s).", cues.len());
        Ok(Self(cues))
    }

    /// A built-in script for when there is no csv to read: the shopper fumbles the quantity,
    /// corrects it, and then fills in the rest of the form.
    pub fn rehearsal() -> Self {
        Self(vec![
            Cue::new(Field::Quantity, "three".to_string()),
            Cue::new(Field::Quantity, "3".to_string()),
            Cue::new(Field::Price, "12.50".to_string()),
            Cue::new(Field::Tax, "8.25".to_string()),
            Cue::new(Field::Discount, "2.00".to_string()),
        ])
    }

    /// Fires each cue as a change event on the page, with a short beat between cues so the trace
    /// log reads in order at a human pace.  The pause is theater, not synchronization; the
    /// dataflow does not need it.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, page: &Page) -> Upshot<()> {
        for cue in self.iter() {
            page.fire(&cue.field().input_id(), EventKind::Change, cue.value())?;
            time::sleep(Duration::from_millis(25)).await;
        }
        Ok(())
    }
}
