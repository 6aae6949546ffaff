use crate::{Blunder, Field, Readings, Upshot, TOTAL};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

/// The `page` module provides the [`Page`] struct, an in-memory stand-in for the document a real
/// form would live in.
///
/// # Standing in for the document
///
/// In the browser, the environment hands you element lookup, event listeners, and mutable value,
/// text and class attributes.  We are not in the browser, so the `Page` provides the same surface
/// from a [`BTreeMap`] behind an [`Arc<RwLock>`].  Everything interesting in this crate consumes
/// the `Page` through this surface, which means the dataflow can be exercised end to end from a
/// test without ever rendering anything.
///
/// The lock is the plain [`std::sync::RwLock`], not the tokio one, because no caller holds it
/// across an await point.  Readers and writers take it for the duration of a single method call
/// and let go.
///
/// # Events as streams
///
/// The [`Page::listen`] method is the bridge from callback-land to channel-land.  Where the
/// browser would invoke a closure on every change event, the page pushes a [`RawEvent`] onto an
/// unbounded [`mpsc`] channel and hands you the receiving end.  Unbounded is a deliberate choice:
/// the producer is the user's keyboard, it must never block, and the consumers keep up easily.
/// Each channel preserves the order events fired in, which is the only ordering promise this
/// crate makes.
///
/// A registration used to live forever, which is fine for a page and a leak for anything
/// longer-lived.  The [`Page::close`] method ends every registration at once: the senders drop,
/// each stream drains whatever is already queued, and every consumer task finishes on its own.
#[derive(Debug, Default, Clone)]
pub struct Page {
    chart: Arc<RwLock<Chart>>,
}

/// The guts of a [`Page`]: the elements by id, and the live event feeds by (element id, kind).
#[derive(Debug, Default)]
struct Chart {
    elems: BTreeMap<String, Elem>,
    feeds: BTreeMap<(String, EventKind), Vec<mpsc::UnboundedSender<RawEvent>>>,
}

impl Page {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an element, replacing any previous element with the same id.
    #[tracing::instrument(skip_all)]
    pub fn post(&self, elem: Elem) {
        let mut chart = self.chart.write().expect("poisoned lock");
        tracing::trace!("Posting element '{}'.", elem.id());
        chart.elems.insert(elem.id().clone(), elem);
    }

    /// Removes an element from the page, along with any event feeds registered on it.  Dropping
    /// the feeds ends the corresponding streams once they drain.
    #[tracing::instrument(skip_all)]
    pub fn strike(&self, id: &str) -> Upshot<Elem> {
        let mut chart = self.chart.write().expect("poisoned lock");
        let elem = chart
            .elems
            .remove(id)
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))?;
        chart.feeds.retain(|(elem_id, _), _| elem_id.as_str() != id);
        tracing::trace!("Struck element '{id}'.");
        Ok(elem)
    }

    /// Reads the current value of an element.
    pub fn value(&self, id: &str) -> Upshot<String> {
        let chart = self.chart.read().expect("poisoned lock");
        chart
            .elems
            .get(id)
            .map(|elem| elem.value().clone())
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))
    }

    /// Writes the value of an element.
    pub fn set_value(&self, id: &str, value: &str) -> Upshot<()> {
        let mut chart = self.chart.write().expect("poisoned lock");
        let elem = chart
            .elems
            .get_mut(id)
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))?;
        elem.value = value.to_string();
        Ok(())
    }

    /// Reads the text of an element.  For labels, this is what the user sees.
    pub fn text(&self, id: &str) -> Upshot<String> {
        let chart = self.chart.read().expect("poisoned lock");
        chart
            .elems
            .get(id)
            .map(|elem| elem.text().clone())
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))
    }

    /// Writes the text of an element.
    pub fn set_text(&self, id: &str, text: &str) -> Upshot<()> {
        let mut chart = self.chart.write().expect("poisoned lock");
        let elem = chart
            .elems
            .get_mut(id)
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))?;
        elem.text = text.to_string();
        Ok(())
    }

    /// Reads the class of an element, if one is set.
    pub fn class(&self, id: &str) -> Upshot<Option<String>> {
        let chart = self.chart.read().expect("poisoned lock");
        chart
            .elems
            .get(id)
            .map(|elem| elem.class().clone())
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))
    }

    /// Sets the class of an element.
    pub fn set_class(&self, id: &str, class: &str) -> Upshot<()> {
        let mut chart = self.chart.write().expect("poisoned lock");
        let elem = chart
            .elems
            .get_mut(id)
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))?;
        elem.class = Some(class.to_string());
        Ok(())
    }

    /// Removes the class of an element.
    pub fn drop_class(&self, id: &str) -> Upshot<()> {
        let mut chart = self.chart.write().expect("poisoned lock");
        let elem = chart
            .elems
            .get_mut(id)
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))?;
        elem.class = None;
        Ok(())
    }

    /// Registers a listener for events of `kind` on the element `id`, returning the receiving end
    /// of a fresh unbounded channel.  Returns immediately; the stream stays live until
    /// [`Page::close`] or [`Page::strike`] drops the sending end.
    ///
    /// Will [`Blunder::MissingElem`] if no such element exists, which is how the wiring in
    /// [`crate::Till::open`] validates the field set once at startup instead of discovering a
    /// typo three events in.
    #[tracing::instrument(skip_all)]
    pub fn listen(&self, id: &str, kind: EventKind) -> Upshot<mpsc::UnboundedReceiver<RawEvent>> {
        let mut chart = self.chart.write().expect("poisoned lock");
        if !chart.elems.contains_key(id) {
            return Err(Blunder::MissingElem(id.to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        chart
            .feeds
            .entry((id.to_string(), kind))
            .or_default()
            .push(tx);
        tracing::trace!("Listening for {kind} on '{id}'.");
        Ok(rx)
    }

    /// Fires an event: sets the element's value to `value`, then pushes a [`RawEvent`] carrying
    /// that value to every listener registered for (`id`, `kind`).  Listeners whose receiving end
    /// has gone away are pruned as we go.
    #[tracing::instrument(skip_all)]
    pub fn fire(&self, id: &str, kind: EventKind, value: &str) -> Upshot<()> {
        let mut chart = self.chart.write().expect("poisoned lock");
        let elem = chart
            .elems
            .get_mut(id)
            .ok_or_else(|| Blunder::MissingElem(id.to_string()))?;
        elem.value = value.to_string();
        tracing::trace!("Firing {kind} on '{id}' with value '{value}'.");
        if let Some(feed) = chart.feeds.get_mut(&(id.to_string(), kind)) {
            feed.retain(|tx| tx.send(RawEvent::new(value.to_string())).is_ok());
        }
        Ok(())
    }

    /// Drops every event feed on the page.  Each stream drains what was already queued and then
    /// ends, letting the consumer tasks finish.  The elements themselves stay put, so the final
    /// state of labels and the total can still be read afterwards.
    #[tracing::instrument(skip_all)]
    pub fn close(&self) {
        let mut chart = self.chart.write().expect("poisoned lock");
        chart.feeds.clear();
        tracing::trace!("Page feeds closed.");
    }

    /// Snapshots the current values of the four shopping fields into a [`Readings`].
    pub fn readings(&self) -> Upshot<Readings> {
        Ok(Readings::new(
            self.value(&Field::Quantity.input_id())?,
            self.value(&Field::Price.input_id())?,
            self.value(&Field::Tax.input_id())?,
            self.value(&Field::Discount.input_id())?,
        ))
    }
}

/// Builds the shopping form: an input and a label for each [`Field`], plus the total display.
/// The inputs start valid so the form begins in good standing, and the labels carry their title
/// text, which the signposts capture before any event can fire.
pub fn storefront() -> Page {
    let page = Page::new();
    for field in Field::iter() {
        let start = match field {
            Field::Quantity => "1",
            _ => "0.00",
        };
        page.post(Elem::default().with_id(field.input_id()).with_value(start));
        page.post(
            Elem::default()
                .with_id(field.label_id())
                .with_text(field.title()),
        );
    }
    page.post(Elem::default().with_id(TOTAL).with_value("0.00"));
    page
}

/// The kinds of event an element can emit.  The form only cares about change events, but the
/// registration key is an enum rather than a bare bool so the next kind has somewhere to go.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Change,
}

/// The `RawEvent` struct is the record a change event leaves behind: the element's textual value
/// at the moment it fired.  Produced by [`Page::fire`], consumed exactly once by whichever
/// [`crate::Auditor`] holds the receiving end.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, derive_getters::Getters)]
pub struct RawEvent {
    value: String,
}

/// The `Elem` struct is one element on the [`Page`].
///
/// * The `id` field is the lookup key.
/// * The `value` field is what an input holds, or a total displays.
/// * The `text` field is what a label shows.
/// * The `class` field is the single styling hook; the error badge goes here.
///
/// The setters consume and return `self` so a page can be laid out as a chain of
/// `Elem::default().with_id(..).with_value(..)` calls, which reads better than a four-argument
/// constructor full of empty strings.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    derive_new::new,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_", into, strip_option)]
pub struct Elem {
    id: String,
    value: String,
    text: String,
    class: Option<String>,
}
