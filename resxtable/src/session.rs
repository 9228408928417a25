//! Fan-out of translation requests to translator backends.
//!
//! Translators run on worker threads and only ever see a shared [`Session`].
//! They hand their results to [`Session::deliver`], which queues them on a
//! channel; the thread that owns the [`TranslationItem`]s drains that queue
//! with [`Session::apply`]. Candidate sets are therefore only written from one
//! thread.

use std::{
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel},
    },
    thread,
    time::Duration,
};

use crate::{
    culture::CultureKey,
    translation::{TranslationItem, TranslationMatch, TranslatorInfo},
};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A translation backend.
pub trait Translator: Send + Sync {
    fn info(&self) -> &TranslatorInfo;

    /// Translates the session's requests, delivering results as they come.
    /// Implementations should check [`Session::is_canceled`] between requests.
    fn translate(&self, session: &Session);
}

/// One source text to translate. `index` points into the item slice the
/// session was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub index: usize,
    pub source: String,
    pub target_culture: CultureKey,
}

#[derive(Debug)]
struct Delivery {
    index: usize,
    matches: Vec<TranslationMatch>,
}

pub struct Session {
    source_culture: CultureKey,
    neutral_resources_culture: CultureKey,
    requests: Vec<TranslationRequest>,
    canceled: AtomicBool,
    messages: Mutex<Vec<String>>,
    sender: Sender<Delivery>,
    receiver: Mutex<Receiver<Delivery>>,
}

impl Session {
    pub fn new(
        source_culture: CultureKey,
        neutral_resources_culture: CultureKey,
        items: &[TranslationItem],
    ) -> Self {
        let requests = items
            .iter()
            .enumerate()
            .map(|(index, item)| TranslationRequest {
                index,
                source: item.source().to_string(),
                target_culture: item.target_culture().clone(),
            })
            .collect();
        let (sender, receiver) = channel();

        Self {
            source_culture,
            neutral_resources_culture,
            requests,
            canceled: AtomicBool::new(false),
            messages: Mutex::new(Vec::new()),
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn source_culture(&self) -> &CultureKey {
        &self.source_culture
    }

    /// The culture the neutral resources are written in.
    pub fn neutral_resources_culture(&self) -> &CultureKey {
        &self.neutral_resources_culture
    }

    pub fn requests(&self) -> &[TranslationRequest] {
        &self.requests
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Records a message for the user, e.g. a backend that could not connect.
    pub fn add_message(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(message = %message, "translation session message");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Queues results for request `index`. Unknown indices are dropped.
    pub fn deliver(&self, index: usize, matches: Vec<TranslationMatch>) {
        if index >= self.requests.len() {
            tracing::warn!(index, "dropping results for unknown translation request");
            return;
        }
        // The receiver lives as long as the session.
        let _ = self.sender.send(Delivery { index, matches });
    }

    /// Appends every queued result to its item. Returns the number of
    /// candidates added.
    pub fn apply(&self, items: &mut [TranslationItem]) -> usize {
        let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        let mut applied = 0;
        loop {
            match receiver.try_recv() {
                Ok(delivery) => applied += apply_delivery(items, delivery),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    fn apply_waiting(&self, items: &mut [TranslationItem]) -> usize {
        let delivery = {
            let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(delivery) => delivery,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return 0,
            }
        };
        apply_delivery(items, delivery) + self.apply(items)
    }

    /// Runs every translator on its own thread and applies results to
    /// `items` as they arrive. Returns the number of candidates added.
    ///
    /// A translator that panics is reported as a session message; the others
    /// keep running.
    pub fn run(&self, translators: &[Box<dyn Translator>], items: &mut [TranslationItem]) -> usize {
        let mut applied = 0;

        thread::scope(|scope| {
            let handles: Vec<_> = translators
                .iter()
                .map(|translator| {
                    let session = self;
                    scope.spawn(move || {
                        if session.is_canceled() {
                            return;
                        }
                        tracing::debug!(
                            translator = %translator.info().id,
                            requests = session.requests.len(),
                            "translator started"
                        );
                        translator.translate(session);
                    })
                })
                .collect();

            while !handles.iter().all(|handle| handle.is_finished()) {
                applied += self.apply_waiting(items);
            }

            for (handle, translator) in handles.into_iter().zip(translators) {
                if handle.join().is_err() {
                    self.add_message(format!(
                        "translator `{}` stopped unexpectedly",
                        translator.info().display_name
                    ));
                }
            }
        });

        applied + self.apply(items)
    }
}

fn apply_delivery(items: &mut [TranslationItem], delivery: Delivery) -> usize {
    match items.get_mut(delivery.index) {
        Some(item) => {
            let count = delivery.matches.len();
            for result in delivery.matches {
                item.add_result(result);
            }
            count
        }
        None => 0,
    }
}

/// Maps a backend score in `0..=max` to a rating in `[0, 1]`.
pub fn rating_from_scale(value: f64, max: f64) -> f64 {
    if max.is_nan() || max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        info: TranslatorInfo,
        rating: f64,
    }

    impl Echo {
        fn boxed(name: &str, rating: f64) -> Box<dyn Translator> {
            Box::new(Self {
                info: TranslatorInfo::new(name.to_lowercase(), name),
                rating,
            })
        }
    }

    impl Translator for Echo {
        fn info(&self) -> &TranslatorInfo {
            &self.info
        }

        fn translate(&self, session: &Session) {
            for request in session.requests() {
                if session.is_canceled() {
                    return;
                }
                let text = format!("{} [{}]", request.source, self.info.display_name);
                session.deliver(
                    request.index,
                    vec![TranslationMatch::new(self.info.clone(), text, self.rating)],
                );
            }
        }
    }

    struct Broken {
        info: TranslatorInfo,
    }

    impl Translator for Broken {
        fn info(&self) -> &TranslatorInfo {
            &self.info
        }

        fn translate(&self, _session: &Session) {
            panic!("backend exploded");
        }
    }

    fn items() -> Vec<TranslationItem> {
        let german = CultureKey::parse("de").unwrap();
        vec![
            TranslationItem::new("Greeting", "Hello", german.clone()),
            TranslationItem::new("Farewell", "Goodbye", german),
        ]
    }

    fn session(items: &[TranslationItem]) -> Session {
        Session::new(CultureKey::parse("en").unwrap(), CultureKey::neutral(), items)
    }

    #[test]
    fn test_requests_mirror_items() {
        let items = items();
        let session = session(&items);
        assert_eq!(session.requests().len(), 2);
        assert_eq!(session.requests()[1].index, 1);
        assert_eq!(session.requests()[1].source, "Goodbye");
        assert_eq!(session.source_culture().tag(), "en");
        assert!(session.neutral_resources_culture().is_neutral());
    }

    #[test]
    fn test_run_applies_all_results() {
        let mut items = items();
        let session = session(&items);
        let translators = vec![Echo::boxed("B", 0.9), Echo::boxed("A", 0.9)];

        let applied = session.run(&translators, &mut items);
        assert_eq!(applied, 4);
        assert_eq!(items[0].results().len(), 2);
        assert_eq!(items[0].translation(), Some("Hello [A]"));
        assert_eq!(items[1].translation(), Some("Goodbye [A]"));
    }

    #[test]
    fn test_deliver_then_apply() {
        let mut items = items();
        let session = session(&items);
        let info = TranslatorInfo::new("manual", "Manual");
        session.deliver(1, vec![TranslationMatch::new(info.clone(), "Tschüss", 1.0)]);
        session.deliver(7, vec![TranslationMatch::new(info, "lost", 1.0)]);

        assert_eq!(session.apply(&mut items), 1);
        assert!(items[0].results().is_empty());
        assert_eq!(items[1].translation(), Some("Tschüss"));
        assert_eq!(session.apply(&mut items), 0);
    }

    #[test]
    fn test_canceled_session_keeps_delivered_results() {
        let mut items = items();
        let session = session(&items);
        let info = TranslatorInfo::new("manual", "Manual");
        session.deliver(0, vec![TranslationMatch::new(info, "Hallo", 0.7)]);
        session.cancel();
        assert!(session.is_canceled());

        let applied = session.run(&[Echo::boxed("A", 1.0)], &mut items);
        assert_eq!(applied, 1);
        assert_eq!(items[0].translation(), Some("Hallo"));
        assert!(items[1].results().is_empty());
    }

    #[test]
    fn test_panicking_translator_is_reported() {
        let mut items = items();
        let session = session(&items);
        let translators: Vec<Box<dyn Translator>> = vec![
            Box::new(Broken {
                info: TranslatorInfo::new("broken", "Broken"),
            }),
            Echo::boxed("A", 0.5),
        ];

        session.run(&translators, &mut items);
        assert_eq!(items[0].translation(), Some("Hello [A]"));
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Broken"));
    }

    #[test]
    fn test_rating_from_scale() {
        assert_eq!(rating_from_scale(5.0, 5.0), 1.0);
        assert_eq!(rating_from_scale(2.5, 5.0), 0.5);
        assert_eq!(rating_from_scale(7.0, 5.0), 1.0);
        assert_eq!(rating_from_scale(1.0, 0.0), 0.0);
        assert_eq!(rating_from_scale(f64::NAN, 5.0), 0.0);
    }
}
