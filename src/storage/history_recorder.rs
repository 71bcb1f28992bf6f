use log::{debug, error};
use std::cell::RefCell;
use std::rc::Rc;

use super::game_storage::GameStorage;
use super::store::KeyValueStore;
use crate::destroyable::Destroyable;
use crate::events::{EventHandler, EventObserver, Unsubscriber};
use crate::model::RoundEvent;

/// Appends every finished round or session to storage as it is announced.
pub struct HistoryRecorder<S: KeyValueStore> {
    storage: Rc<RefCell<GameStorage<S>>>,
    saved: usize,
    failed: usize,
    subscription: Option<Unsubscriber<RoundEvent>>,
}

impl<S: KeyValueStore> Destroyable for HistoryRecorder<S> {
    fn destroy(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl<S: KeyValueStore + 'static> HistoryRecorder<S> {
    pub fn new(
        storage: Rc<RefCell<GameStorage<S>>>,
        round_event_observer: EventObserver<RoundEvent>,
    ) -> Rc<RefCell<Self>> {
        let recorder = Rc::new(RefCell::new(Self {
            storage,
            saved: 0,
            failed: 0,
            subscription: None,
        }));
        HistoryRecorder::bind_observer(Rc::clone(&recorder), round_event_observer);
        recorder
    }

    fn bind_observer(
        recorder: Rc<RefCell<Self>>,
        round_event_observer: EventObserver<RoundEvent>,
    ) {
        let subscription = {
            let recorder = recorder.clone();
            round_event_observer.subscribe(move |event| {
                recorder.borrow_mut().handle_event(event);
            })
        };
        recorder.borrow_mut().subscription = Some(subscription);
    }
}

impl<S: KeyValueStore> HistoryRecorder<S> {
    pub fn saved(&self) -> usize {
        self.saved
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    fn tally(&mut self, ok: bool) {
        if ok {
            self.saved += 1;
        } else {
            self.failed += 1;
            error!(target: "storage", "Finished game was not recorded");
        }
    }
}

impl<S: KeyValueStore> EventHandler<RoundEvent> for HistoryRecorder<S> {
    fn handle_event(&mut self, event: &RoundEvent) {
        match event {
            RoundEvent::ArithmeticFinished(record) => {
                let ok = self.storage.borrow_mut().save_game_result(record.clone());
                self.tally(ok);
            }
            RoundEvent::CompositionFinished(record) => {
                let ok = self.storage.borrow_mut().save_composition_game(record.clone());
                self.tally(ok);
            }
            RoundEvent::Abandoned => {
                debug!(target: "storage", "Abandoned round, nothing to record");
            }
            _ => {}
        }
    }
}
