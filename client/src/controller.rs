use std::rc::Rc;

use routesketch_shared::{FeatureCollection, FeatureId};

use crate::highlight::HighlightTracker;
use crate::listeners::{Lifetime, ListenerHandle, PointerListeners};
use crate::map_view::{MapView, PointerEvent, PointerKind};
use crate::persistence::serialize_features;
use crate::state::{AppState, HIGHLIGHT_LAYER, ROUTE_LAYER, ROUTE_SOURCE};
use crate::strategy::{strategy_for, DrawingStrategy, NewFeatureOptions};
use crate::util::IdSource;

const MAX_ID_ATTEMPTS: usize = 8;

pub struct ArmedSession {
    strategy: Box<dyn DrawingStrategy>,
    snap_target: Option<FeatureId>,
}

pub struct DrawingSession {
    strategy: Box<dyn DrawingStrategy>,
    feature: FeatureId,
    _listeners: Vec<ListenerHandle>,
}

pub enum SessionPhase {
    Idle,
    Armed(ArmedSession),
    Active(DrawingSession),
}

pub struct DrawingController {
    state: Rc<AppState>,
    map: Option<Rc<dyn MapView>>,
    ids: Box<dyn IdSource>,
    highlight: HighlightTracker,
    listeners: PointerListeners,
    route_source: String,
    phase: SessionPhase,
}

impl DrawingController {
    pub fn new(state: Rc<AppState>, ids: Box<dyn IdSource>) -> Self {
        Self {
            state,
            map: None,
            ids,
            highlight: HighlightTracker::new(ROUTE_LAYER, HIGHLIGHT_LAYER),
            listeners: PointerListeners::new(),
            route_source: ROUTE_SOURCE.to_string(),
            phase: SessionPhase::Idle,
        }
    }

    pub fn attach_map(&mut self, map: Rc<dyn MapView>) {
        self.finish();
        self.map = Some(map);
        self.refresh_source();
    }

    pub fn state(&self) -> &Rc<AppState> {
        &self.state
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Active(_))
    }

    pub fn active_feature(&self) -> Option<&FeatureId> {
        match &self.phase {
            SessionPhase::Active(session) => Some(&session.feature),
            SessionPhase::Idle | SessionPhase::Armed(_) => None,
        }
    }

    pub fn listeners(&self) -> &PointerListeners {
        &self.listeners
    }

    pub fn handle_pointer(&mut self, kind: PointerKind, event: &PointerEvent) {
        match kind {
            PointerKind::Down => self.on_pointer_down(event),
            PointerKind::Move => {
                if let Some(map) = self.map.clone() {
                    self.highlight.on_pointer_move(map.as_ref(), &self.state, event.screen);
                }
                if self.listeners.dispatch(PointerKind::Move) {
                    self.on_pointer_move(event);
                }
            }
            PointerKind::Up | PointerKind::Leave => {
                if self.listeners.dispatch(kind) {
                    self.finish();
                }
            }
        }
    }

    fn on_pointer_down(&mut self, event: &PointerEvent) {
        let Some(map) = self.map.clone() else {
            return;
        };
        if !event.is_primary_only() || !matches!(self.phase, SessionPhase::Idle) {
            return;
        }
        let mode = self.state.draw_mode.get();
        if !mode.requires_drawing() {
            return;
        }
        let Some(strategy) = strategy_for(mode) else {
            log::debug!("no drawing strategy for {} mode", mode.as_str());
            return;
        };
        let snap_target = self.highlight.resolve(&self.state).filter(|id| {
            self.state.features.with(|features| {
                features
                    .get(id)
                    .is_some_and(|feature| strategy.can_append(feature))
            })
        });
        self.phase = SessionPhase::Armed(ArmedSession {
            strategy,
            snap_target,
        });
        self.activate(map.as_ref(), event);
    }

    fn activate(&mut self, map: &dyn MapView, event: &PointerEvent) {
        let SessionPhase::Armed(armed) = std::mem::replace(&mut self.phase, SessionPhase::Idle)
        else {
            return;
        };
        let ArmedSession {
            strategy,
            snap_target,
        } = armed;

        let feature = match snap_target {
            Some(target) => {
                let extended = self.state.features.try_update(|features| {
                    let feature = features.get_mut(&target)?;
                    strategy.start_append(map, event, feature);
                    Some(())
                });
                if extended.is_none() {
                    log::debug!("append target {target} vanished before the press");
                    return;
                }
                log::debug!("extending feature {target}");
                target
            }
            None => {
                if !event.lng_lat.is_finite() {
                    return;
                }
                let Some(id) = self.fresh_id() else {
                    log::warn!("could not find an unused feature id");
                    return;
                };
                let feature = strategy.create_new_feature(NewFeatureOptions {
                    id: id.clone(),
                    start: event.lng_lat,
                    appearance: self.state.current_appearance(),
                });
                self.state.features.update(|features| features.push(feature));
                log::debug!("started feature {id}");
                id
            }
        };

        self.highlight.clear(map, &self.state);
        self.state.is_drawing.set(true);
        let listeners = vec![
            self.listeners.listen(PointerKind::Move, Lifetime::Persistent),
            self.listeners.listen(PointerKind::Up, Lifetime::Once),
            self.listeners.listen(PointerKind::Leave, Lifetime::Once),
        ];
        self.phase = SessionPhase::Active(DrawingSession {
            strategy,
            feature,
            _listeners: listeners,
        });
        self.refresh_source();
    }

    fn on_pointer_move(&mut self, event: &PointerEvent) {
        let Some(map) = self.map.clone() else {
            return;
        };
        let SessionPhase::Active(session) = &self.phase else {
            return;
        };
        let outcome = self.state.features.try_update(|features| {
            let feature = features.get_mut(&session.feature)?;
            let result = session.strategy.draw(map.as_ref(), event, feature);
            (result.has_coordinates || result.is_finished).then_some(result)
        });
        let Some(result) = outcome else {
            if !self.state.features.with(|features| features.contains(&session.feature)) {
                self.finish();
            }
            return;
        };
        if result.has_coordinates {
            self.refresh_source();
        }
        if result.is_finished {
            self.finish();
        }
    }

    pub fn finish(&mut self) {
        let previous = std::mem::replace(&mut self.phase, SessionPhase::Idle);
        if let SessionPhase::Active(session) = previous {
            log::debug!("finished feature {}", session.feature);
            drop(session);
            self.state.is_drawing.set(false);
        }
    }

    pub fn undo_last_feature(&mut self) {
        let Some(map) = self.map.clone() else {
            return;
        };
        if self.state.features.with(FeatureCollection::is_empty) {
            return;
        }
        self.finish();
        let Some(removed) = self.state.features.update(FeatureCollection::pop) else {
            return;
        };
        log::debug!("undo removed feature {}", removed.id);
        if self.state.highlight.with(|current| current.as_ref() == Some(&removed.id)) {
            self.highlight.clear(map.as_ref(), &self.state);
        }
        self.refresh_source();
    }

    pub fn load_features(&mut self, features: FeatureCollection) {
        self.finish();
        self.state.features.set(features);
        if let Some(map) = self.map.clone() {
            self.highlight.clear(map.as_ref(), &self.state);
        }
        self.refresh_source();
    }

    pub fn serialize_features(&self) -> serde_json::Result<String> {
        self.state.features.with(serialize_features)
    }

    pub fn refresh_source(&self) -> bool {
        let Some(map) = &self.map else {
            return false;
        };
        let written = self
            .state
            .features
            .with(|features| map.set_source_data(&self.route_source, features));
        if !written {
            log::debug!("source {} is not available", self.route_source);
        }
        written
    }

    fn fresh_id(&mut self) -> Option<FeatureId> {
        (0..MAX_ID_ATTEMPTS)
            .map(|_| self.ids.next_id())
            .find(|id| !self.state.features.with(|features| features.contains(id)))
    }
}
