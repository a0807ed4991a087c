//! Speech playback as an injected capability.
//!
//! [`SpeechEngine`] is the platform seam (`speak`, `cancel`, `voices`).
//! [`SpeechController`] layers the playback rules on top: toggling stops
//! rather than overlapping, completion or failure resets the speaking
//! flag, and teardown cancels whatever is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

/// A voice offered by the platform, tagged with a BCP 47 language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Engine-assigned identifier of one utterance.
pub type SpeechHandle = u64;

/// How an utterance ended on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEnd {
    Finished,
    Failed(String),
}

/// Invoked once when an utterance ends naturally or fails.
pub type OnSpeechEnd = Box<dyn FnOnce(SpeechEnd) + Send + 'static>;

pub trait SpeechEngine: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    /// Start speaking `text`. `voice` of `None` means the platform default.
    fn speak(
        &self,
        text: &str,
        lang: &str,
        voice: Option<&Voice>,
        on_end: OnSpeechEnd,
    ) -> Result<SpeechHandle>;

    /// Stop an utterance. Unknown or finished handles are ignored.
    fn cancel(&self, handle: SpeechHandle);
}

/// Target language plus related languages to fall back on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreference {
    pub language: String,
    pub fallbacks: Vec<String>,
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self {
            language: "ne-NP".to_string(),
            fallbacks: vec!["hi".to_string()],
        }
    }
}

fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn same_tag(a: &str, b: &str) -> bool {
    a.replace('_', "-").eq_ignore_ascii_case(&b.replace('_', "-"))
}

/// Pick a voice for `pref`: one tagged with the target language, else one
/// tagged with a fallback language (in order), else `None` for the
/// platform default.
///
/// For each language an exact tag match beats a voice that only shares
/// the primary subtag (`ne-NP` over `ne-IN`).
pub fn select_voice<'a>(voices: &'a [Voice], pref: &LanguagePreference) -> Option<&'a Voice> {
    std::iter::once(&pref.language)
        .chain(pref.fallbacks.iter())
        .find_map(|lang| {
            voices.iter().find(|v| same_tag(&v.lang, lang)).or_else(|| {
                let wanted = primary_subtag(lang);
                voices.iter().find(|v| primary_subtag(&v.lang) == wanted)
            })
        })
}

/// Result of [`SpeechController::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechToggle {
    Started,
    Stopped,
    NothingToSay,
    Unavailable,
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
struct Playback {
    token: u64,
    handle: Option<SpeechHandle>,
}

pub struct SpeechController {
    engine: Option<Arc<dyn SpeechEngine>>,
    preference: LanguagePreference,
    active: Arc<Mutex<Option<Playback>>>,
    next_token: AtomicU64,
}

impl SpeechController {
    pub fn new(engine: Option<Arc<dyn SpeechEngine>>, preference: LanguagePreference) -> Self {
        Self {
            engine,
            preference,
            active: Arc::new(Mutex::new(None)),
            next_token: AtomicU64::new(1),
        }
    }

    /// A controller with no speech capability.
    pub fn unavailable() -> Self {
        Self::new(None, LanguagePreference::default())
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.active.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    /// Stop playback if active, otherwise start speaking `text`.
    pub fn toggle(&self, text: Option<&str>) -> SpeechToggle {
        if self.stop() {
            return SpeechToggle::Stopped;
        }
        let Some(engine) = &self.engine else {
            return SpeechToggle::Unavailable;
        };
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return SpeechToggle::NothingToSay;
        };

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut active) = self.active.lock() {
            *active = Some(Playback {
                token,
                handle: None,
            });
        }

        let voices = engine.voices();
        let voice = select_voice(&voices, &self.preference);
        debug!(voice = ?voice.map(|v| &v.name), lang = %self.preference.language, "starting speech");

        let slot = Arc::clone(&self.active);
        let on_end: OnSpeechEnd = Box::new(move |end| {
            if let SpeechEnd::Failed(reason) = &end {
                warn!(%reason, "speech playback failed");
            }
            if let Ok(mut active) = slot.lock() {
                if active.is_some_and(|p| p.token == token) {
                    *active = None;
                }
            }
        });

        match engine.speak(text, &self.preference.language, voice, on_end) {
            Ok(handle) => {
                let claimed = match self.active.lock() {
                    Ok(mut active) => match active.as_mut().filter(|p| p.token == token) {
                        Some(p) => {
                            p.handle = Some(handle);
                            true
                        }
                        None => false,
                    },
                    Err(_) => false,
                };
                if claimed {
                    SpeechToggle::Started
                } else {
                    // Stopped (or finished) while the engine was starting up.
                    engine.cancel(handle);
                    debug!(handle, "speech stopped before it was registered");
                    SpeechToggle::Stopped
                }
            }
            Err(e) => {
                if let Ok(mut active) = self.active.lock() {
                    if active.is_some_and(|p| p.token == token) {
                        *active = None;
                    }
                }
                warn!(error = %e, "speech engine refused utterance");
                SpeechToggle::Failed(e.to_string())
            }
        }
    }

    /// Cancel any active playback. Returns whether something was playing.
    pub fn stop(&self) -> bool {
        let taken = self.active.lock().ok().and_then(|mut a| a.take());
        match taken {
            Some(playback) => {
                if let (Some(engine), Some(handle)) = (&self.engine, playback.handle) {
                    engine.cancel(handle);
                }
                true
            }
            None => false,
        }
    }
}

/// A [`SpeechEngine`] that records requests instead of producing audio.
///
/// Utterances stay "playing" until [`finish`](RecordingSpeech::finish) or
/// [`fail`](RecordingSpeech::fail) fires their completion callback.
#[derive(Default)]
pub struct RecordingSpeech {
    voices: Vec<Voice>,
    inner: Mutex<RecordingState>,
}

#[derive(Default)]
struct RecordingState {
    next: SpeechHandle,
    spoken: Vec<SpokenUtterance>,
    cancelled: Vec<SpeechHandle>,
    pending: Vec<(SpeechHandle, OnSpeechEnd)>,
}

/// One call to [`SpeechEngine::speak`] as seen by [`RecordingSpeech`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenUtterance {
    pub handle: SpeechHandle,
    pub text: String,
    pub lang: String,
    pub voice: Option<String>,
}

impl RecordingSpeech {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            inner: Mutex::new(RecordingState::default()),
        }
    }

    pub fn spoken(&self) -> Vec<SpokenUtterance> {
        self.inner
            .lock()
            .map(|s| s.spoken.clone())
            .unwrap_or_default()
    }

    pub fn cancelled(&self) -> Vec<SpeechHandle> {
        self.inner
            .lock()
            .map(|s| s.cancelled.clone())
            .unwrap_or_default()
    }

    /// Complete `handle` naturally.
    pub fn finish(&self, handle: SpeechHandle) {
        self.end(handle, SpeechEnd::Finished);
    }

    pub fn fail(&self, handle: SpeechHandle, reason: &str) {
        self.end(handle, SpeechEnd::Failed(reason.to_string()));
    }

    fn end(&self, handle: SpeechHandle, how: SpeechEnd) {
        let callback = self.inner.lock().ok().and_then(|mut s| {
            let pos = s.pending.iter().position(|(h, _)| *h == handle)?;
            Some(s.pending.remove(pos).1)
        });
        if let Some(cb) = callback {
            cb(how);
        }
    }
}

impl SpeechEngine for RecordingSpeech {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(
        &self,
        text: &str,
        lang: &str,
        voice: Option<&Voice>,
        on_end: OnSpeechEnd,
    ) -> Result<SpeechHandle> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("recording speech lock poisoned"))?;
        state.next += 1;
        let handle = state.next;
        state.spoken.push(SpokenUtterance {
            handle,
            text: text.to_string(),
            lang: lang.to_string(),
            voice: voice.map(|v| v.name.clone()),
        });
        state.pending.push((handle, on_end));
        Ok(handle)
    }

    fn cancel(&self, handle: SpeechHandle) {
        if let Ok(mut state) = self.inner.lock() {
            state.cancelled.push(handle);
            state.pending.retain(|(h, _)| *h != handle);
        }
    }
}
