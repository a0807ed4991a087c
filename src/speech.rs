//! Native speech engine that shells out to a text-to-speech program.
//!
//! Each utterance runs one child process (e.g. `espeak-ng -v ne <text>`).
//! Cancelling kills the child; natural exit reports through the
//! completion callback. Requires a running tokio runtime.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tokio::sync::oneshot;
use tracing::debug;

use kisan_sathi_core::speech::{OnSpeechEnd, SpeechEnd, SpeechEngine, SpeechHandle, Voice};

use crate::config::SpeechConfig;

pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
    voices: Vec<Voice>,
    next: AtomicU64,
    running: Arc<Mutex<HashMap<SpeechHandle, oneshot::Sender<()>>>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>, voices: Vec<Voice>) -> Self {
        Self {
            program: program.into(),
            args,
            voices,
            next: AtomicU64::new(1),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build from `[speech]`, or `None` when no program is configured.
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        config
            .program
            .as_ref()
            .map(|p| Self::new(p.clone(), config.args.clone(), config.voices.clone()))
    }

    /// Expand `{voice}` and `{lang}` placeholders, dropping arguments
    /// that need a voice when none was chosen.
    fn render_args(&self, lang: &str, voice: Option<&Voice>) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len());
        let mut skip_flag = false;
        for (i, arg) in self.args.iter().enumerate() {
            if skip_flag {
                skip_flag = false;
                continue;
            }
            // "-v {voice}" pairs: drop the flag together with its value.
            if voice.is_none()
                && self
                    .args
                    .get(i + 1)
                    .is_some_and(|next| next.contains("{voice}"))
                && arg.starts_with('-')
            {
                skip_flag = true;
                continue;
            }
            match voice {
                Some(v) => out.push(arg.replace("{voice}", &v.name).replace("{lang}", lang)),
                None if arg.contains("{voice}") => {}
                None => out.push(arg.replace("{lang}", lang)),
            }
        }
        out
    }
}

impl SpeechEngine for CommandSpeech {
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
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| anyhow!("speech requires a tokio runtime"))?;

        let mut child = tokio::process::Command::new(&self.program)
            .args(self.render_args(lang, voice))
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start speech program '{}'", self.program))?;

        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.running
            .lock()
            .map_err(|_| anyhow!("speech registry lock poisoned"))?
            .insert(handle, cancel_tx);

        let running = Arc::clone(&self.running);
        runtime.spawn(async move {
            let end = tokio::select! {
                status = child.wait() => match status {
                    Ok(s) if s.success() => Some(SpeechEnd::Finished),
                    Ok(s) => Some(SpeechEnd::Failed(format!("speech program exited with {}", s))),
                    Err(e) => Some(SpeechEnd::Failed(e.to_string())),
                },
                _ = cancel_rx => {
                    let _ = child.kill().await;
                    None
                }
            };
            if let Ok(mut map) = running.lock() {
                map.remove(&handle);
            }
            match end {
                Some(end) => on_end(end),
                None => debug!(handle, "speech cancelled"),
            }
        });

        Ok(handle)
    }

    fn cancel(&self, handle: SpeechHandle) {
        let sender = self.running.lock().ok().and_then(|mut m| m.remove(&handle));
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }
}
