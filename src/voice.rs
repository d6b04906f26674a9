//! Fixed pools of playback voices and the allocation policy.

use crate::backend::{Backend, VoiceKind, VoiceRef};

/// Index of a voice slot within one of the two pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceId {
    pub kind: VoiceKind,
    pub index: usize,
}

/// One pool slot: the backend handle plus the name of the last source
/// bound to it. Holding the name instead of a reference keeps the
/// source/voice relationship acyclic.
pub struct Voice {
    pub handle: VoiceRef,
    pub kind: VoiceKind,
    pub last_source: Option<String>,
}

/// Outcome of a successful allocation.
pub struct Allocation {
    pub id: VoiceId,
    /// Previous occupant that was unbound to make room, if any. The
    /// caller must disconnect its voice link (and close the voice if it
    /// was still playing).
    pub previous: Option<String>,
}

/// Two fixed arrays of voices with round-robin cursors.
///
/// Sizes come from configuration but the pools tolerate backends that
/// run out of hardware voices early.
pub struct VoicePool {
    normal: Vec<Voice>,
    streaming: Vec<Voice>,
    next_normal: usize,
    next_streaming: usize,
}

impl VoicePool {
    /// Creates up to the requested number of voices of each kind,
    /// stopping early when the backend reports exhaustion.
    pub fn create(backend: &dyn Backend, normal: usize, streaming: usize) -> Self {
        let mut pool = Self {
            normal: Vec::with_capacity(normal),
            streaming: Vec::with_capacity(streaming),
            next_normal: 0,
            next_streaming: 0,
        };
        for _ in 0..streaming {
            match backend.create_voice(VoiceKind::Streaming) {
                Some(handle) => pool.streaming.push(Voice {
                    handle,
                    kind: VoiceKind::Streaming,
                    last_source: None,
                }),
                None => break,
            }
        }
        for _ in 0..normal {
            match backend.create_voice(VoiceKind::Normal) {
                Some(handle) => pool.normal.push(Voice {
                    handle,
                    kind: VoiceKind::Normal,
                    last_source: None,
                }),
                None => break,
            }
        }
        if pool.normal.len() < normal || pool.streaming.len() < streaming {
            log::warn!(
                "backend created {}/{} normal and {}/{} streaming voices",
                pool.normal.len(),
                normal,
                pool.streaming.len(),
                streaming
            );
        }
        pool
    }

    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        match id.kind {
            VoiceKind::Normal => self.normal.get(id.index),
            VoiceKind::Streaming => self.streaming.get(id.index),
        }
    }

    pub fn handle(&self, id: VoiceId) -> Option<VoiceRef> {
        self.get(id).map(|voice| voice.handle)
    }

    /// Clears the binding of `id` if it currently belongs to `name`.
    pub fn unbind(&mut self, id: VoiceId, name: &str) {
        let voices = match id.kind {
            VoiceKind::Normal => &mut self.normal,
            VoiceKind::Streaming => &mut self.streaming,
        };
        if let Some(voice) = voices.get_mut(id.index) {
            if voice.last_source.as_deref() == Some(name) {
                voice.last_source = None;
            }
        }
    }

    /// All handles of both pools, for shutdown.
    pub fn all_handles(&self) -> Vec<VoiceRef> {
        self.normal
            .iter()
            .chain(self.streaming.iter())
            .map(|voice| voice.handle)
            .collect()
    }

    pub fn normal_len(&self) -> usize {
        self.normal.len()
    }

    pub fn streaming_len(&self) -> usize {
        self.streaming.len()
    }

    /// Finds a voice for `name` in the pool matching `kind`.
    ///
    /// Three passes starting at the round-robin cursor:
    /// 1. a voice already bound to this source is reused;
    /// 2. the first voice that is unbound or whose source is not
    ///    playing is taken;
    /// 3. the first voice whose source is not priority is stolen, and
    ///    the previous binding is reported for eviction.
    ///
    /// Returns `None` when every voice is playing a priority source.
    /// `is_playing`/`is_priority` answer for the source currently bound
    /// to a candidate voice.
    pub fn allocate(
        &mut self,
        name: &str,
        kind: VoiceKind,
        mut is_playing: impl FnMut(&str) -> bool,
        mut is_priority: impl FnMut(&str) -> bool,
    ) -> Option<Allocation> {
        let (voices, cursor) = match kind {
            VoiceKind::Normal => (&mut self.normal, &mut self.next_normal),
            VoiceKind::Streaming => (&mut self.streaming, &mut self.next_streaming),
        };
        let count = voices.len();
        if count == 0 {
            return None;
        }

        // Pass 1: re-bind.
        for (index, voice) in voices.iter().enumerate() {
            if voice.last_source.as_deref() == Some(name) {
                return Some(Allocation {
                    id: VoiceId { kind, index },
                    previous: None,
                });
            }
        }

        // Pass 2: free or silent voice.
        let mut n = *cursor % count;
        for _ in 0..count {
            let occupant = voices[n].last_source.clone();
            let available = match &occupant {
                None => true,
                Some(source) => !is_playing(source),
            };
            if available {
                voices[n].last_source = Some(name.to_string());
                *cursor = (n + 1) % count;
                return Some(Allocation {
                    id: VoiceId { kind, index: n },
                    previous: occupant,
                });
            }
            n = (n + 1) % count;
        }

        // Pass 3: steal from a non-priority source.
        let mut n = *cursor % count;
        for _ in 0..count {
            let occupant = voices[n].last_source.clone();
            let evictable = match &occupant {
                None => true,
                Some(source) => !is_playing(source) || !is_priority(source),
            };
            if evictable {
                voices[n].last_source = Some(name.to_string());
                *cursor = (n + 1) % count;
                return Some(Allocation {
                    id: VoiceId { kind, index: n },
                    previous: occupant,
                });
            }
            n = (n + 1) % count;
        }

        None
    }
}
