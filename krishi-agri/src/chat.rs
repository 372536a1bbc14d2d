//! Farmer chat with per-session conversation memory
//!
//! Sessions live in a [`ChatSessionStore`]: a bounded LRU map keyed by
//! session id. Each session keeps only the last `memory_turns` exchanges,
//! and a session idle for longer than the TTL is dropped the next time it
//! is touched.

use crate::config::AgriConfig;
use crate::error::AgriResult;
use crate::llm::{ChatTurn, LanguageModel, LlmPrompt};
use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Persona and scope given to the model on every turn
pub const AGRICULTURE_EXPERT_PROMPT: &str = "\
You are Krishi AI Sahayak, a helpful agricultural expert. \
Respond to queries from farmers about crop recommendations and how best to tend to their crops. \
Only respond to queries about agriculture and farming, and take the previous messages in the conversation into account. \
Politely decline anything outside this domain. \
Introduce yourself as an agricultural expert in your first response.";

const CHAT_TEMPERATURE: f32 = 0.7;

#[derive(Debug)]
struct ChatSession {
    turns: VecDeque<ChatTurn>,
    last_active: Instant,
}

impl ChatSession {
    fn new() -> Self {
        Self {
            turns: VecDeque::new(),
            last_active: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_active.elapsed() > ttl
    }
}

/// Bounded, idle-evicting map of chat sessions
#[derive(Debug)]
pub struct ChatSessionStore {
    sessions: Mutex<LruCache<String, ChatSession>>,
    /// Exchanges (user + model pairs) kept per session
    memory_turns: usize,
    ttl: Duration,
}

impl ChatSessionStore {
    pub fn new(max_sessions: NonZeroUsize, memory_turns: usize, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(LruCache::new(max_sessions)),
            memory_turns,
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, ChatSession>> {
        // The map stays consistent even if a holder panicked
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current window for `session_id`; empty for unknown or expired sessions
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        let mut sessions = self.lock();
        match sessions.peek(session_id).map(|s| s.is_expired(self.ttl)) {
            None => Vec::new(),
            Some(true) => {
                debug!(session_id, "chat session expired");
                sessions.pop(session_id);
                Vec::new()
            }
            Some(false) => sessions
                .get(session_id)
                .map(|s| s.turns.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Record one completed exchange, creating the session if needed
    pub fn append(&self, session_id: &str, user: ChatTurn, model: ChatTurn) {
        let window = self.memory_turns * 2;
        let mut sessions = self.lock();

        if sessions
            .peek(session_id)
            .is_some_and(|s| s.is_expired(self.ttl))
        {
            sessions.pop(session_id);
        }
        if !sessions.contains(session_id) {
            self.purge_expired(&mut sessions);
            if let Some((evicted, _)) = sessions.push(session_id.to_string(), ChatSession::new()) {
                debug!(evicted = %evicted, "chat session evicted, store at capacity");
            }
        }

        if let Some(session) = sessions.get_mut(session_id) {
            session.turns.push_back(user);
            session.turns.push_back(model);
            while session.turns.len() > window {
                session.turns.pop_front();
            }
            session.last_active = Instant::now();
        }
    }

    /// Forget a session; returns whether it existed
    pub fn clear(&self, session_id: &str) -> bool {
        self.lock().pop(session_id).is_some()
    }

    /// Number of sessions currently held, expired ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, sessions: &mut LruCache<String, ChatSession>) {
        let stale: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(self.ttl))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            sessions.pop(&id);
        }
    }
}

/// Agricultural-expert chatbot with windowed memory
pub struct Chatbot {
    llm: Arc<dyn LanguageModel>,
    store: ChatSessionStore,
    system_prompt: String,
}

impl Chatbot {
    pub fn new(llm: Arc<dyn LanguageModel>, store: ChatSessionStore) -> Self {
        Self {
            llm,
            store,
            system_prompt: AGRICULTURE_EXPERT_PROMPT.to_string(),
        }
    }

    pub fn from_config(llm: Arc<dyn LanguageModel>, config: &AgriConfig) -> Self {
        let capacity = NonZeroUsize::new(config.chat_max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self::new(
            llm,
            ChatSessionStore::new(capacity, config.chat_memory_turns, config.chat_session_ttl),
        )
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Answer `message` in the context of `session_id`
    ///
    /// The exchange is stored only when the model answers; a failed call
    /// leaves the session untouched.
    pub async fn chat(&self, session_id: &str, message: &str) -> AgriResult<String> {
        let mut turns = self.store.history(session_id);
        let remembered = turns.len();
        turns.push(ChatTurn::user(message));

        let prompt = LlmPrompt {
            system: Some(self.system_prompt.clone()),
            turns,
            temperature: CHAT_TEMPERATURE,
            max_output_tokens: None,
        };

        let reply = self.llm.complete(&prompt).await?;
        self.store
            .append(session_id, ChatTurn::user(message), ChatTurn::model(&reply));

        info!(session_id, remembered, llm = self.llm.name(), "chat reply generated");
        Ok(reply)
    }

    pub fn clear(&self, session_id: &str) -> bool {
        self.store.clear(session_id)
    }

    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.store.history(session_id)
    }

    pub fn store(&self) -> &ChatSessionStore {
        &self.store
    }
}

impl std::fmt::Debug for Chatbot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chatbot")
            .field("llm", &self.llm.name())
            .field("sessions", &self.store.len())
            .finish()
    }
}
