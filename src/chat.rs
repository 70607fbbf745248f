//! Conversation/message state mirrored from the server.
//!
//! Commands only dispatch network work. Results come back through a channel
//! and are applied by [`ChatViewModel::next_event`] or
//! [`ChatViewModel::apply_pending`], so every mutation happens on whatever
//! task owns the view-model.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::client::ChatApi;
use crate::api::error::ApiError;
use crate::api::models::{Conversation, CreateConversationRequest, CreateMessageRequest, Message};
use crate::utils::run_async_to_main;

/// Snapshot rendered by the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    pub conversations: Vec<Conversation>,
    pub selected: Option<Conversation>,
    /// Messages of `selected`; emptied whenever the selection changes.
    pub messages: Vec<Message>,
    pub input: String,
}

impl ChatState {
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().and_then(|c| c.id.as_deref())
    }
}

/// Outcome of one applied network completion.
#[derive(Debug)]
pub enum ChatEvent {
    ConversationsLoaded { count: usize },
    ConversationsFailed(ApiError),
    MessagesLoaded { conversation_id: String, count: usize },
    MessagesFailed { conversation_id: String, error: ApiError },
    /// The server stored the message. It is only appended when its
    /// conversation is still the selected one.
    MessageSent(Message),
    SendFailed(ApiError),
    ConversationCreated(Conversation),
    CreateConversationFailed(ApiError),
    /// A response overtaken by a newer request of the same kind.
    Discarded(Superseded),
    /// The request's task died before producing a result.
    Abandoned(Request),
}

/// Which command a lost completion belonged to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Conversations,
    Messages { conversation_id: String },
    SendMessage { conversation_id: String },
    CreateConversation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Superseded {
    Conversations,
    Messages { conversation_id: String },
}

enum Completion {
    Conversations {
        seq: u64,
        result: Result<Vec<Conversation>, ApiError>,
    },
    Messages {
        seq: u64,
        conversation_id: String,
        result: Result<Vec<Message>, ApiError>,
    },
    Sent {
        conversation_id: String,
        result: Result<Message, ApiError>,
    },
    Created {
        result: Result<Conversation, ApiError>,
    },
    Abandoned(Request),
}

pub struct ChatViewModel {
    api: Arc<dyn ChatApi>,
    user_id: String,
    state: ChatState,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    conversations_seq: u64,
    messages_seq: u64,
    in_flight: usize,
}

impl ChatViewModel {
    pub fn new(api: Arc<dyn ChatApi>, user_id: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            user_id: user_id.into(),
            state: ChatState::default(),
            tx,
            rx,
            conversations_seq: 0,
            messages_seq: 0,
            in_flight: 0,
        }
    }

    /// Builds the view-model and starts loading conversations.
    pub fn initialize(api: Arc<dyn ChatApi>, user_id: impl Into<String>) -> Self {
        let mut vm = Self::new(api, user_id);
        vm.load_conversations();
        vm
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// True while at least one dispatched request has not been applied yet.
    pub fn has_pending(&self) -> bool {
        self.in_flight > 0
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    pub fn load_conversations(&mut self) {
        self.conversations_seq += 1;
        let seq = self.conversations_seq;
        let api = self.api.clone();
        let user_id = self.user_id.clone();
        self.dispatch(
            async move { api.fetch_conversations(&user_id).await },
            move |result| Completion::Conversations { seq, result },
            Request::Conversations,
        );
    }

    /// Commits the selection right away and empties the thread, then fetches
    /// its messages.
    pub fn select_conversation(&mut self, conversation: Conversation) {
        self.messages_seq += 1;
        let seq = self.messages_seq;
        let id = conversation.id.clone();
        self.state.selected = Some(conversation);
        self.state.messages.clear();

        let Some(conversation_id) = id else {
            log::warn!("selected conversation has no id yet, not fetching messages");
            return;
        };
        let api = self.api.clone();
        let user_id = self.user_id.clone();
        let cid = conversation_id.clone();
        let lost = Request::Messages {
            conversation_id: conversation_id.clone(),
        };
        self.dispatch(
            async move { api.fetch_messages(&cid, &user_id).await },
            move |result| Completion::Messages {
                seq,
                conversation_id,
                result,
            },
            lost,
        );
    }

    /// Returns `false` without touching the network when there is nothing to
    /// send or nowhere to send it.
    pub fn send_message(&mut self) -> bool {
        if self.state.input.trim().is_empty() {
            return false;
        }
        let Some(conversation_id) = self.state.selected_id().map(str::to_string) else {
            log::debug!("send ignored: no conversation selected");
            return false;
        };
        let dto = CreateMessageRequest::from_user(&conversation_id, &self.user_id, &self.state.input);
        let api = self.api.clone();
        let lost = Request::SendMessage {
            conversation_id: conversation_id.clone(),
        };
        self.dispatch(
            async move { api.create_message(&dto.conversation_id, &dto).await },
            move |result| Completion::Sent {
                conversation_id,
                result,
            },
            lost,
        );
        true
    }

    pub fn create_conversation(&mut self, title: impl Into<String>) {
        let dto = CreateConversationRequest {
            user_id: Some(self.user_id.clone()),
            title: title.into(),
        };
        let api = self.api.clone();
        self.dispatch(
            async move { api.create_conversation(&dto).await },
            |result| Completion::Created { result },
            Request::CreateConversation,
        );
    }

    /// Waits for the next completion and applies it.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<ChatEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn apply_pending(&mut self) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            events.push(self.apply(completion));
        }
        events
    }

    /// Every dispatched request delivers exactly one completion, even when its
    /// task panics, so `in_flight` always drains back to zero.
    fn dispatch<T, Fut, W>(&mut self, fut: Fut, wrap: W, lost: Request)
    where
        T: Send + 'static,
        Fut: std::future::Future<Output = T> + Send + 'static,
        W: FnOnce(T) -> Completion + Send + 'static,
    {
        self.in_flight += 1;
        run_async_to_main(self.tx.clone(), fut, wrap, Completion::Abandoned(lost));
    }

    fn apply(&mut self, completion: Completion) -> ChatEvent {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Conversations { seq, .. } if seq != self.conversations_seq => {
                log::debug!("dropping superseded conversation list");
                ChatEvent::Discarded(Superseded::Conversations)
            }
            Completion::Conversations { result, .. } => match result {
                Ok(conversations) => {
                    let count = conversations.len();
                    let last = conversations.last().cloned();
                    self.state.conversations = conversations;
                    if let Some(last) = last {
                        self.select_conversation(last);
                    }
                    ChatEvent::ConversationsLoaded { count }
                }
                Err(error) => {
                    log::warn!("Failed to load conversations: {}", error);
                    ChatEvent::ConversationsFailed(error)
                }
            },
            Completion::Messages {
                seq, conversation_id, ..
            } if seq != self.messages_seq => {
                log::debug!("dropping superseded messages for {}", conversation_id);
                ChatEvent::Discarded(Superseded::Messages { conversation_id })
            }
            Completion::Messages {
                conversation_id,
                result,
                ..
            } => match result {
                Ok(messages) => {
                    let count = messages.len();
                    self.state.messages = messages;
                    ChatEvent::MessagesLoaded { conversation_id, count }
                }
                Err(error) => {
                    log::warn!("Failed to load messages for {}: {}", conversation_id, error);
                    ChatEvent::MessagesFailed { conversation_id, error }
                }
            },
            Completion::Sent {
                conversation_id,
                result,
            } => match result {
                Ok(message) => {
                    if self.state.selected_id() == Some(conversation_id.as_str()) {
                        self.state.messages.push(message.clone());
                    }
                    self.state.input.clear();
                    ChatEvent::MessageSent(message)
                }
                Err(error) => {
                    log::warn!("Failed to send message to {}: {}", conversation_id, error);
                    ChatEvent::SendFailed(error)
                }
            },
            Completion::Created { result } => match result {
                Ok(conversation) => {
                    self.state.conversations.push(conversation.clone());
                    self.select_conversation(conversation.clone());
                    ChatEvent::ConversationCreated(conversation)
                }
                Err(error) => {
                    log::warn!("Failed to create conversation: {}", error);
                    ChatEvent::CreateConversationFailed(error)
                }
            },
            Completion::Abandoned(request) => {
                log::error!("request task ended without a result: {:?}", request);
                ChatEvent::Abandoned(request)
            }
        }
    }
}
