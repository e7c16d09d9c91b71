use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use models::ChatMessage;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::poller::Poller;
use crate::errors::ServiceError;
use crate::provider::DataProvider;

type Channels = Arc<Mutex<HashMap<Uuid, watch::Sender<Vec<ChatMessage>>>>>;

/// One-to-one chat with background refresh.
///
/// `watch` opens a conversation: the thread is fetched once, then re-fetched
/// every poll interval. Receivers only see a new value when the thread grew.
pub struct ChatService {
    provider: Arc<dyn DataProvider>,
    poller: Poller<Uuid>,
    channels: Channels,
}

impl ChatService {
    pub fn new(provider: Arc<dyn DataProvider>, interval: Duration) -> Self {
        Self { provider, poller: Poller::new(interval), channels: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub async fn messages_with(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, ServiceError> {
        self.provider.messages_with(user_id).await
    }

    /// Send and append to the open conversation, if any, without waiting for
    /// the next poll.
    #[instrument(skip(self, text))]
    pub async fn send(&self, receiver_id: Uuid, text: &str) -> Result<ChatMessage, ServiceError> {
        let sent = self.provider.send_message(receiver_id, text).await?;
        let sender = self.channels.lock().unwrap_or_else(PoisonError::into_inner).get(&receiver_id).cloned();
        if let Some(tx) = sender {
            tx.send_modify(|thread| {
                if !thread.iter().any(|m| m.id == sent.id) {
                    thread.push(sent.clone());
                }
            });
        }
        Ok(sent)
    }

    /// Open (or rejoin) a conversation. A second call for the same user
    /// shares the existing channel and timer.
    pub async fn watch(&self, user_id: Uuid) -> Result<watch::Receiver<Vec<ChatMessage>>, ServiceError> {
        let existing = self.channels.lock().unwrap_or_else(PoisonError::into_inner).get(&user_id).map(|tx| tx.subscribe());
        if let Some(rx) = existing {
            return Ok(rx);
        }

        let initial = self.provider.messages_with(user_id).await?;
        let rx = {
            let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
            // another caller may have opened it while we were fetching
            if let Some(tx) = channels.get(&user_id) {
                return Ok(tx.subscribe());
            }
            let (tx, rx) = watch::channel(initial);
            channels.insert(user_id, tx);
            rx
        };

        let provider = Arc::clone(&self.provider);
        let channels = Arc::clone(&self.channels);
        self.poller.start(user_id, move || {
            let provider = Arc::clone(&provider);
            let channels = Arc::clone(&channels);
            async move { refresh(provider.as_ref(), &channels, user_id).await }
        });
        debug!(%user_id, "conversation opened");
        Ok(rx)
    }

    pub fn is_watching(&self, user_id: Uuid) -> bool {
        self.poller.is_polling(&user_id)
    }

    /// Stop polling and drop the channel; open receivers see it close.
    pub fn close(&self, user_id: Uuid) {
        self.poller.stop(&user_id);
        if self.channels.lock().unwrap_or_else(PoisonError::into_inner).remove(&user_id).is_some() {
            debug!(%user_id, "conversation closed");
        }
    }

    pub fn close_all(&self) {
        self.poller.stop_all();
        self.channels.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

async fn refresh(provider: &dyn DataProvider, channels: &Channels, user_id: Uuid) {
    let fetched = match provider.messages_with(user_id).await {
        Ok(messages) => messages,
        Err(err) => {
            warn!(%user_id, error = %err, "chat refresh failed");
            return;
        }
    };
    let sender = channels.lock().unwrap_or_else(PoisonError::into_inner).get(&user_id).cloned();
    let Some(tx) = sender else { return };
    let grew = tx.send_if_modified(|thread| {
        if fetched.len() > thread.len() {
            *thread = fetched;
            true
        } else {
            false
        }
    });
    if grew {
        debug!(%user_id, "new chat messages");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockDataProvider;
    use async_trait::async_trait;
    use chrono::Utc;
    use models::StreakStats;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches and lets tests inject messages from the other side.
    struct Scripted {
        inner: MockDataProvider,
        fetches: AtomicUsize,
    }

    impl Scripted {
        fn new() -> Arc<Self> {
            Arc::new(Self { inner: MockDataProvider::new(), fetches: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl DataProvider for Scripted {
        async fn streak_stats(&self) -> Result<StreakStats, ServiceError> {
            self.inner.streak_stats().await
        }

        async fn messages_with(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, ServiceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.messages_with(user_id).await
        }

        async fn send_message(&self, receiver_id: Uuid, text: &str) -> Result<ChatMessage, ServiceError> {
            self.inner.send_message(receiver_id, text).await
        }
    }

    const PERIOD: Duration = Duration::from_millis(3000);

    #[tokio::test(start_paused = true)]
    async fn watch_fetches_then_polls() -> Result<(), ServiceError> {
        let provider = Scripted::new();
        let chat = ChatService::new(provider.clone(), PERIOD);
        let friend = Uuid::new_v4();

        let rx = chat.watch(friend).await?;
        assert_eq!(rx.borrow().len(), 2);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(PERIOD * 2 + Duration::from_millis(10)).await;
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 3);
        chat.close(friend);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_thread_does_not_notify() -> Result<(), ServiceError> {
        let provider = Scripted::new();
        let chat = ChatService::new(provider.clone(), PERIOD);
        let friend = Uuid::new_v4();
        let mut rx = chat.watch(friend).await?;
        rx.borrow_and_update();

        tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        assert!(!rx.has_changed().unwrap_or(true));

        // a message written outside this service shows up on the next poll
        provider.inner.send_message(friend, "from elsewhere").await?;
        tokio::time::sleep(PERIOD).await;
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().len(), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn rewatch_shares_one_timer() -> Result<(), ServiceError> {
        let provider = Scripted::new();
        let chat = ChatService::new(provider.clone(), PERIOD);
        let friend = Uuid::new_v4();
        let _a = chat.watch(friend).await?;
        let _b = chat.watch(friend).await?;
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn send_appends_to_open_conversation() -> Result<(), ServiceError> {
        let provider = Scripted::new();
        let chat = ChatService::new(provider.clone(), PERIOD);
        let friend = Uuid::new_v4();
        let mut rx = chat.watch(friend).await?;
        rx.borrow_and_update();

        let sent = chat.send(friend, "  see you at 8  ").await?;
        assert_eq!(sent.message, "see you at 8");
        assert!(sent.created_at <= Utc::now());
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().last().map(|m| m.id), Some(sent.id));

        // the poll that follows sees the same length and stays quiet
        tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        assert!(!rx.has_changed().unwrap_or(true));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_polling_and_drops_channel() -> Result<(), ServiceError> {
        let provider = Scripted::new();
        let chat = ChatService::new(provider.clone(), PERIOD);
        let friend = Uuid::new_v4();
        let mut rx = chat.watch(friend).await?;
        assert!(chat.is_watching(friend));

        chat.close(friend);
        assert!(!chat.is_watching(friend));
        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
        assert!(rx.changed().await.is_err());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn close_all_stops_every_conversation() -> Result<(), ServiceError> {
        let provider = Scripted::new();
        let chat = ChatService::new(provider.clone(), PERIOD);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let _ra = chat.watch(a).await?;
        let _rb = chat.watch(b).await?;

        chat.close_all();
        assert!(!chat.is_watching(a) && !chat.is_watching(b));
        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
