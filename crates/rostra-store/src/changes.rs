use serde::Serialize;
use tokio::sync::broadcast;

use rostra_core::ids::DebateId;

/// Which table a change landed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Debates,
    Turns,
    ClaimVerdicts,
    Alerts,
    Summaries,
    Documents,
    Votes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Inserted,
    Updated,
}

/// Notification published after every successful write. Consumers filter
/// by debate ID and tolerate duplicate delivery; this feed is the only
/// channel between orchestration and presentation.
#[derive(Clone, Debug, Serialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub op: ChangeOp,
    pub debate_id: DebateId,
    pub entity_id: String,
}

/// Broadcast fan-out of change events. Cheap to clone; a feed with no
/// subscribers silently drops events.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is fine — nobody is watching this debate.
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_published_events() {
        let feed = ChangeFeed::new(16);
        let mut rx = feed.subscribe();
        let debate_id = DebateId::new();

        feed.publish(ChangeEvent {
            table: ChangeTable::Turns,
            op: ChangeOp::Inserted,
            debate_id: debate_id.clone(),
            entity_id: "turn_x".into(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, ChangeTable::Turns);
        assert_eq!(event.op, ChangeOp::Inserted);
        assert_eq!(event.debate_id, debate_id);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::new(16);
        feed.publish(ChangeEvent {
            table: ChangeTable::Debates,
            op: ChangeOp::Updated,
            debate_id: DebateId::new(),
            entity_id: "deb_x".into(),
        });
    }

    #[tokio::test]
    async fn events_filterable_by_debate() {
        let feed = ChangeFeed::new(16);
        let mut rx = feed.subscribe();
        let mine = DebateId::new();
        let other = DebateId::new();

        for id in [&other, &mine, &other] {
            feed.publish(ChangeEvent {
                table: ChangeTable::Votes,
                op: ChangeOp::Inserted,
                debate_id: id.clone(),
                entity_id: "vote_x".into(),
            });
        }

        let mut seen = 0;
        while let Ok(event) = rx.try_recv() {
            if event.debate_id == mine {
                seen += 1;
            }
        }
        assert_eq!(seen, 1);
    }
}
