//! 实时扇出通道
//!
//! 每个在线连接挂一个有界推送队列。发布时按消息范围取成员快照，
//! 对每个目标做一次非阻塞投递：队列已满或已关闭的连接直接错过这条消息，
//! 不重试、不缓存，客户端依靠重新拉取历史来补齐。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::{ConnectionId, Message, MessageScope};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{dto::MessageDto, protocol::ServerEvent, registry::MembershipRegistry};

pub type PushSender = mpsc::Sender<Arc<ServerEvent>>;
pub type PushReceiver = mpsc::Receiver<Arc<ServerEvent>>;

/// 单次发布的投递结果。未送达不是错误。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub targeted: usize,
    pub delivered: usize,
}

impl FanoutReport {
    pub fn missed(&self) -> usize {
        self.targeted - self.delivered
    }
}

pub struct FanoutChannel {
    registry: Arc<MembershipRegistry>,
    sinks: Mutex<HashMap<ConnectionId, PushSender>>,
    buffer: usize,
}

impl FanoutChannel {
    pub fn new(registry: Arc<MembershipRegistry>, buffer: usize) -> Self {
        Self {
            registry,
            sinks: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<MembershipRegistry> {
        &self.registry
    }

    fn sinks(&self) -> MutexGuard<'_, HashMap<ConnectionId, PushSender>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 为新打开的连接登记推送队列。
    pub fn attach(&self, connection_id: ConnectionId) -> PushReceiver {
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.sinks().insert(connection_id, sender);
        receiver
    }

    pub fn detach(&self, connection_id: ConnectionId) -> bool {
        self.sinks().remove(&connection_id).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.sinks().len()
    }

    /// 推送一条已持久化的消息。
    ///
    /// 房间消息只发给发布瞬间选中该房间的连接；旧版无房间消息发给所有在线连接。
    /// 本方法不会挂起，锁只在取快照时持有。
    pub fn publish(&self, message: &Message) -> FanoutReport {
        let recipients: Vec<(ConnectionId, PushSender)> = match message.scope {
            MessageScope::Room(room_id) => {
                let members = self.registry.members_of(room_id);
                let sinks = self.sinks();
                members
                    .into_iter()
                    .filter_map(|id| sinks.get(&id).map(|sink| (id, sink.clone())))
                    .collect()
            }
            MessageScope::Global => self
                .sinks()
                .iter()
                .map(|(id, sink)| (*id, sink.clone()))
                .collect(),
        };

        let event = Arc::new(ServerEvent::MessageNew(MessageDto::from(message)));
        let mut report = FanoutReport {
            targeted: recipients.len(),
            delivered: 0,
        };

        for (connection_id, sink) in recipients {
            match sink.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(%connection_id, message_id = %message.id, "push queue full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%connection_id, message_id = %message.id, "connection closed before push");
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{AuthorName, MessageId, MessageText, RoomId};

    fn message(scope: MessageScope, text: &str) -> Message {
        Message::new(
            MessageId::generate(),
            MessageText::new(text).unwrap(),
            AuthorName::new("alice").unwrap(),
            scope,
            Utc::now(),
        )
    }

    fn text_of(event: &ServerEvent) -> &str {
        match event {
            ServerEvent::MessageNew(dto) => &dto.text,
            other => panic!("unexpected event {other:?}"),
        }
    }

    fn channel() -> FanoutChannel {
        FanoutChannel::new(Arc::new(MembershipRegistry::new()), 8)
    }

    #[test]
    fn room_message_reaches_only_current_members() {
        let fanout = channel();
        let (a, b, c) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        let (general, other) = (RoomId::generate(), RoomId::generate());

        let mut rx_a = fanout.attach(a);
        let mut rx_b = fanout.attach(b);
        let mut rx_c = fanout.attach(c);
        fanout.registry().join(a, general);
        fanout.registry().join(b, other);

        let report = fanout.publish(&message(MessageScope::Room(general), "hello"));
        assert_eq!(report, FanoutReport { targeted: 1, delivered: 1 });

        let event = rx_a.try_recv().unwrap();
        match event.as_ref() {
            ServerEvent::MessageNew(dto) => {
                assert_eq!(dto.text, "hello");
                assert_eq!(dto.author, "alice");
                assert_eq!(dto.room_id, Some(general.into()));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx_b.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[test]
    fn late_joiner_does_not_receive_earlier_message() {
        let fanout = channel();
        let (a, late) = (ConnectionId::generate(), ConnectionId::generate());
        let general = RoomId::generate();

        let mut rx_a = fanout.attach(a);
        let mut rx_late = fanout.attach(late);
        fanout.registry().join(a, general);

        fanout.publish(&message(MessageScope::Room(general), "first"));
        fanout.registry().join(late, general);

        assert_eq!(text_of(&rx_a.try_recv().unwrap()), "first");
        assert!(rx_late.try_recv().is_err());

        fanout.publish(&message(MessageScope::Room(general), "second"));
        assert_eq!(text_of(&rx_late.try_recv().unwrap()), "second");
    }

    #[test]
    fn global_message_reaches_every_open_connection() {
        let fanout = channel();
        let (a, b, idle) = (
            ConnectionId::generate(),
            ConnectionId::generate(),
            ConnectionId::generate(),
        );
        let mut rx_a = fanout.attach(a);
        let mut rx_b = fanout.attach(b);
        let mut rx_idle = fanout.attach(idle);
        fanout.registry().join(a, RoomId::generate());
        fanout.registry().join(b, RoomId::generate());

        let report = fanout.publish(&message(MessageScope::Global, "legacy"));
        assert_eq!(report.delivered, 3);

        for rx in [&mut rx_a, &mut rx_b, &mut rx_idle] {
            let event = rx.try_recv().unwrap();
            assert_eq!(text_of(&event), "legacy");
            match event.as_ref() {
                ServerEvent::MessageNew(dto) => assert_eq!(dto.room_id, None),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn full_queue_drops_without_blocking_others() {
        let fanout = FanoutChannel::new(Arc::new(MembershipRegistry::new()), 1);
        let (slow, fast) = (ConnectionId::generate(), ConnectionId::generate());
        let general = RoomId::generate();
        let _rx_slow = fanout.attach(slow);
        let mut rx_fast = fanout.attach(fast);
        fanout.registry().join(slow, general);
        fanout.registry().join(fast, general);

        fanout.publish(&message(MessageScope::Room(general), "one"));
        assert_eq!(text_of(&rx_fast.try_recv().unwrap()), "one");

        let report = fanout.publish(&message(MessageScope::Room(general), "two"));
        assert_eq!(report.targeted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.missed(), 1);
        assert_eq!(text_of(&rx_fast.try_recv().unwrap()), "two");
    }

    #[test]
    fn closed_receiver_counts_as_miss() {
        let fanout = channel();
        let conn = ConnectionId::generate();
        drop(fanout.attach(conn));

        let report = fanout.publish(&message(MessageScope::Global, "gone"));
        assert_eq!(report, FanoutReport { targeted: 1, delivered: 0 });
    }

    #[test]
    fn detached_connection_is_skipped() {
        let fanout = channel();
        let conn = ConnectionId::generate();
        let general = RoomId::generate();
        let _rx = fanout.attach(conn);
        fanout.registry().join(conn, general);

        assert!(fanout.detach(conn));
        assert!(!fanout.detach(conn));
        assert_eq!(fanout.connection_count(), 0);

        let report = fanout.publish(&message(MessageScope::Room(general), "nobody"));
        assert_eq!(report.targeted, 0);
    }

    #[test]
    fn pushes_arrive_in_publish_order() {
        let fanout = channel();
        let conn = ConnectionId::generate();
        let general = RoomId::generate();
        let mut rx = fanout.attach(conn);
        fanout.registry().join(conn, general);

        for text in ["a", "b", "c"] {
            fanout.publish(&message(MessageScope::Room(general), text));
        }

        let received: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| text_of(&event).to_owned())
            .collect();
        assert_eq!(received, vec!["a", "b", "c"]);
    }
}
