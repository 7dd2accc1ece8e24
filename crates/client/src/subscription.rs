//! 客户端订阅状态
//!
//! 一个客户端会话只维护一条实时连接，切换房间时在同一连接上重新发出 `room:join`。
//! 推送到达时与本地当前选中的房间比较，匹配的插入列表头部，不匹配的直接丢弃。

use application::{ClientEvent, MessageDto, ServerEvent};
use domain::{MessageScope, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Disconnected,
    Connecting,
    Joined(MessageScope),
}

/// 推送对本地视图的影响
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Prepended,
    /// 属于当前未显示的房间
    Discarded,
    /// 列表里已有同一条消息
    Duplicate,
}

fn scope_of(message: &MessageDto) -> MessageScope {
    MessageScope::from(message.room_id.map(RoomId::from))
}

/// 当前显示的房间及其消息，最新在前
#[derive(Debug, Clone)]
pub struct RoomView {
    selected: MessageScope,
    messages: Vec<MessageDto>,
}

impl Default for RoomView {
    fn default() -> Self {
        Self {
            selected: MessageScope::Global,
            messages: Vec::new(),
        }
    }
}

impl RoomView {
    pub fn selected(&self) -> MessageScope {
        self.selected
    }

    pub fn messages(&self) -> &[MessageDto] {
        &self.messages
    }

    pub fn reconcile(&mut self, message: MessageDto) -> Reconciled {
        if scope_of(&message) != self.selected {
            return Reconciled::Discarded;
        }
        if self.messages.iter().any(|existing| existing.id == message.id) {
            return Reconciled::Duplicate;
        }
        self.messages.insert(0, message);
        Reconciled::Prepended
    }
}

#[derive(Debug)]
pub struct SubscriptionManager {
    state: SubscriptionState,
    view: RoomView,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            state: SubscriptionState::Disconnected,
            view: RoomView::default(),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn view(&self) -> &RoomView {
        &self.view
    }

    pub fn begin_connect(&mut self) {
        self.state = SubscriptionState::Connecting;
    }

    /// 连接建立后，若本地已选中房间则返回需要补发的入房事件
    pub fn connected(&mut self) -> Option<ClientEvent> {
        self.state = SubscriptionState::Joined(self.view.selected);
        self.view
            .selected
            .room_id()
            .map(|room_id| ClientEvent::RoomJoin(room_id.to_string()))
    }

    /// 构造入房事件。必须先发出该事件，再调用 [`commit_selection`](Self::commit_selection)。
    pub fn join_intent(&self, room_id: RoomId) -> ClientEvent {
        ClientEvent::RoomJoin(room_id.to_string())
    }

    /// 切换本地选中的房间并清空旧列表，等待历史刷新
    pub fn commit_selection(&mut self, scope: MessageScope) {
        if self.view.selected != scope {
            self.view.selected = scope;
            self.view.messages.clear();
        }
        if matches!(self.state, SubscriptionState::Joined(_)) {
            self.state = SubscriptionState::Joined(scope);
        }
        tracing::debug!(room_id = ?scope.room_id(), "room selection committed");
    }

    /// 处理一条服务端事件；非消息事件返回 `None`
    pub fn on_push(&mut self, event: ServerEvent) -> Option<Reconciled> {
        match event {
            ServerEvent::MessageNew(message) => Some(self.view.reconcile(message)),
            ServerEvent::Error(payload) => {
                tracing::warn!(code = %payload.code, message = %payload.message, "server rejected event");
                None
            }
        }
    }

    /// 用 REST 拉取的历史替换当前列表，丢弃不属于当前房间的记录
    pub fn replace_history(&mut self, messages: Vec<MessageDto>) {
        let selected = self.view.selected;
        self.view.messages = messages
            .into_iter()
            .filter(|message| scope_of(message) == selected)
            .collect();
    }

    pub fn disconnected(&mut self) {
        self.state = SubscriptionState::Disconnected;
    }
}
