use std::sync::Arc;

use application::{
    Clock, FanoutChannel, MembershipRegistry, MessageService, MessageServiceDependencies,
    RoomService, RoomServiceDependencies, SystemClock, UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::Infrastructure;

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub room_service: Arc<RoomService>,
    pub message_service: Arc<MessageService>,
    pub jwt_service: Arc<JwtService>,
    pub fanout: Arc<FanoutChannel>,
}

impl AppState {
    /// 用基础设施适配器装配全部用例服务
    pub fn new(infra: &Infrastructure, config: &AppConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let fanout = Arc::new(FanoutChannel::new(
            Arc::new(MembershipRegistry::new()),
            config.realtime.connection_buffer,
        ));

        let user_service = UserService::new(UserServiceDependencies {
            user_repository: infra.user_repository.clone(),
            password_hasher: infra.password_hasher.clone(),
            clock: clock.clone(),
        });

        let room_service = RoomService::new(RoomServiceDependencies {
            room_repository: infra.room_repository.clone(),
            clock: clock.clone(),
        });

        let message_service = MessageService::new(MessageServiceDependencies {
            room_repository: infra.room_repository.clone(),
            message_repository: infra.message_repository.clone(),
            credential_verifier: jwt_service.clone(),
            fanout: fanout.clone(),
            clock,
        });

        Self {
            user_service: Arc::new(user_service),
            room_service: Arc::new(room_service),
            message_service: Arc::new(message_service),
            jwt_service,
            fanout,
        }
    }

    pub fn registry(&self) -> &Arc<MembershipRegistry> {
        self.fanout.registry()
    }
}
