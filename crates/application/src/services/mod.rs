mod message_service;
mod room_service;
mod user_service;

pub use message_service::{MessageService, MessageServiceDependencies, PostMessageRequest};
pub use room_service::{RoomService, RoomServiceDependencies};
pub use user_service::{
    AuthenticateUserRequest, RegisterUserRequest, UserService, UserServiceDependencies,
};
