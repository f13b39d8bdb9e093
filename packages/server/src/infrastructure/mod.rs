//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装と、ワイヤー形式の DTO を提供します。

pub mod directory;
pub mod dto;
pub mod message_pusher;
pub mod repository;
