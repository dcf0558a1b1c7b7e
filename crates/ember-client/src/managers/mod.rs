//! Domain managers.
//!
//! Each manager wraps an [`EntityManager`](ember_core::EntityManager) and adds
//! the remote operations of its entity type. Outbound edits follow one rule:
//! the response patches a *clone* of the cached entity and the clone is
//! returned. The cached entity changes only when the matching gateway event
//! arrives.

mod channel;
mod guild;
mod member;
mod member_role;
mod message;
mod role;
mod sticker;
mod user;

pub use channel::{ChannelEditData, ChannelManager};
pub use guild::{GuildManager, GuildScope};
pub use member::{BanOptions, GuildMemberEditData, GuildMemberManager, Timeout};
pub use member_role::GuildMemberRoleManager;
pub use message::{MessageEditData, MessageManager};
pub use role::RoleManager;
pub use sticker::{GuildStickerEditData, GuildStickerManager};
pub use user::UserManager;

use ember_core::{CoreResult, Method, RequestOptions};
use serde_json::Value;
use tracing::trace;

use crate::services::Services;

/// Cache behaviour of `fetch` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Cache the fetched entity.
    pub cache: bool,
    /// Skip the cache lookup and always request.
    pub force: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache: true,
            force: false,
        }
    }
}

impl FetchOptions {
    /// Always request, caching the result.
    pub fn force() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

/// Sends a request through the client's transport.
pub(crate) async fn request(
    services: &Services,
    method: Method,
    route: &str,
    options: RequestOptions,
) -> CoreResult<Value> {
    trace!(%method, route, "REST request");
    let response = services.rest.request(method, route, options).await?;
    trace!(%method, route, body = %response, "REST response");
    Ok(response)
}
