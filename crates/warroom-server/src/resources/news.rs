//! The news feed shown during the news phase.

use warroom_protocol::{NewsView, Phase, SessionId};

use crate::gateway::{Gateway, GatewayError};

pub const FALLBACK_TITLE: &str = "No More News";
pub const FALLBACK_INFO: &str = "Obviously you've been playing this game too long...";

/// The one news item a session currently shows. The view is only marked
/// active while the session sits in the news phase.
pub async fn current(
    gateway: &dyn Gateway,
    session: SessionId,
    phase: Phase,
) -> Result<NewsView, GatewayError> {
    let (news_title, news_info) = match gateway.select_current_news(session).await? {
        Some(row) => (row.title, row.info),
        None => (FALLBACK_TITLE.to_owned(), FALLBACK_INFO.to_owned()),
    };
    Ok(NewsView {
        active: phase == Phase::NEWS,
        news_title,
        news_info,
    })
}
