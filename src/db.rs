use std::future::Future;
use std::time::Duration;

use time::OffsetDateTime;

use crate::error::BoxError;

/// Current UTC time truncated to the microsecond precision PostgreSQL stores.
pub(crate) fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - time::Duration::nanoseconds(i64::from(now.nanosecond() % 1_000))
}

/// Drive `fut` to completion, failing with the elapsed timer if `limit` passes first.
pub(crate) async fn with_deadline<F, T, E>(limit: Option<Duration>, fut: F) -> Result<T, BoxError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res.map_err(Into::into),
            Err(elapsed) => Err(elapsed.into()),
        },
        None => fut.await.map_err(Into::into),
    }
}
