//! Internal IMAP session management.
//!
//! Wraps the async-imap commands one poll cycle needs: authenticate, select,
//! search-since, fetch-with-INTERNALDATE, logout.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use chrono::NaiveDate;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authenticates to IMAP server and returns a session.
#[instrument(name = "session::authenticate", skip_all, fields(email = %email))]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    email: &str,
    password: &str,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client.login(email, password).await.map_err(|e| Error::ImapLogin {
        email: email.to_string(),
        source: e.0,
    })
}

/// Selects a mailbox (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Searches for message UIDs received since `since_date`.
///
/// IMAP `SINCE` has day granularity; the caller widens the date by its
/// skew margin and re-filters per message on `INTERNALDATE`.
#[instrument(name = "session::search_since", skip(session), fields(since_date = %since_date))]
pub(crate) async fn search_uids_since(
    session: &mut ImapSession,
    since_date: NaiveDate,
) -> Result<Vec<u32>> {
    // IMAP SINCE format: "DD-Mon-YYYY" (e.g., "07-Dec-2025")
    let query = format!("SINCE {}", since_date.format("%d-%b-%Y"));

    let uids = session
        .uid_search(&query)
        .await
        .map_err(|source| Error::ImapSearch { source })?;

    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();

    debug!(uid_count = uids.len(), "Found messages");

    Ok(uids)
}

/// Fetches a single message by UID, including its body and `INTERNALDATE`.
pub(crate) async fn fetch_message(
    session: &mut ImapSession,
    uid: u32,
) -> Result<Option<async_imap::types::Fetch>> {
    debug!(uid, "Fetching message");

    let mut stream = session
        .uid_fetch(uid.to_string(), "(INTERNALDATE BODY[])")
        .await
        .map_err(|source| Error::ImapFetch { uid, source })?;

    let mut fetched = None;
    while let Some(result) = stream.next().await {
        let message = result.map_err(|source| Error::FetchMessage { source })?;
        fetched.get_or_insert(message);
    }

    Ok(fetched)
}

/// Logs out from IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}
