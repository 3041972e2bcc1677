//! Login manager on top of the cookie session.
//!
//! The session holds the logged-in user's id and a queue of flashed
//! messages. Handlers pull the user in through the [`CurrentUser`] and
//! [`LoginRequired`] extractors.

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use log::debug;
use sqlx::SqlitePool;
use url::{form_urlencoded, Url};

use crate::error::AppError;
use crate::user::{self, User};

const USER_ID_KEY: &str = "_user_id";
const FLASHES_KEY: &str = "_flashes";

/// Oldest flashes are dropped past this, to keep the session cookie small.
const MAX_FLASHES: usize = 8;

pub const LOGIN_VIEW: &str = "/log_in";
pub const LOGIN_MESSAGE: &str = "Please log in to access this page.";

pub fn login_user(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    session.insert(USER_ID_KEY, user.id)?;
    Ok(())
}

pub fn logout_user(session: &Session) {
    session.remove(USER_ID_KEY);
    session.renew();
}

pub fn flash(session: &Session, message: impl Into<String>) -> Result<(), AppError> {
    let message = message.into();
    let mut flashes: Vec<String> = session.get(FLASHES_KEY)?.unwrap_or_default();
    if flashes.contains(&message) {
        return Ok(());
    }
    if flashes.len() >= MAX_FLASHES {
        flashes.remove(0);
    }
    flashes.push(message);
    session.insert(FLASHES_KEY, flashes)?;
    Ok(())
}

/// Drain the queued messages so each one is shown exactly once.
pub fn take_flashes(session: &Session) -> Result<Vec<String>, AppError> {
    let flashes: Vec<String> = session.get(FLASHES_KEY)?.unwrap_or_default();
    if !flashes.is_empty() {
        session.remove(FLASHES_KEY);
    }
    Ok(flashes)
}

/// Same-site path to send the user to after logging in, if `target` is one.
///
/// The result is the parsed path and query, so stripped control characters
/// and other oddities never reach a `Location` header.
pub fn safe_next(target: &str) -> Option<String> {
    if !target.starts_with('/') || target.starts_with("//") || target.starts_with("/\\") {
        return None;
    }
    let base = Url::parse("http://localhost/").ok()?;
    let joined = base.join(target).ok()?;
    if joined.origin() != base.origin() {
        return None;
    }
    match joined.query() {
        Some(query) => Some(format!("{}?{}", joined.path(), query)),
        None => Some(joined.path().to_string()),
    }
}

pub fn login_url(next: Option<&str>) -> String {
    match next.and_then(safe_next) {
        Some(next) => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("next", &next)
                .finish();
            format!("{}?{}", LOGIN_VIEW, query)
        }
        None => LOGIN_VIEW.to_string(),
    }
}

async fn load_user(session: &Session, pool: &SqlitePool) -> Result<Option<User>, AppError> {
    let id = match session.get::<i64>(USER_ID_KEY)? {
        Some(id) => id,
        None => return Ok(None),
    };
    let user = user::find_by_id(pool, id).await?;
    if user.is_none() {
        debug!("Session refers to missing user {}", id);
        session.remove(USER_ID_KEY);
    }
    Ok(user)
}

fn pool_from(req: &HttpRequest) -> Result<web::Data<SqlitePool>, AppError> {
    req.app_data::<web::Data<SqlitePool>>()
        .cloned()
        .ok_or(AppError::MissingState("database pool"))
}

/// The logged-in user, or `None` for anonymous visitors.
pub struct CurrentUser(pub Option<User>);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let pool = pool_from(req);
        Box::pin(async move {
            let pool = pool?;
            load_user(&session, pool.get_ref()).await.map(CurrentUser)
        })
    }
}

/// Guard for pages that need a login: anonymous requests are sent to the
/// log-in page with the requested path as `next`.
pub struct LoginRequired(pub User);

impl FromRequest for LoginRequired {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let pool = pool_from(req);
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());
        Box::pin(async move {
            let pool = pool?;
            match load_user(&session, pool.get_ref()).await? {
                Some(user) => Ok(LoginRequired(user)),
                None => {
                    flash(&session, LOGIN_MESSAGE)?;
                    Err(AppError::LoginRequired { next })
                }
            }
        })
    }
}
