use actix_session::{SessionGetError, SessionInsertError};
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::session;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("could not read template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read session state: {0}")]
    SessionGet(#[from] SessionGetError),

    #[error("could not write session state: {0}")]
    SessionInsert(#[from] SessionInsertError),

    #[error("{0} is not registered as application data")]
    MissingState(&'static str),

    /// An anonymous request hit a page behind the login guard.
    #[error("login required for {next}")]
    LoginRequired { next: String },
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::LoginRequired { next } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, session::login_url(Some(next.as_str()))))
                .finish(),
            _ => {
                error!("{}", self);
                HttpResponse::InternalServerError().body("Internal server error")
            }
        }
    }
}
