use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::pages::redirect;
use crate::password::verify_password;
use crate::session::{
    flash, login_url, login_user, logout_user, safe_next, take_flashes, CurrentUser,
    LoginRequired,
};
use crate::templates::{Page, Templates};
use crate::user;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn log_in(
    templates: web::Data<Templates>,
    session: Session,
    CurrentUser(user): CurrentUser,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    if user.is_some() {
        return Ok(redirect("/welcome"));
    }
    let flashes = take_flashes(&session)?;
    let next = query.next.as_deref().and_then(safe_next);
    templates.respond(
        &Page::new("log_in.html", "Log in")
            .flashes(flashes)
            .next(next.as_deref()),
    )
}

pub async fn logged_in(
    db_pool: web::Data<SqlitePool>,
    session: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let next = form.next.as_deref().and_then(safe_next);

    if let Err(problem) = user::validate_login(&form.username, &form.password) {
        flash(&session, problem.to_string())?;
        return Ok(redirect(&login_url(next.as_deref())));
    }

    let user = match user::find_by_username(db_pool.get_ref(), &form.username).await? {
        Some(user) => user,
        None => {
            info!("Login attempt for unknown user {:?}", form.username);
            flash(
                &session,
                format!("No account named {}. Sign up first.", form.username),
            )?;
            return Ok(redirect("/sign_up"));
        }
    };

    if !verify_password(&form.password, &user.password_hash) {
        info!("Wrong password for {}", user.username);
        flash(&session, "Incorrect password.")?;
        return Ok(redirect(&login_url(next.as_deref())));
    }

    login_user(&session, &user)?;
    info!("{} logged in", user.username);
    flash(&session, format!("Welcome back, {}!", user.username))?;
    Ok(redirect(next.as_deref().unwrap_or("/welcome")))
}

pub async fn logout(
    session: Session,
    LoginRequired(user): LoginRequired,
) -> Result<HttpResponse, AppError> {
    logout_user(&session);
    info!("{} logged out", user.username);
    flash(&session, "You have been logged out.")?;
    Ok(redirect("/"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/log_in", web::get().to(log_in))
        .route("/logged_in", web::post().to(logged_in))
        .route("/logout", web::get().to(logout));
}
