use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::pages::redirect;
use crate::password::hash_password;
use crate::session::{flash, login_user, take_flashes, CurrentUser};
use crate::templates::{Page, Templates};
use crate::user;

#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn sign_up(
    templates: web::Data<Templates>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, AppError> {
    let flashes = take_flashes(&session)?;
    templates.respond(
        &Page::new("sign_up.html", "Sign up")
            .user(user.as_ref())
            .flashes(flashes),
    )
}

pub async fn signed_up(
    db_pool: web::Data<SqlitePool>,
    session: Session,
    form: web::Form<SignUpForm>,
) -> Result<HttpResponse, AppError> {
    if let Err(problem) = user::validate_signup(&form.username, &form.password) {
        flash(&session, problem.to_string())?;
        return Ok(redirect("/sign_up"));
    }

    let taken = format!("The username {} is already taken.", form.username);
    if user::find_by_username(db_pool.get_ref(), &form.username)
        .await?
        .is_some()
    {
        flash(&session, taken)?;
        return Ok(redirect("/sign_up"));
    }

    let password_hash = hash_password(&form.password)?;
    let user = match user::create(db_pool.get_ref(), &form.username, &password_hash).await? {
        Some(user) => user,
        None => {
            flash(&session, taken)?;
            return Ok(redirect("/sign_up"));
        }
    };

    info!("New user {} (id {})", user.username, user.id);
    login_user(&session, &user)?;
    flash(&session, format!("Account created. Welcome, {}!", user.username))?;
    Ok(redirect("/welcome"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/sign_up", web::get().to(sign_up))
        .route("/signed_up", web::post().to(signed_up));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::password::verify_password;
    use crate::test_support::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    async fn user_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn sign_up_form_renders() {
        let app = test::init_service(test_app(memory_pool().await)).await;
        let resp = test::call_service(&app, get("/sign_up", None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(page_title(&body).starts_with("Sign up"));
    }

    #[actix_web::test]
    async fn sign_up_creates_hashed_user_and_logs_in() {
        let pool = memory_pool().await;
        let app = test::init_service(test_app(pool.clone())).await;
        let req = form_post(
            "/signed_up",
            &[("username", "alice"), ("password", "wonderland")],
            None,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location_of(&resp), "/welcome");
        let cookie = session_cookie(&resp).unwrap();

        let stored = user::find_by_username(&pool, "alice")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "wonderland");
        assert!(verify_password("wonderland", &stored.password_hash));

        let resp = test::call_service(&app, get("/welcome", Some(&cookie)).to_request()).await;
        let body = test::read_body(resp).await;
        assert_eq!(signed_in_as(&body).as_deref(), Some("alice"));
        assert_eq!(flashes(&body), vec!["Account created. Welcome, alice!"]);
    }

    #[actix_web::test]
    async fn duplicate_username_is_refused() {
        let pool = memory_pool().await;
        let app = test::init_service(test_app(pool.clone())).await;
        let first = form_post(
            "/signed_up",
            &[("username", "alice"), ("password", "wonderland")],
            None,
        )
        .to_request();
        test::call_service(&app, first).await;

        let second = form_post(
            "/signed_up",
            &[("username", "alice"), ("password", "something-else")],
            None,
        )
        .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(location_of(&resp), "/sign_up");
        let cookie = session_cookie(&resp).unwrap();

        assert_eq!(user_count(&pool).await, 1);
        let stored = user::find_by_username(&pool, "alice")
            .await
            .unwrap()
            .unwrap();
        assert!(verify_password("wonderland", &stored.password_hash));

        let resp = test::call_service(&app, get("/sign_up", Some(&cookie)).to_request()).await;
        let body = test::read_body(resp).await;
        assert_eq!(flashes(&body), vec!["The username alice is already taken."]);
    }

    #[actix_web::test]
    async fn invalid_input_never_reaches_storage() {
        let pool = memory_pool().await;
        let app = test::init_service(test_app(pool.clone())).await;
        let long_name = "a".repeat(21);
        let long_password = "p".repeat(65);
        let cases: [(&str, &str, &str); 4] = [
            (long_name.as_str(), "wonderland", "Usernames can be at most 20 characters long."),
            ("alice", long_password.as_str(), "Passwords can be at most 64 characters long."),
            ("al ice", "wonderland", "Usernames may only contain letters, digits, '-' and '_'."),
            ("", "wonderland", "Please enter both a username and a password."),
        ];
        for (username, password, message) in cases {
            let req = form_post(
                "/signed_up",
                &[("username", username), ("password", password)],
                None,
            )
            .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(location_of(&resp), "/sign_up");
            let cookie = session_cookie(&resp).unwrap();

            let resp = test::call_service(&app, get("/sign_up", Some(&cookie)).to_request()).await;
            let body = test::read_body(resp).await;
            assert_eq!(flashes(&body), vec![message]);
        }
        assert_eq!(user_count(&pool).await, 0);
    }

    #[actix_web::test]
    async fn new_account_can_log_in_again() {
        let app = test::init_service(test_app(memory_pool().await)).await;
        let req = form_post(
            "/signed_up",
            &[("username", "bob-2"), ("password", "builder")],
            None,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        let cookie = session_cookie(&resp).unwrap();
        let resp = test::call_service(&app, get("/logout", Some(&cookie)).to_request()).await;
        assert_eq!(location_of(&resp), "/");

        let req = form_post(
            "/logged_in",
            &[("username", "bob-2"), ("password", "builder")],
            None,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location_of(&resp), "/welcome");
    }
}
