use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{middleware, web, App, HttpServer};
use log::{error, info};
use sqlx::SqlitePool;

mod config;
mod db;
mod error;
mod login;
mod pages;
mod password;
mod register;
mod session;
mod templates;
mod user;

#[cfg(test)]
mod test_support;

use config::Config;
use templates::Templates;

pub const SESSION_COOKIE: &str = "session";

/// Routes:
/// - `/`                          GET: landing page
/// - `/welcome`                   GET: button menu, POST: follow the pressed button
/// - `/log_in`, `/logged_in`      GET: form, POST: check credentials
/// - `/sign_up`, `/signed_up`     GET: form, POST: create account
/// - `/logout`                    GET: end the session (login required)
/// - `/volunteer`, `/charities`, `/aboutUs`, `/disasterRelief`: info pages
/// - `/static/*`                  stylesheet
pub fn app(
    pool: SqlitePool,
    config: &Config,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let sessions =
        SessionMiddleware::builder(CookieSessionStore::default(), config.session_key.clone())
            .cookie_name(SESSION_COOKIE.to_string())
            .cookie_secure(config.secure_cookies)
            .build();

    App::new()
        .app_data(web::Data::new(pool))
        .app_data(web::Data::new(Templates::new(config.template_dir.clone())))
        .wrap(sessions)
        .wrap(middleware::Logger::default())
        .service(actix_files::Files::new("/static", config.static_dir.clone()))
        .configure(pages::configure)
        .configure(login::configure)
        .configure(register::configure)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open {}: {}", config.database_url, e);
            std::process::exit(1);
        }
    };

    let (ip, port) = config.bind_addr();
    info!("Listening on {}:{}", ip, port);

    HttpServer::new(move || app(db_pool.clone(), &config))
        .bind((ip, port))?
        .run()
        .await
}
