use actix_session::Session;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::{flash, take_flashes, CurrentUser};
use crate::templates::{Page, Templates};

/// A fixed informational page.
#[derive(Clone, Copy)]
pub struct InfoPage {
    pub path: &'static str,
    pub template: &'static str,
    pub title: &'static str,
}

pub const INFO_PAGES: &[InfoPage] = &[
    InfoPage {
        path: "/volunteer",
        template: "volunteer.html",
        title: "Volunteer",
    },
    InfoPage {
        path: "/charities",
        template: "charities.html",
        title: "Charities",
    },
    InfoPage {
        path: "/aboutUs",
        template: "about_us.html",
        title: "About us",
    },
    InfoPage {
        path: "/disasterRelief",
        template: "disaster_relief.html",
        title: "Disaster relief",
    },
];

#[derive(Deserialize)]
pub struct WelcomeChoice {
    #[serde(default)]
    pub choice: Option<String>,
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Where each button on the welcome page leads.
pub fn destination(choice: &str) -> Option<&'static str> {
    match choice {
        "log_in" => Some("/log_in"),
        "sign_up" => Some("/sign_up"),
        "log_out" => Some("/logout"),
        "volunteer" => Some("/volunteer"),
        "charities" => Some("/charities"),
        "about_us" => Some("/aboutUs"),
        "disaster_relief" => Some("/disasterRelief"),
        _ => None,
    }
}

pub async fn index(
    templates: web::Data<Templates>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, AppError> {
    let flashes = take_flashes(&session)?;
    templates.respond(
        &Page::new("index.html", "Home")
            .user(user.as_ref())
            .flashes(flashes),
    )
}

pub async fn welcome(
    templates: web::Data<Templates>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, AppError> {
    let flashes = take_flashes(&session)?;
    templates.respond(
        &Page::new("welcome.html", "Welcome")
            .user(user.as_ref())
            .flashes(flashes),
    )
}

pub async fn choose(
    session: Session,
    form: web::Form<WelcomeChoice>,
) -> Result<HttpResponse, AppError> {
    match form.choice.as_deref().and_then(destination) {
        Some(location) => Ok(redirect(location)),
        None => {
            flash(&session, "Please choose one of the options.")?;
            Ok(redirect("/welcome"))
        }
    }
}

pub async fn info_page(
    page: web::Data<InfoPage>,
    templates: web::Data<Templates>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, AppError> {
    let flashes = take_flashes(&session)?;
    templates.respond(
        &Page::new(page.template, page.title)
            .user(user.as_ref())
            .flashes(flashes),
    )
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index)).service(
        web::resource("/welcome")
            .route(web::get().to(welcome))
            .route(web::post().to(choose)),
    );
    for page in INFO_PAGES {
        cfg.service(
            web::resource(page.path)
                .app_data(web::Data::new(*page))
                .route(web::get().to(info_page)),
        );
    }
}
